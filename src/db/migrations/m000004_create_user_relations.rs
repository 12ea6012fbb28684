use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserTrusts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserTrusts::OwnerId).big_integer().not_null())
                    .col(ColumnDef::new(UserTrusts::GuildId).big_integer().not_null())
                    .col(
                        ColumnDef::new(UserTrusts::TrustedId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserTrusts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserTrusts::OwnerId)
                            .col(UserTrusts::GuildId)
                            .col(UserTrusts::TrustedId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserBlocks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserBlocks::OwnerId).big_integer().not_null())
                    .col(ColumnDef::new(UserBlocks::GuildId).big_integer().not_null())
                    .col(
                        ColumnDef::new(UserBlocks::BlockedId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserBlocks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserBlocks::OwnerId)
                            .col(UserBlocks::GuildId)
                            .col(UserBlocks::BlockedId),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserBlocks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserTrusts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserTrusts {
    Table,
    OwnerId,
    GuildId,
    TrustedId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserBlocks {
    Table,
    OwnerId,
    GuildId,
    BlockedId,
    CreatedAt,
}
