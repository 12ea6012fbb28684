use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TempChannels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TempChannels::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TempChannels::GuildId).big_integer().not_null())
                    .col(ColumnDef::new(TempChannels::OwnerId).big_integer().not_null())
                    .col(
                        ColumnDef::new(TempChannels::CreatorChannelId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TempChannels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TempChannels::Platform).string_len(32).null())
                    .col(ColumnDef::new(TempChannels::Build).string().null())
                    .col(
                        ColumnDef::new(TempChannels::UserLimit)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // Owned-room lookups after settings changes
        manager
            .create_index(
                Index::create()
                    .name("idx-temp-channels-guild-owner")
                    .table(TempChannels::Table)
                    .col(TempChannels::GuildId)
                    .col(TempChannels::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TempChannels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TempChannels {
    Table,
    Id,
    GuildId,
    OwnerId,
    CreatorChannelId,
    CreatedAt,
    Platform,
    Build,
    UserLimit,
}
