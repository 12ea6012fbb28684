use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserRules::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserRules::OwnerId).big_integer().not_null())
                    .col(ColumnDef::new(UserRules::GuildId).big_integer().not_null())
                    .col(
                        ColumnDef::new(UserRules::CreatorChannelId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserRules::Rules).text().not_null())
                    .primary_key(
                        Index::create()
                            .col(UserRules::OwnerId)
                            .col(UserRules::GuildId)
                            .col(UserRules::CreatorChannelId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserRules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserRules {
    Table,
    OwnerId,
    GuildId,
    CreatorChannelId,
    Rules,
}
