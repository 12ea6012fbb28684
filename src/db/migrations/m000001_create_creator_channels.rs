use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CreatorChannels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreatorChannels::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CreatorChannels::GuildId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreatorChannels::NameTemplate)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreatorChannels::DefaultLimit)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CreatorChannels::WelcomeMessage).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-creator-channels-guild")
                    .table(CreatorChannels::Table)
                    .col(CreatorChannels::GuildId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CreatorChannels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CreatorChannels {
    Table,
    Id,
    GuildId,
    NameTemplate,
    DefaultLimit,
    WelcomeMessage,
}
