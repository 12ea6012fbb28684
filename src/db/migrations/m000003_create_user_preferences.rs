use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserPreferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserPreferences::OwnerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserPreferences::GuildId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserPreferences::ChatRestriction)
                            .string_len(32)
                            .not_null()
                            .default("always"),
                    )
                    .col(
                        ColumnDef::new(UserPreferences::SoundboardRestriction)
                            .string_len(32)
                            .not_null()
                            .default("anyone"),
                    )
                    .col(
                        ColumnDef::new(UserPreferences::CommandAccess)
                            .string_len(32)
                            .not_null()
                            .default("anyone"),
                    )
                    .col(ColumnDef::new(UserPreferences::LastLimit).integer().null())
                    .col(
                        ColumnDef::new(UserPreferences::LastPlatform)
                            .string_len(32)
                            .null(),
                    )
                    .col(ColumnDef::new(UserPreferences::LastBuild).string().null())
                    .primary_key(
                        Index::create()
                            .col(UserPreferences::OwnerId)
                            .col(UserPreferences::GuildId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserPreferences::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserPreferences {
    Table,
    OwnerId,
    GuildId,
    ChatRestriction,
    SoundboardRestriction,
    CommandAccess,
    LastLimit,
    LastPlatform,
    LastBuild,
}
