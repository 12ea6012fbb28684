use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StaffRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StaffRoles::GuildId).big_integer().not_null())
                    .col(ColumnDef::new(StaffRoles::RoleId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(StaffRoles::GuildId)
                            .col(StaffRoles::RoleId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlatformRoles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlatformRoles::RoleId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PlatformRoles::GuildId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlatformRoles::Platform)
                            .string_len(32)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-platform-roles-guild")
                    .table(PlatformRoles::Table)
                    .col(PlatformRoles::GuildId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlatformRoles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StaffRoles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StaffRoles {
    Table,
    GuildId,
    RoleId,
}

#[derive(DeriveIden)]
enum PlatformRoles {
    Table,
    RoleId,
    GuildId,
    Platform,
}
