pub mod m000001_create_creator_channels;
pub mod m000002_create_temp_channels;
pub mod m000003_create_user_preferences;
pub mod m000004_create_user_relations;
pub mod m000005_create_guild_roles;
pub mod m000006_create_user_rules;

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m000001_create_creator_channels::Migration),
            Box::new(m000002_create_temp_channels::Migration),
            Box::new(m000003_create_user_preferences::Migration),
            Box::new(m000004_create_user_relations::Migration),
            Box::new(m000005_create_guild_roles::Migration),
            Box::new(m000006_create_user_rules::Migration),
        ]
    }
}
