use super::platform_roles::Platform;
use crate::db::from_db_id;
use poise::serenity_prelude as serenity;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "temp_channels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub guild_id: i64,
    pub owner_id: i64,
    /// Null when the spawning creator channel was removed or is unknown.
    pub creator_channel_id: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
    pub platform: Option<Platform>,
    pub build: Option<String>,
    pub user_limit: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn channel_id(&self) -> serenity::ChannelId {
        serenity::ChannelId::new(from_db_id(self.id))
    }

    pub fn guild(&self) -> serenity::GuildId {
        serenity::GuildId::new(from_db_id(self.guild_id))
    }

    pub fn owner(&self) -> serenity::UserId {
        serenity::UserId::new(from_db_id(self.owner_id))
    }

    pub fn creator_channel(&self) -> Option<serenity::ChannelId> {
        self.creator_channel_id
            .map(|id| serenity::ChannelId::new(from_db_id(id)))
    }

    /// 0 means unlimited.
    pub fn limit(&self) -> u32 {
        self.user_limit.max(0) as u32
    }
}
