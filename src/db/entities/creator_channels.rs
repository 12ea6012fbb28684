use crate::db::from_db_id;
use poise::serenity_prelude as serenity;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME_TEMPLATE: &str = "{USER}'s Channel";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "creator_channels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub guild_id: i64,
    pub name_template: String,
    /// 0 means unlimited.
    pub default_limit: i32,
    pub welcome_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn channel_id(&self) -> serenity::ChannelId {
        serenity::ChannelId::new(from_db_id(self.id))
    }

    pub fn limit(&self) -> u32 {
        self.default_limit.max(0) as u32
    }
}
