use super::platform_roles::Platform;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    poise::ChoiceParameter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ChatRestriction {
    #[default]
    #[name = "Always allowed"]
    #[sea_orm(string_value = "always")]
    Always,
    #[name = "Only when spots are open"]
    #[sea_orm(string_value = "open_spots")]
    OpenSpots,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    poise::ChoiceParameter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum SoundboardRestriction {
    #[default]
    #[name = "Anyone"]
    #[sea_orm(string_value = "anyone")]
    Anyone,
    #[name = "Only me"]
    #[sea_orm(string_value = "owner")]
    Owner,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    poise::ChoiceParameter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum CommandAccess {
    #[default]
    #[name = "Anyone"]
    #[sea_orm(string_value = "anyone")]
    Anyone,
    #[name = "Trusted users"]
    #[sea_orm(string_value = "trusted")]
    Trusted,
    #[name = "Only me"]
    #[sea_orm(string_value = "owner")]
    Owner,
}

/// One row per (owner, guild).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "user_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: i64,
    pub chat_restriction: ChatRestriction,
    pub soundboard_restriction: SoundboardRestriction,
    pub command_access: CommandAccess,
    pub last_limit: Option<i32>,
    pub last_platform: Option<Platform>,
    pub last_build: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
