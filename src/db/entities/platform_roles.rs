use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    poise::ChoiceParameter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Platform {
    #[name = "Steam"]
    #[sea_orm(string_value = "steam")]
    Steam,
    #[name = "Epic Games"]
    #[sea_orm(string_value = "epic")]
    Epic,
    #[name = "Windows Store"]
    #[sea_orm(string_value = "windows")]
    Windows,
    #[name = "Xbox"]
    #[sea_orm(string_value = "xbox")]
    Xbox,
    #[name = "PlayStation 4"]
    #[sea_orm(string_value = "ps4")]
    Ps4,
    #[name = "PlayStation 5"]
    #[sea_orm(string_value = "ps5")]
    Ps5,
    #[name = "Nintendo Switch"]
    #[sea_orm(string_value = "switch")]
    Switch,
}

impl Platform {
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Steam => "Steam",
            Platform::Epic => "Epic Games",
            Platform::Windows => "Windows Store",
            Platform::Xbox => "Xbox",
            Platform::Ps4 => "PlayStation 4",
            Platform::Ps5 => "PlayStation 5",
            Platform::Switch => "Nintendo Switch",
        }
    }

    /// Tag used inside room names.
    pub fn short(&self) -> &'static str {
        match self {
            Platform::Steam => "Steam",
            Platform::Epic => "Epic",
            Platform::Windows => "Win",
            Platform::Xbox => "Xbox",
            Platform::Ps4 => "PS4",
            Platform::Ps5 => "PS5",
            Platform::Switch => "Switch",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "platform_roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub role_id: i64,
    pub guild_id: i64,
    pub platform: Platform,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
