use crate::db::entities::platform_roles::Platform;
use crate::db::entities::user_preferences::{
    self, ChatRestriction, CommandAccess, SoundboardRestriction,
};
use crate::db::entities::user_rules;
use crate::db::to_db_id;
use crate::services::permissions::OwnerPolicy;
use poise::serenity_prelude as serenity;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

/// A single-column change to an owner's preference row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceUpdate {
    Chat(ChatRestriction),
    Soundboard(SoundboardRestriction),
    CommandAccess(CommandAccess),
    LastLimit(u32),
    LastPlatform(Platform),
    LastBuild(Option<String>),
}

pub struct PreferenceService {
    db: DatabaseConnection,
}

impl PreferenceService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(
        &self,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
    ) -> Result<Option<user_preferences::Model>, DbErr> {
        user_preferences::Entity::find_by_id((to_db_id(owner_id.get()), to_db_id(guild_id.get())))
            .one(&self.db)
            .await
    }

    pub async fn policy(
        &self,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
    ) -> Result<OwnerPolicy, DbErr> {
        Ok(self
            .get(owner_id, guild_id)
            .await?
            .map(|p| OwnerPolicy {
                chat: p.chat_restriction,
                soundboard: p.soundboard_restriction,
            })
            .unwrap_or_default())
    }

    pub async fn command_access(
        &self,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
    ) -> Result<CommandAccess, DbErr> {
        Ok(self
            .get(owner_id, guild_id)
            .await?
            .map(|p| p.command_access)
            .unwrap_or_default())
    }

    /// Upserts one column, keyed by (owner, guild). Other columns of an
    /// existing row are untouched.
    pub async fn update(
        &self,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
        update: PreferenceUpdate,
    ) -> Result<(), DbErr> {
        let mut model = user_preferences::ActiveModel {
            owner_id: Set(to_db_id(owner_id.get())),
            guild_id: Set(to_db_id(guild_id.get())),
            chat_restriction: Set(ChatRestriction::default()),
            soundboard_restriction: Set(SoundboardRestriction::default()),
            command_access: Set(CommandAccess::default()),
            last_limit: Set(None),
            last_platform: Set(None),
            last_build: Set(None),
        };

        let column = match update {
            PreferenceUpdate::Chat(v) => {
                model.chat_restriction = Set(v);
                user_preferences::Column::ChatRestriction
            }
            PreferenceUpdate::Soundboard(v) => {
                model.soundboard_restriction = Set(v);
                user_preferences::Column::SoundboardRestriction
            }
            PreferenceUpdate::CommandAccess(v) => {
                model.command_access = Set(v);
                user_preferences::Column::CommandAccess
            }
            PreferenceUpdate::LastLimit(v) => {
                model.last_limit = Set(Some(v as i32));
                user_preferences::Column::LastLimit
            }
            PreferenceUpdate::LastPlatform(v) => {
                model.last_platform = Set(Some(v));
                user_preferences::Column::LastPlatform
            }
            PreferenceUpdate::LastBuild(v) => {
                model.last_build = Set(v);
                user_preferences::Column::LastBuild
            }
        };

        user_preferences::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    user_preferences::Column::OwnerId,
                    user_preferences::Column::GuildId,
                ])
                .update_column(column)
                .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    pub async fn rules(
        &self,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
        creator_channel_id: serenity::ChannelId,
    ) -> Result<Option<String>, DbErr> {
        Ok(user_rules::Entity::find_by_id((
            to_db_id(owner_id.get()),
            to_db_id(guild_id.get()),
            to_db_id(creator_channel_id.get()),
        ))
        .one(&self.db)
        .await?
        .map(|r| r.rules))
    }

    /// Empty or missing text clears the rules.
    pub async fn set_rules(
        &self,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
        creator_channel_id: serenity::ChannelId,
        rules: Option<&str>,
    ) -> Result<(), DbErr> {
        let owner = to_db_id(owner_id.get());
        let guild = to_db_id(guild_id.get());
        let creator = to_db_id(creator_channel_id.get());

        match rules.map(str::trim).filter(|r| !r.is_empty()) {
            Some(text) => {
                user_rules::Entity::insert(user_rules::ActiveModel {
                    owner_id: Set(owner),
                    guild_id: Set(guild),
                    creator_channel_id: Set(creator),
                    rules: Set(text.to_string()),
                })
                .on_conflict(
                    OnConflict::columns([
                        user_rules::Column::OwnerId,
                        user_rules::Column::GuildId,
                        user_rules::Column::CreatorChannelId,
                    ])
                    .update_column(user_rules::Column::Rules)
                    .to_owned(),
                )
                .exec(&self.db)
                .await?;
            }
            None => {
                user_rules::Entity::delete_many()
                    .filter(user_rules::Column::OwnerId.eq(owner))
                    .filter(user_rules::Column::GuildId.eq(guild))
                    .filter(user_rules::Column::CreatorChannelId.eq(creator))
                    .exec(&self.db)
                    .await?;
            }
        }

        Ok(())
    }
}
