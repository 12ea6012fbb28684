use crate::db::entities::creator_channels::{self, DEFAULT_NAME_TEMPLATE};
use crate::db::entities::platform_roles::Platform;
use crate::db::entities::temp_channels;
use crate::db::to_db_id;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set,
};

pub type Room = temp_channels::Model;
pub type CreatorChannel = creator_channels::Model;

#[derive(Debug, Clone)]
pub struct NewRoom {
    pub channel_id: serenity::ChannelId,
    pub guild_id: serenity::GuildId,
    pub owner_id: serenity::UserId,
    pub creator_channel_id: Option<serenity::ChannelId>,
    pub platform: Option<Platform>,
    pub build: Option<String>,
    pub user_limit: u32,
}

/// Mutable attributes of a tracked room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomUpdate {
    Owner(serenity::UserId),
    Limit(u32),
    Platform(Platform),
    Build(Option<String>),
}

/// Creator channel configuration and the records of spawned rooms.
pub struct RoomRegistry {
    db: DatabaseConnection,
}

impl RoomRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn creator(
        &self,
        channel_id: serenity::ChannelId,
    ) -> Result<Option<CreatorChannel>, DbErr> {
        creator_channels::Entity::find_by_id(to_db_id(channel_id.get()))
            .one(&self.db)
            .await
    }

    pub async fn creators_in_guild(
        &self,
        guild_id: serenity::GuildId,
    ) -> Result<Vec<CreatorChannel>, DbErr> {
        creator_channels::Entity::find()
            .filter(creator_channels::Column::GuildId.eq(to_db_id(guild_id.get())))
            .all(&self.db)
            .await
    }

    pub async fn upsert_creator(
        &self,
        channel_id: serenity::ChannelId,
        guild_id: serenity::GuildId,
        template: Option<String>,
        default_limit: u32,
    ) -> Result<CreatorChannel, DbErr> {
        let template = template
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_NAME_TEMPLATE.to_string());

        let model = creator_channels::ActiveModel {
            id: Set(to_db_id(channel_id.get())),
            guild_id: Set(to_db_id(guild_id.get())),
            name_template: Set(template),
            default_limit: Set(default_limit as i32),
            welcome_message: Set(None),
        };

        creator_channels::Entity::insert(model)
            .on_conflict(
                OnConflict::column(creator_channels::Column::Id)
                    .update_columns([
                        creator_channels::Column::NameTemplate,
                        creator_channels::Column::DefaultLimit,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        self.creator(channel_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("creator channel {channel_id}")))
    }

    /// Returns false when the channel is not a creator channel.
    pub async fn set_welcome_message(
        &self,
        channel_id: serenity::ChannelId,
        message: Option<String>,
    ) -> Result<bool, DbErr> {
        let Some(creator) = self.creator(channel_id).await? else {
            return Ok(false);
        };

        let mut active = creator.into_active_model();
        active.welcome_message = Set(message.filter(|m| !m.trim().is_empty()));
        active.update(&self.db).await?;
        Ok(true)
    }

    pub async fn remove_creator(&self, channel_id: serenity::ChannelId) -> Result<bool, DbErr> {
        let res = creator_channels::Entity::delete_by_id(to_db_id(channel_id.get()))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn room(&self, channel_id: serenity::ChannelId) -> Result<Option<Room>, DbErr> {
        temp_channels::Entity::find_by_id(to_db_id(channel_id.get()))
            .one(&self.db)
            .await
    }

    pub async fn rooms_in_guild(&self, guild_id: serenity::GuildId) -> Result<Vec<Room>, DbErr> {
        temp_channels::Entity::find()
            .filter(temp_channels::Column::GuildId.eq(to_db_id(guild_id.get())))
            .all(&self.db)
            .await
    }

    pub async fn rooms_owned_by(
        &self,
        guild_id: serenity::GuildId,
        owner_id: serenity::UserId,
    ) -> Result<Vec<Room>, DbErr> {
        temp_channels::Entity::find()
            .filter(temp_channels::Column::GuildId.eq(to_db_id(guild_id.get())))
            .filter(temp_channels::Column::OwnerId.eq(to_db_id(owner_id.get())))
            .all(&self.db)
            .await
    }

    pub async fn insert_room(&self, room: NewRoom) -> Result<Room, DbErr> {
        let model = temp_channels::ActiveModel {
            id: Set(to_db_id(room.channel_id.get())),
            guild_id: Set(to_db_id(room.guild_id.get())),
            owner_id: Set(to_db_id(room.owner_id.get())),
            creator_channel_id: Set(room.creator_channel_id.map(|id| to_db_id(id.get()))),
            created_at: Set(Utc::now().into()),
            platform: Set(room.platform),
            build: Set(room.build),
            user_limit: Set(room.user_limit as i32),
        };

        temp_channels::Entity::insert(model)
            .on_conflict(
                OnConflict::column(temp_channels::Column::Id)
                    .update_columns([
                        temp_channels::Column::OwnerId,
                        temp_channels::Column::CreatorChannelId,
                        temp_channels::Column::Platform,
                        temp_channels::Column::Build,
                        temp_channels::Column::UserLimit,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        self.room(room.channel_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("room {}", room.channel_id)))
    }

    /// Returns the updated record, or None if the room is not tracked.
    pub async fn update_room(
        &self,
        channel_id: serenity::ChannelId,
        update: RoomUpdate,
    ) -> Result<Option<Room>, DbErr> {
        let Some(room) = self.room(channel_id).await? else {
            return Ok(None);
        };

        let mut active = room.into_active_model();
        match update {
            RoomUpdate::Owner(owner_id) => active.owner_id = Set(to_db_id(owner_id.get())),
            RoomUpdate::Limit(limit) => active.user_limit = Set(limit as i32),
            RoomUpdate::Platform(platform) => active.platform = Set(Some(platform)),
            RoomUpdate::Build(build) => active.build = Set(build),
        }

        Ok(Some(active.update(&self.db).await?))
    }

    pub async fn delete_room(&self, channel_id: serenity::ChannelId) -> Result<bool, DbErr> {
        let res = temp_channels::Entity::delete_by_id(to_db_id(channel_id.get()))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;

    fn new_room(channel: u64, owner: u64) -> NewRoom {
        NewRoom {
            channel_id: serenity::ChannelId::new(channel),
            guild_id: serenity::GuildId::new(1398084425169895434),
            owner_id: serenity::UserId::new(owner),
            creator_channel_id: Some(serenity::ChannelId::new(10)),
            platform: None,
            build: None,
            user_limit: 0,
        }
    }

    #[tokio::test]
    async fn creator_upsert_keeps_a_single_row() {
        let registry = RoomRegistry::new(test_connection().await);
        let channel = serenity::ChannelId::new(10);
        let guild = serenity::GuildId::new(1);

        let first = registry.upsert_creator(channel, guild, None, 0).await.unwrap();
        assert_eq!(first.name_template, DEFAULT_NAME_TEMPLATE);

        assert!(
            registry
                .set_welcome_message(channel, Some("Hi {OWNER_MENTION}".into()))
                .await
                .unwrap()
        );
        let second = registry
            .upsert_creator(channel, guild, Some("{USER} plays".into()), 5)
            .await
            .unwrap();
        assert_eq!(second.name_template, "{USER} plays");
        assert_eq!(second.limit(), 5);
        assert_eq!(second.welcome_message.as_deref(), Some("Hi {OWNER_MENTION}"));
        assert_eq!(registry.creators_in_guild(guild).await.unwrap().len(), 1);

        assert!(registry.remove_creator(channel).await.unwrap());
        assert!(!registry.remove_creator(channel).await.unwrap());
        assert!(
            !registry
                .set_welcome_message(channel, None)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn room_records_track_owner_and_attributes() {
        let registry = RoomRegistry::new(test_connection().await);
        let room = registry
            .insert_room(new_room(1448575022439596062, 7))
            .await
            .unwrap();
        assert_eq!(room.channel_id().get(), 1448575022439596062);
        assert_eq!(room.owner().get(), 7);

        let updated = registry
            .update_room(room.channel_id(), RoomUpdate::Owner(serenity::UserId::new(8)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.owner().get(), 8);

        registry
            .update_room(room.channel_id(), RoomUpdate::Limit(4))
            .await
            .unwrap();
        let owned = registry
            .rooms_owned_by(room.guild(), serenity::UserId::new(8))
            .await
            .unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].limit(), 4);

        assert!(registry.delete_room(room.channel_id()).await.unwrap());
        assert!(registry.room(room.channel_id()).await.unwrap().is_none());
        assert!(
            registry
                .update_room(room.channel_id(), RoomUpdate::Limit(1))
                .await
                .unwrap()
                .is_none()
        );
    }
}
