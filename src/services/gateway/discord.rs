use super::{ProviderError, RoomEdit, RoomSpec, VoiceGateway, with_retry};
use crate::services::permissions::{MemberRoles, OverwriteSet};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use serde_json::json;
use std::sync::Arc;

/// Voice type in the channel create payload.
const GUILD_VOICE: u8 = 2;

pub struct DiscordGateway {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl DiscordGateway {
    pub fn from_context(ctx: &serenity::Context) -> Self {
        Self {
            http: ctx.http.clone(),
            cache: ctx.cache.clone(),
        }
    }
}

#[async_trait]
impl VoiceGateway for DiscordGateway {
    fn can_manage_channels(&self, guild_id: serenity::GuildId) -> bool {
        let bot_id = self.cache.current_user().id;
        let Some(guild) = self.cache.guild(guild_id) else {
            return false;
        };
        if guild.owner_id == bot_id {
            return true;
        }
        let Some(member) = guild.members.get(&bot_id) else {
            return false;
        };

        let everyone = serenity::RoleId::new(guild_id.get());
        let permissions = std::iter::once(&everyone)
            .chain(member.roles.iter())
            .filter_map(|r| guild.roles.get(r))
            .fold(serenity::Permissions::empty(), |acc, role| {
                acc | role.permissions
            });

        permissions
            .intersects(serenity::Permissions::ADMINISTRATOR | serenity::Permissions::MANAGE_CHANNELS)
    }

    fn live_members(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Vec<MemberRoles> {
        let Some(guild) = self.cache.guild(guild_id) else {
            return vec![];
        };

        guild
            .voice_states
            .iter()
            .filter(|vs| vs.channel_id == Some(channel_id))
            .map(|vs| {
                let role_ids = guild
                    .members
                    .get(&vs.user_id)
                    .or(vs.member.as_ref())
                    .map(|m| m.roles.iter().copied().collect())
                    .unwrap_or_default();
                MemberRoles {
                    user_id: vs.user_id,
                    role_ids,
                }
            })
            .collect()
    }

    fn member_roles(
        &self,
        guild_id: serenity::GuildId,
        user_id: serenity::UserId,
    ) -> Vec<serenity::RoleId> {
        self.cache
            .guild(guild_id)
            .and_then(|g| {
                g.members
                    .get(&user_id)
                    .map(|m| m.roles.iter().copied().collect())
            })
            .unwrap_or_default()
    }

    fn parent_of(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Option<serenity::ChannelId> {
        self.cache
            .guild(guild_id)?
            .channels
            .get(&channel_id)?
            .parent_id
    }

    fn category_baseline(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> OverwriteSet {
        let Some(guild) = self.cache.guild(guild_id) else {
            return OverwriteSet::new();
        };

        guild
            .channels
            .get(&channel_id)
            .and_then(|c| c.parent_id)
            .and_then(|parent| guild.channels.get(&parent))
            .map(|category| OverwriteSet::from_overwrites(category.permission_overwrites.iter()))
            .unwrap_or_default()
    }

    fn voice_channel_of(
        &self,
        guild_id: serenity::GuildId,
        user_id: serenity::UserId,
    ) -> Option<serenity::ChannelId> {
        self.cache
            .guild(guild_id)?
            .voice_states
            .get(&user_id)?
            .channel_id
    }

    fn display_name(
        &self,
        guild_id: serenity::GuildId,
        user_id: serenity::UserId,
    ) -> Option<String> {
        let guild = self.cache.guild(guild_id)?;
        let member = guild.members.get(&user_id)?;
        Some(member.display_name().to_string())
    }

    fn guild_locale(&self, guild_id: serenity::GuildId) -> Option<String> {
        self.cache
            .guild(guild_id)
            .map(|g| g.preferred_locale.to_string())
    }

    fn user_limit(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Option<u32> {
        let guild = self.cache.guild(guild_id)?;
        let channel = guild.channels.get(&channel_id)?;
        Some(channel.user_limit.map_or(0, |limit| u32::from(limit.get())))
    }

    async fn create_voice_room(
        &self,
        spec: &RoomSpec,
    ) -> Result<serenity::ChannelId, ProviderError> {
        let mut map = serde_json::Map::new();
        map.insert("name".to_string(), json!(spec.name));
        map.insert("type".to_string(), json!(GUILD_VOICE));
        map.insert("user_limit".to_string(), json!(spec.user_limit));
        if let Some(parent) = spec.parent_id {
            map.insert("parent_id".to_string(), json!(parent.to_string()));
        }

        let channel = with_retry("create voice room", || async {
            self.http
                .create_channel(spec.guild_id, &map, None)
                .await
                .map_err(ProviderError::from)
        })
        .await?;

        Ok(channel.id)
    }

    async fn delete_voice_room(
        &self,
        channel_id: serenity::ChannelId,
    ) -> Result<(), ProviderError> {
        with_retry("delete voice room", || async {
            self.http
                .delete_channel(serenity::GenericChannelId::new(channel_id.get()), None)
                .await
                .map(drop)
                .map_err(ProviderError::from)
        })
        .await
    }

    async fn set_member_voice_room(
        &self,
        guild_id: serenity::GuildId,
        user_id: serenity::UserId,
        channel_id: serenity::ChannelId,
    ) -> Result<(), ProviderError> {
        let map = json!({ "channel_id": channel_id.to_string() });
        with_retry("move member", || async {
            self.http
                .edit_member(guild_id, user_id, &map, None)
                .await
                .map(drop)
                .map_err(ProviderError::from)
        })
        .await
    }

    async fn apply_overwrites(
        &self,
        channel_id: serenity::ChannelId,
        overwrites: &OverwriteSet,
    ) -> Result<(), ProviderError> {
        let map = json!({ "permission_overwrites": overwrites.to_json() });
        with_retry("apply overwrites", || async {
            self.http
                .edit_channel(serenity::GenericChannelId::new(channel_id.get()), &map, None)
                .await
                .map(drop)
                .map_err(ProviderError::from)
        })
        .await
    }

    async fn edit_room(
        &self,
        channel_id: serenity::ChannelId,
        edit: &RoomEdit,
    ) -> Result<(), ProviderError> {
        let mut map = serde_json::Map::new();
        if let Some(name) = &edit.name {
            map.insert("name".to_string(), json!(name));
        }
        if let Some(limit) = edit.user_limit {
            map.insert("user_limit".to_string(), json!(limit));
        }
        if map.is_empty() {
            return Ok(());
        }

        with_retry("edit room", || async {
            self.http
                .edit_channel(serenity::GenericChannelId::new(channel_id.get()), &map, None)
                .await
                .map(drop)
                .map_err(ProviderError::from)
        })
        .await
    }

    async fn send_message(
        &self,
        channel_id: serenity::ChannelId,
        content: &str,
    ) -> Result<(), ProviderError> {
        let message = serenity::CreateMessage::new()
            .content(content)
            .allowed_mentions(serenity::CreateAllowedMentions::new().all_users(true));

        with_retry("send message", || async {
            self.http
                .send_message(channel_id.into(), Vec::new(), &message)
                .await
                .map(drop)
                .map_err(ProviderError::from)
        })
        .await
    }
}
