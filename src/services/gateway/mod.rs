//! The voice platform as seen by the room lifecycle: a handful of cache reads
//! and the few HTTP calls rooms need. [`DiscordGateway`] is the live
//! implementation; tests substitute a recording fake.

use crate::services::permissions::{MemberRoles, OverwriteSet};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub mod discord;

pub use discord::DiscordGateway;

/// Upper bound for a single provider call.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("request rejected: {0}")]
    Fatal(String),
}

impl ProviderError {
    /// Rate limits, upstream 5xx and timeouts are worth one more attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transient(_))
    }
}

impl From<serenity::Error> for ProviderError {
    fn from(err: serenity::Error) -> Self {
        let status = match &err {
            serenity::Error::Http(http) => http.status_code().map(|s| s.as_u16()),
            _ => return Self::Fatal(err.to_string()),
        };

        match status {
            Some(429) | None => Self::Transient(err.to_string()),
            Some(404) => Self::NotFound(err.to_string()),
            Some(code) if code >= 500 => Self::Transient(err.to_string()),
            Some(_) => Self::Fatal(err.to_string()),
        }
    }
}

/// What a new room is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSpec {
    pub guild_id: serenity::GuildId,
    pub name: String,
    pub parent_id: Option<serenity::ChannelId>,
    /// 0 means unlimited.
    pub user_limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomEdit {
    pub name: Option<String>,
    pub user_limit: Option<u32>,
}

#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Whether the bot may create, edit and delete channels in the guild.
    fn can_manage_channels(&self, guild_id: serenity::GuildId) -> bool;

    /// Members currently connected to `channel_id`, with their roles.
    fn live_members(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Vec<MemberRoles>;

    /// Cached roles of a guild member; empty when unknown.
    fn member_roles(
        &self,
        guild_id: serenity::GuildId,
        user_id: serenity::UserId,
    ) -> Vec<serenity::RoleId>;

    fn parent_of(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Option<serenity::ChannelId>;

    /// Overwrites of the category containing `channel_id`, if any.
    fn category_baseline(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> OverwriteSet;

    fn voice_channel_of(
        &self,
        guild_id: serenity::GuildId,
        user_id: serenity::UserId,
    ) -> Option<serenity::ChannelId>;

    fn display_name(&self, guild_id: serenity::GuildId, user_id: serenity::UserId)
    -> Option<String>;

    fn guild_locale(&self, guild_id: serenity::GuildId) -> Option<String>;

    /// The channel's current user limit at the provider (0 means unlimited),
    /// or `None` when the channel is not cached.
    fn user_limit(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Option<u32>;

    async fn create_voice_room(
        &self,
        spec: &RoomSpec,
    ) -> Result<serenity::ChannelId, ProviderError>;

    async fn delete_voice_room(&self, channel_id: serenity::ChannelId)
    -> Result<(), ProviderError>;

    async fn set_member_voice_room(
        &self,
        guild_id: serenity::GuildId,
        user_id: serenity::UserId,
        channel_id: serenity::ChannelId,
    ) -> Result<(), ProviderError>;

    async fn apply_overwrites(
        &self,
        channel_id: serenity::ChannelId,
        overwrites: &OverwriteSet,
    ) -> Result<(), ProviderError>;

    async fn edit_room(
        &self,
        channel_id: serenity::ChannelId,
        edit: &RoomEdit,
    ) -> Result<(), ProviderError>;

    async fn send_message(
        &self,
        channel_id: serenity::ChannelId,
        content: &str,
    ) -> Result<(), ProviderError>;
}

async fn bounded<T>(
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    tokio::time::timeout(PROVIDER_TIMEOUT, call)
        .await
        .map_err(|_| ProviderError::Timeout(PROVIDER_TIMEOUT))?
}

/// Runs `call` under [`PROVIDER_TIMEOUT`], retrying once on a transient
/// failure.
pub async fn with_retry<T, F, Fut>(op: &'static str, mut call: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    match bounded(call()).await {
        Err(err) if err.is_transient() => {
            warn!("{} failed ({}), retrying once", op, err);
            bounded(call()).await
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn stalled_calls_time_out_after_one_retry() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry("rename", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<Result<(), ProviderError>>()
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Timeout(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let attempts = AtomicUsize::new(0);
        let result = with_retry("apply overwrites", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ProviderError::Transient("429".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_channel_is_not_retried() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry("delete room", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::NotFound("Unknown Channel".into())) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::NotFound(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fatal_failure_is_not_retried() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry("create room", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Fatal("Missing Permissions".into())) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Fatal(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
