//! Room lifecycle: spawning rooms from creator channels, keeping their
//! overwrites current while members come and go, ownership changes and
//! deletion once the last member leaves.
//!
//! Every mutation of a room runs under that room's lock in [`RoomLocks`];
//! spawning runs under the creator channel's lock.

use crate::Error;
use crate::db::entities::creator_channels::DEFAULT_NAME_TEMPLATE;
use crate::db::entities::platform_roles::Platform;
use crate::services::channel_name::format_room_name;
use crate::services::gateway::{ProviderError, RoomEdit, RoomSpec, VoiceGateway};
use crate::services::localization::{DEFAULT_LOCALE, LocalizationManager};
use crate::services::ownership::{
    ClaimOutcome, TransferOutcome, can_run_group_command, check_claim, check_transfer,
};
use crate::services::permissions::{
    MemberRoles, OverwriteSet, PolicyInputs, RoomState, resolve,
};
use crate::services::platforms::resolve_platform;
use crate::services::preferences::{PreferenceService, PreferenceUpdate};
use crate::services::relations::{RelationKind, RelationService};
use crate::services::room_locks::RoomLocks;
use crate::services::rooms::{CreatorChannel, NewRoom, Room, RoomRegistry, RoomUpdate};
use anyhow::Context as _;
use fluent::FluentArgs;
use poise::serenity_prelude as serenity;
use sea_orm::{DatabaseConnection, DbErr};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const OWNER_MENTION: &str = "{OWNER_MENTION}";

/// The joining or leaving member, as known when the event arrived.
#[derive(Debug, Clone, Default)]
pub struct MemberInfo {
    pub display_name: String,
    pub role_ids: Vec<serenity::RoleId>,
}

#[derive(Debug, Clone)]
pub struct VoiceTransition {
    pub guild_id: serenity::GuildId,
    pub user_id: serenity::UserId,
    pub member: MemberInfo,
    pub old_channel: Option<serenity::ChannelId>,
    pub new_channel: Option<serenity::ChannelId>,
}

pub struct RoomManager {
    registry: RoomRegistry,
    relations: RelationService,
    preferences: PreferenceService,
    l10n: Arc<LocalizationManager>,
    locks: RoomLocks,
}

impl RoomManager {
    pub fn new(db: DatabaseConnection, l10n: Arc<LocalizationManager>) -> Self {
        Self {
            registry: RoomRegistry::new(db.clone()),
            relations: RelationService::new(db.clone()),
            preferences: PreferenceService::new(db),
            l10n,
            locks: RoomLocks::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn relations(&self) -> &RelationService {
        &self.relations
    }

    pub fn preferences(&self) -> &PreferenceService {
        &self.preferences
    }

    /// Entry point for every voice state change. The departure is handled
    /// before the arrival; a failure on one side does not skip the other.
    pub async fn handle_voice_transition(
        &self,
        gateway: &dyn VoiceGateway,
        transition: VoiceTransition,
    ) -> Result<(), Error> {
        if transition.old_channel == transition.new_channel {
            return Ok(());
        }

        let departure = match transition.old_channel {
            Some(channel_id) => self.on_departure(gateway, transition.guild_id, channel_id).await,
            None => Ok(()),
        };

        let arrival = match transition.new_channel {
            Some(channel_id) => match self.registry.creator(channel_id).await {
                Ok(Some(creator)) => self.spawn_room(gateway, &creator, &transition).await,
                Ok(None) => self.on_arrival(gateway, transition.guild_id, channel_id).await,
                Err(e) => Err(e.into()),
            },
            None => Ok(()),
        };

        departure.and(arrival)
    }

    async fn on_departure(
        &self,
        gateway: &dyn VoiceGateway,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Result<(), Error> {
        if self.registry.room(channel_id).await?.is_none() {
            return Ok(());
        }
        let guard = self.locks.lock(channel_id.get()).await;
        let Some(room) = self.registry.room(channel_id).await? else {
            drop(guard);
            self.locks.forget(channel_id.get());
            return Ok(());
        };

        let live = gateway.live_members(guild_id, channel_id);
        if live.is_empty() {
            self.delete_room(gateway, &room).await?;
            drop(guard);
            self.locks.forget(channel_id.get());
            return Ok(());
        }

        self.apply(gateway, &room, &live).await
    }

    async fn on_arrival(
        &self,
        gateway: &dyn VoiceGateway,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Result<(), Error> {
        if self.registry.room(channel_id).await?.is_none() {
            return Ok(());
        }
        let guard = self.locks.lock(channel_id.get()).await;
        let Some(room) = self.registry.room(channel_id).await? else {
            drop(guard);
            self.locks.forget(channel_id.get());
            return Ok(());
        };

        let live = gateway.live_members(guild_id, channel_id);
        self.apply(gateway, &room, &live).await
    }

    /// Removes the room at the provider, then its record. When the provider
    /// call fails the record stays, so the next sweep of the guild retries.
    async fn delete_room(&self, gateway: &dyn VoiceGateway, room: &Room) -> Result<(), Error> {
        let channel_id = room.channel_id();
        info!("Deleting empty room {} in guild {}", channel_id, room.guild());

        match gateway.delete_voice_room(channel_id).await {
            Ok(()) => {}
            Err(ProviderError::NotFound(_)) => {
                debug!("Room {} was already gone at the provider", channel_id);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("deleting room {}", channel_id));
            }
        }
        self.registry.delete_room(channel_id).await?;
        Ok(())
    }

    async fn spawn_room(
        &self,
        gateway: &dyn VoiceGateway,
        creator: &CreatorChannel,
        transition: &VoiceTransition,
    ) -> Result<(), Error> {
        let guild_id = transition.guild_id;
        let owner_id = transition.user_id;

        if !gateway.can_manage_channels(guild_id) {
            warn!(
                "Missing Manage Channels in guild {}; not spawning a room from {}",
                guild_id,
                creator.channel_id()
            );
            return Ok(());
        }

        let _creator_guard = self.locks.lock(creator.channel_id().get()).await;
        if gateway.voice_channel_of(guild_id, owner_id) != Some(creator.channel_id()) {
            debug!(
                "{} left {} before their room was created",
                owner_id,
                creator.channel_id()
            );
            return Ok(());
        }

        let prefs = self.preferences.get(owner_id, guild_id).await?;
        let associations = self.relations.platform_roles(guild_id).await?;
        let platform = resolve_platform(
            prefs.as_ref().and_then(|p| p.last_platform),
            &associations,
            &transition.member.role_ids,
        );
        let build = prefs.as_ref().and_then(|p| p.last_build.clone());
        let user_limit = prefs
            .as_ref()
            .and_then(|p| p.last_limit)
            .map(|l| l.max(0) as u32)
            .unwrap_or_else(|| creator.limit());

        let spec = RoomSpec {
            guild_id,
            name: format_room_name(
                &creator.name_template,
                &transition.member.display_name,
                platform,
                build.as_deref(),
            ),
            parent_id: gateway.parent_of(guild_id, creator.channel_id()),
            user_limit,
        };

        let channel_id = gateway
            .create_voice_room(&spec)
            .await
            .with_context(|| format!("creating a room for {} in guild {}", owner_id, guild_id))?;
        let _room_guard = self.locks.lock(channel_id.get()).await;

        let new_room = NewRoom {
            channel_id,
            guild_id,
            owner_id,
            creator_channel_id: Some(creator.channel_id()),
            platform,
            build,
            user_limit,
        };
        let room = match self.registry.insert_room(new_room).await {
            Ok(room) => room,
            Err(e) => {
                self.discard_provider_room(gateway, channel_id).await;
                return Err(e.into());
            }
        };

        // The owner is only moved in once the overwrites are in place.
        let live = gateway.live_members(guild_id, channel_id);
        if let Err(first) = self.apply(gateway, &room, &live).await {
            warn!("Initial overwrites for room {} failed, retrying: {:?}", channel_id, first);
            if let Err(e) = self.apply(gateway, &room, &live).await {
                self.roll_back_spawn(gateway, channel_id).await?;
                return Err(e);
            }
        }

        if let Err(e) = gateway
            .set_member_voice_room(guild_id, owner_id, channel_id)
            .await
        {
            self.roll_back_spawn(gateway, channel_id).await?;
            return Err(e).with_context(|| format!("moving {} into room {}", owner_id, channel_id));
        }

        info!(
            "Spawned room {} for {} from creator {} in guild {}",
            channel_id,
            owner_id,
            creator.channel_id(),
            guild_id
        );

        self.post_welcome(gateway, creator, &room).await;
        Ok(())
    }

    async fn discard_provider_room(
        &self,
        gateway: &dyn VoiceGateway,
        channel_id: serenity::ChannelId,
    ) {
        if let Err(e) = gateway.delete_voice_room(channel_id).await {
            error!("Failed to roll back room {}: {}", channel_id, e);
        }
    }

    /// Undoes a spawn that failed after the record was written. If the
    /// provider room cannot be removed the record stays for the sweep.
    async fn roll_back_spawn(
        &self,
        gateway: &dyn VoiceGateway,
        channel_id: serenity::ChannelId,
    ) -> Result<(), Error> {
        match gateway.delete_voice_room(channel_id).await {
            Ok(()) | Err(ProviderError::NotFound(_)) => {
                self.registry.delete_room(channel_id).await?;
            }
            Err(e) => error!("Failed to roll back room {}: {}", channel_id, e),
        }
        Ok(())
    }

    async fn post_welcome(&self, gateway: &dyn VoiceGateway, creator: &CreatorChannel, room: &Room) {
        let guild_id = room.guild();
        let owner_id = room.owner();
        let locale = gateway
            .guild_locale(guild_id)
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        let mention = format!("<@{}>", owner_id);

        let welcome = match &creator.welcome_message {
            Some(text) => text.replace(OWNER_MENTION, &mention),
            None => {
                let mut args = FluentArgs::new();
                args.set("owner", mention);
                self.l10n.translate(&locale, "welcome-default", Some(&args))
            }
        };

        let rules = match self
            .preferences
            .rules(owner_id, guild_id, creator.channel_id())
            .await
        {
            Ok(Some(rules)) => {
                let mut args = FluentArgs::new();
                args.set("rules", rules);
                self.l10n.translate(&locale, "rules-posted", Some(&args))
            }
            Ok(None) => self.l10n.translate(&locale, "rules-hint", None),
            Err(e) => {
                warn!("Could not load rules for {}: {}", owner_id, e);
                self.l10n.translate(&locale, "rules-hint", None)
            }
        };

        for content in [welcome, rules] {
            if let Err(e) = gateway.send_message(room.channel_id(), &content).await {
                warn!("Failed to post in room {}: {}", room.channel_id(), e);
                return;
            }
        }
    }

    /// Recomputes the room's overwrites from current state and applies them.
    pub async fn reevaluate(&self, gateway: &dyn VoiceGateway, room: &Room) -> Result<(), Error> {
        let live = gateway.live_members(room.guild(), room.channel_id());
        self.apply(gateway, room, &live).await
    }

    async fn apply(
        &self,
        gateway: &dyn VoiceGateway,
        room: &Room,
        live: &[MemberRoles],
    ) -> Result<(), Error> {
        let overwrites = self.overwrites_for(gateway, room, live).await?;
        gateway
            .apply_overwrites(room.channel_id(), &overwrites)
            .await
            .with_context(|| format!("applying overwrites to room {}", room.channel_id()))?;
        Ok(())
    }

    async fn overwrites_for(
        &self,
        gateway: &dyn VoiceGateway,
        room: &Room,
        live: &[MemberRoles],
    ) -> Result<OverwriteSet, DbErr> {
        let guild_id = room.guild();
        let owner_id = room.owner();

        let policy = self.preferences.policy(owner_id, guild_id).await?;
        let trusted = self.relations.trusted_set(owner_id, guild_id).await?;
        let blocked: Vec<MemberRoles> = self
            .relations
            .list(RelationKind::Block, owner_id, guild_id)
            .await?
            .into_iter()
            .map(|user_id| MemberRoles {
                user_id,
                role_ids: gateway.member_roles(guild_id, user_id),
            })
            .collect();
        let staff_roles = self.relations.staff_roles(guild_id).await?;
        let baseline = gateway.category_baseline(guild_id, room.channel_id());

        Ok(resolve(&PolicyInputs {
            room: RoomState {
                guild_id,
                owner_id,
                user_limit: gateway
                    .user_limit(guild_id, room.channel_id())
                    .unwrap_or_else(|| room.limit()),
                member_count: live.len(),
            },
            policy,
            trusted: &trusted,
            blocked: &blocked,
            staff_roles: &staff_roles,
            live_members: live,
            baseline: &baseline,
        }))
    }

    /// Re-applies every room `owner_id` owns in the guild after one of their
    /// settings changed. Returns how many rooms were updated.
    pub async fn reevaluate_owned_rooms(
        &self,
        gateway: &dyn VoiceGateway,
        guild_id: serenity::GuildId,
        owner_id: serenity::UserId,
    ) -> Result<usize, Error> {
        let mut updated = 0;
        for room in self.registry.rooms_owned_by(guild_id, owner_id).await? {
            let _guard = self.locks.lock(room.channel_id().get()).await;
            // Ownership may have moved while waiting for the lock.
            let Some(room) = self.registry.room(room.channel_id()).await? else {
                continue;
            };
            if room.owner() != owner_id {
                continue;
            }

            match self.reevaluate(gateway, &room).await {
                Ok(()) => updated += 1,
                Err(e) => warn!("Re-evaluating room {} failed: {:?}", room.channel_id(), e),
            }
        }
        Ok(updated)
    }

    /// Re-applies every tracked room in the guild, e.g. after the staff roles
    /// changed.
    pub async fn reevaluate_guild(
        &self,
        gateway: &dyn VoiceGateway,
        guild_id: serenity::GuildId,
    ) -> Result<usize, Error> {
        let mut updated = 0;
        for room in self.registry.rooms_in_guild(guild_id).await? {
            let _guard = self.locks.lock(room.channel_id().get()).await;
            let Some(room) = self.registry.room(room.channel_id()).await? else {
                continue;
            };

            match self.reevaluate(gateway, &room).await {
                Ok(()) => updated += 1,
                Err(e) => warn!("Re-evaluating room {} failed: {:?}", room.channel_id(), e),
            }
        }
        Ok(updated)
    }

    /// Whether `actor_id` may use room commands in `room`.
    pub async fn may_command(
        &self,
        room: &Room,
        actor_id: serenity::UserId,
    ) -> Result<bool, DbErr> {
        let guild_id = room.guild();
        let owner_id = room.owner();
        let access = self.preferences.command_access(owner_id, guild_id).await?;
        let trusted = self.relations.trusted_set(owner_id, guild_id).await?;
        let blocked: HashSet<serenity::UserId> = self
            .relations
            .list(RelationKind::Block, owner_id, guild_id)
            .await?
            .into_iter()
            .collect();

        Ok(can_run_group_command(access, actor_id, owner_id, &trusted, &blocked))
    }

    pub async fn claim(
        &self,
        gateway: &dyn VoiceGateway,
        channel_id: serenity::ChannelId,
        claimant_id: serenity::UserId,
    ) -> Result<ClaimOutcome, Error> {
        let _guard = self.locks.lock(channel_id.get()).await;
        let Some(room) = self.registry.room(channel_id).await? else {
            return Ok(ClaimOutcome::NotTracked);
        };

        let live = gateway.live_members(room.guild(), channel_id);
        let connected: Vec<serenity::UserId> = live.iter().map(|m| m.user_id).collect();
        let outcome = check_claim(room.owner(), claimant_id, &connected);
        if outcome != ClaimOutcome::Claimed {
            return Ok(outcome);
        }

        let Some(room) = self
            .registry
            .update_room(channel_id, RoomUpdate::Owner(claimant_id))
            .await?
        else {
            return Ok(ClaimOutcome::NotTracked);
        };
        info!("{} claimed room {}", claimant_id, channel_id);

        self.apply(gateway, &room, &live).await?;
        Ok(outcome)
    }

    pub async fn transfer(
        &self,
        gateway: &dyn VoiceGateway,
        channel_id: serenity::ChannelId,
        actor_id: serenity::UserId,
        target_id: serenity::UserId,
    ) -> Result<TransferOutcome, Error> {
        let _guard = self.locks.lock(channel_id.get()).await;
        let Some(room) = self.registry.room(channel_id).await? else {
            return Ok(TransferOutcome::NotTracked);
        };

        let live = gateway.live_members(room.guild(), channel_id);
        let connected: Vec<serenity::UserId> = live.iter().map(|m| m.user_id).collect();
        let outcome = check_transfer(room.owner(), actor_id, target_id, &connected);
        if outcome != TransferOutcome::Transferred {
            return Ok(outcome);
        }

        let Some(room) = self
            .registry
            .update_room(channel_id, RoomUpdate::Owner(target_id))
            .await?
        else {
            return Ok(TransferOutcome::NotTracked);
        };
        info!("Room {} transferred from {} to {}", channel_id, actor_id, target_id);

        self.apply(gateway, &room, &live).await?;
        Ok(outcome)
    }

    /// Sets the occupancy limit (0 for unlimited). Returns the updated room,
    /// or None when the channel is not tracked.
    pub async fn set_limit(
        &self,
        gateway: &dyn VoiceGateway,
        channel_id: serenity::ChannelId,
        limit: u32,
    ) -> Result<Option<Room>, Error> {
        let _guard = self.locks.lock(channel_id.get()).await;
        let Some(room) = self.registry.room(channel_id).await? else {
            return Ok(None);
        };

        gateway
            .edit_room(
                channel_id,
                &RoomEdit {
                    user_limit: Some(limit),
                    ..Default::default()
                },
            )
            .await?;

        let Some(room) = self
            .registry
            .update_room(channel_id, RoomUpdate::Limit(limit))
            .await?
        else {
            return Ok(None);
        };
        self.preferences
            .update(room.owner(), room.guild(), PreferenceUpdate::LastLimit(limit))
            .await?;

        // Fullness may have flipped.
        self.reevaluate(gateway, &room).await?;
        Ok(Some(room))
    }

    pub async fn set_platform(
        &self,
        gateway: &dyn VoiceGateway,
        channel_id: serenity::ChannelId,
        platform: Platform,
    ) -> Result<Option<Room>, Error> {
        let _guard = self.locks.lock(channel_id.get()).await;
        let Some(room) = self.registry.room(channel_id).await? else {
            return Ok(None);
        };

        self.rename(gateway, &room, Some(platform), room.build.as_deref())
            .await?;

        let Some(room) = self
            .registry
            .update_room(channel_id, RoomUpdate::Platform(platform))
            .await?
        else {
            return Ok(None);
        };
        self.preferences
            .update(room.owner(), room.guild(), PreferenceUpdate::LastPlatform(platform))
            .await?;
        Ok(Some(room))
    }

    /// `None` or blank text clears the build.
    pub async fn set_build(
        &self,
        gateway: &dyn VoiceGateway,
        channel_id: serenity::ChannelId,
        build: Option<String>,
    ) -> Result<Option<Room>, Error> {
        let build = build
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        let _guard = self.locks.lock(channel_id.get()).await;
        let Some(room) = self.registry.room(channel_id).await? else {
            return Ok(None);
        };

        self.rename(gateway, &room, room.platform, build.as_deref())
            .await?;

        let Some(room) = self
            .registry
            .update_room(channel_id, RoomUpdate::Build(build.clone()))
            .await?
        else {
            return Ok(None);
        };
        self.preferences
            .update(room.owner(), room.guild(), PreferenceUpdate::LastBuild(build))
            .await?;
        Ok(Some(room))
    }

    async fn rename(
        &self,
        gateway: &dyn VoiceGateway,
        room: &Room,
        platform: Option<Platform>,
        build: Option<&str>,
    ) -> Result<(), Error> {
        let template = match room.creator_channel() {
            Some(creator_id) => self
                .registry
                .creator(creator_id)
                .await?
                .map(|c| c.name_template),
            None => None,
        }
        .unwrap_or_else(|| DEFAULT_NAME_TEMPLATE.to_string());

        let display_name = gateway
            .display_name(room.guild(), room.owner())
            .unwrap_or_else(|| room.owner().to_string());
        let name = format_room_name(&template, &display_name, platform, build);

        gateway
            .edit_room(
                room.channel_id(),
                &RoomEdit {
                    name: Some(name),
                    ..Default::default()
                },
            )
            .await
            .with_context(|| format!("renaming room {}", room.channel_id()))?;
        Ok(())
    }

    /// Deletes tracked rooms that emptied while the bot was away. Returns how
    /// many were removed.
    pub async fn sweep_guild(
        &self,
        gateway: &dyn VoiceGateway,
        guild_id: serenity::GuildId,
    ) -> Result<usize, Error> {
        let mut removed = 0;
        for room in self.registry.rooms_in_guild(guild_id).await? {
            let channel_id = room.channel_id();
            let guard = self.locks.lock(channel_id.get()).await;
            let Some(room) = self.registry.room(channel_id).await? else {
                continue;
            };
            if !gateway.live_members(guild_id, channel_id).is_empty() {
                continue;
            }

            if let Err(e) = self.delete_room(gateway, &room).await {
                warn!("Sweeping room {} failed: {:?}", channel_id, e);
                continue;
            }
            drop(guard);
            self.locks.forget(channel_id.get());
            removed += 1;
        }

        if removed > 0 {
            info!("Swept {} empty rooms in guild {}", removed, guild_id);
        }
        Ok(removed)
    }

    /// The room's channel was edited at the provider, e.g. its owner changed
    /// the user limit from the client. Stores the new limit and re-applies
    /// the overwrites; edits that leave the limit alone are ignored.
    pub async fn sync_room(
        &self,
        gateway: &dyn VoiceGateway,
        channel_id: serenity::ChannelId,
    ) -> Result<(), Error> {
        if self.registry.room(channel_id).await?.is_none() {
            return Ok(());
        }
        let _guard = self.locks.lock(channel_id.get()).await;
        let Some(room) = self.registry.room(channel_id).await? else {
            return Ok(());
        };
        let Some(limit) = gateway.user_limit(room.guild(), channel_id) else {
            return Ok(());
        };
        if limit == room.limit() {
            return Ok(());
        }

        debug!("Room {} limit changed to {} at the provider", channel_id, limit);
        let Some(room) = self
            .registry
            .update_room(channel_id, RoomUpdate::Limit(limit))
            .await?
        else {
            return Ok(());
        };
        self.reevaluate(gateway, &room).await
    }

    /// A channel was deleted by someone else: drop whatever tracked it.
    pub async fn forget_channel(&self, channel_id: serenity::ChannelId) -> Result<(), Error> {
        let guard = self.locks.lock(channel_id.get()).await;
        if self.registry.delete_room(channel_id).await? {
            info!("Room {} was deleted externally", channel_id);
        }
        if self.registry.remove_creator(channel_id).await? {
            info!("Creator channel {} was deleted; configuration removed", channel_id);
        }
        drop(guard);
        self.locks.forget(channel_id.get());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::temp_channels;
    use crate::db::entities::user_preferences::ChatRestriction;
    use crate::db::{test_connection, to_db_id};
    use crate::services::gateway::{PROVIDER_TIMEOUT, ProviderError};
    use crate::services::permissions::{CHAT, OWNER_ALLOW, Subject};
    use async_trait::async_trait;
    use sea_orm::EntityTrait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const GUILD: u64 = 1398084425169895434;
    const CREATOR: u64 = 500;
    const CATEGORY: u64 = 400;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(RoomSpec),
        Delete(serenity::ChannelId),
        Move(serenity::UserId, serenity::ChannelId),
        /// Whether the room record existed when the overwrites landed.
        Apply(serenity::ChannelId, OverwriteSet, bool),
        Edit(serenity::ChannelId, RoomEdit),
        Send(serenity::ChannelId, String),
    }

    #[derive(Default)]
    struct FakeState {
        voice: HashMap<serenity::UserId, serenity::ChannelId>,
        roles: HashMap<serenity::UserId, Vec<serenity::RoleId>>,
        /// Provider-side user limits, once known.
        limits: HashMap<serenity::ChannelId, u32>,
        apply_failures: usize,
        calls: Vec<Call>,
        next_id: u64,
    }

    struct FakeGateway {
        db: DatabaseConnection,
        manage: bool,
        fail_move: bool,
        fail_delete: Option<fn() -> ProviderError>,
        state: Mutex<FakeState>,
    }

    impl FakeGateway {
        fn new(db: DatabaseConnection) -> Self {
            Self {
                db,
                manage: true,
                fail_move: false,
                fail_delete: None,
                state: Mutex::new(FakeState {
                    next_id: 9000,
                    ..Default::default()
                }),
            }
        }

        fn connect(&self, user: serenity::UserId, channel: Option<serenity::ChannelId>) {
            let mut state = self.state.lock().unwrap();
            match channel {
                Some(c) => state.voice.insert(user, c),
                None => state.voice.remove(&user),
            };
        }

        fn set_provider_limit(&self, channel: serenity::ChannelId, limit: u32) {
            self.state.lock().unwrap().limits.insert(channel, limit);
        }

        fn fail_next_applies(&self, count: usize) {
            self.state.lock().unwrap().apply_failures = count;
        }

        fn calls(&self) -> Vec<Call> {
            self.state.lock().unwrap().calls.clone()
        }

        fn clear_calls(&self) {
            self.state.lock().unwrap().calls.clear();
        }

        fn record(&self, call: Call) {
            self.state.lock().unwrap().calls.push(call);
        }
    }

    #[async_trait]
    impl VoiceGateway for FakeGateway {
        fn can_manage_channels(&self, _guild_id: serenity::GuildId) -> bool {
            self.manage
        }

        fn live_members(
            &self,
            _guild_id: serenity::GuildId,
            channel_id: serenity::ChannelId,
        ) -> Vec<MemberRoles> {
            let state = self.state.lock().unwrap();
            let mut members: Vec<MemberRoles> = state
                .voice
                .iter()
                .filter(|(_, c)| **c == channel_id)
                .map(|(user_id, _)| MemberRoles {
                    user_id: *user_id,
                    role_ids: state.roles.get(user_id).cloned().unwrap_or_default(),
                })
                .collect();
            members.sort_by_key(|m| m.user_id);
            members
        }

        fn member_roles(
            &self,
            _guild_id: serenity::GuildId,
            user_id: serenity::UserId,
        ) -> Vec<serenity::RoleId> {
            let state = self.state.lock().unwrap();
            state.roles.get(&user_id).cloned().unwrap_or_default()
        }

        fn parent_of(
            &self,
            _guild_id: serenity::GuildId,
            _channel_id: serenity::ChannelId,
        ) -> Option<serenity::ChannelId> {
            Some(serenity::ChannelId::new(CATEGORY))
        }

        fn category_baseline(
            &self,
            _guild_id: serenity::GuildId,
            _channel_id: serenity::ChannelId,
        ) -> OverwriteSet {
            OverwriteSet::new()
        }

        fn voice_channel_of(
            &self,
            _guild_id: serenity::GuildId,
            user_id: serenity::UserId,
        ) -> Option<serenity::ChannelId> {
            self.state.lock().unwrap().voice.get(&user_id).copied()
        }

        fn display_name(
            &self,
            _guild_id: serenity::GuildId,
            user_id: serenity::UserId,
        ) -> Option<String> {
            Some(format!("user{}", user_id))
        }

        fn guild_locale(&self, _guild_id: serenity::GuildId) -> Option<String> {
            None
        }

        fn user_limit(
            &self,
            _guild_id: serenity::GuildId,
            channel_id: serenity::ChannelId,
        ) -> Option<u32> {
            self.state.lock().unwrap().limits.get(&channel_id).copied()
        }

        async fn create_voice_room(
            &self,
            spec: &RoomSpec,
        ) -> Result<serenity::ChannelId, ProviderError> {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            state.calls.push(Call::Create(spec.clone()));
            Ok(serenity::ChannelId::new(state.next_id))
        }

        async fn delete_voice_room(
            &self,
            channel_id: serenity::ChannelId,
        ) -> Result<(), ProviderError> {
            self.record(Call::Delete(channel_id));
            match self.fail_delete {
                Some(failure) => Err(failure()),
                None => Ok(()),
            }
        }

        async fn set_member_voice_room(
            &self,
            _guild_id: serenity::GuildId,
            user_id: serenity::UserId,
            channel_id: serenity::ChannelId,
        ) -> Result<(), ProviderError> {
            self.record(Call::Move(user_id, channel_id));
            if self.fail_move {
                return Err(ProviderError::Fatal("Target user is not connected to voice.".into()));
            }
            self.connect(user_id, Some(channel_id));
            Ok(())
        }

        async fn apply_overwrites(
            &self,
            channel_id: serenity::ChannelId,
            overwrites: &OverwriteSet,
        ) -> Result<(), ProviderError> {
            {
                let mut state = self.state.lock().unwrap();
                if state.apply_failures > 0 {
                    state.apply_failures -= 1;
                    return Err(ProviderError::Transient("502 Bad Gateway".into()));
                }
            }
            let tracked = temp_channels::Entity::find_by_id(to_db_id(channel_id.get()))
                .one(&self.db)
                .await
                .map_err(|e| ProviderError::Fatal(e.to_string()))?
                .is_some();
            self.record(Call::Apply(channel_id, overwrites.clone(), tracked));
            Ok(())
        }

        async fn edit_room(
            &self,
            channel_id: serenity::ChannelId,
            edit: &RoomEdit,
        ) -> Result<(), ProviderError> {
            self.record(Call::Edit(channel_id, edit.clone()));
            if let Some(limit) = edit.user_limit {
                self.set_provider_limit(channel_id, limit);
            }
            Ok(())
        }

        async fn send_message(
            &self,
            channel_id: serenity::ChannelId,
            content: &str,
        ) -> Result<(), ProviderError> {
            self.record(Call::Send(channel_id, content.to_string()));
            Ok(())
        }
    }

    fn user(id: u64) -> serenity::UserId {
        serenity::UserId::new(id)
    }

    fn guild() -> serenity::GuildId {
        serenity::GuildId::new(GUILD)
    }

    fn creator() -> serenity::ChannelId {
        serenity::ChannelId::new(CREATOR)
    }

    fn moved(
        user_id: serenity::UserId,
        from: Option<serenity::ChannelId>,
        to: Option<serenity::ChannelId>,
    ) -> VoiceTransition {
        VoiceTransition {
            guild_id: guild(),
            user_id,
            member: MemberInfo {
                display_name: format!("user{}", user_id),
                role_ids: vec![],
            },
            old_channel: from,
            new_channel: to,
        }
    }

    async fn setup() -> (RoomManager, FakeGateway) {
        let db = test_connection().await;
        let manager = RoomManager::new(db.clone(), Arc::new(LocalizationManager::new()));
        manager
            .registry()
            .upsert_creator(creator(), guild(), Some("{USER} [{PLATFORM:-Any}]".into()), 0)
            .await
            .unwrap();
        (manager, FakeGateway::new(db))
    }

    /// Joins `owner` to the creator channel and returns the spawned room.
    async fn spawn(manager: &RoomManager, fake: &FakeGateway, owner: serenity::UserId) -> Room {
        fake.connect(owner, Some(creator()));
        manager
            .handle_voice_transition(fake, moved(owner, None, Some(creator())))
            .await
            .unwrap();
        let room_id = fake.voice_channel_of(guild(), owner).unwrap();
        manager.registry().room(room_id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn joining_a_creator_spawns_a_tracked_room() {
        let (manager, fake) = setup().await;
        let owner = user(1448575022439596062);
        let room = spawn(&manager, &fake, owner).await;

        assert_eq!(room.owner(), owner);
        assert_eq!(room.creator_channel(), Some(creator()));

        let calls = fake.calls();
        let Call::Create(spec) = &calls[0] else {
            panic!("expected create first, got {:?}", calls);
        };
        assert_eq!(spec.name, "user1448575022439596062 [Any]");
        assert_eq!(spec.parent_id, Some(serenity::ChannelId::new(CATEGORY)));

        let Call::Apply(channel, overwrites, tracked) = &calls[1] else {
            panic!("expected overwrites second, got {:?}", calls);
        };
        assert_eq!(*channel, room.channel_id());
        assert!(*tracked, "record must exist before overwrites are applied");
        assert_eq!(overwrites.get(&Subject::Member(owner)).unwrap().allow, OWNER_ALLOW);

        assert_eq!(calls[2], Call::Move(owner, room.channel_id()));

        let Call::Send(_, welcome) = &calls[3] else {
            panic!("expected welcome, got {:?}", calls);
        };
        assert!(welcome.contains(&format!("<@{}>", owner)));
        assert!(matches!(&calls[4], Call::Send(..)));
    }

    #[tokio::test]
    async fn custom_welcome_and_rules_are_posted() {
        let (manager, fake) = setup().await;
        let owner = user(7);
        manager
            .registry()
            .set_welcome_message(creator(), Some("Hey {OWNER_MENTION}!".into()))
            .await
            .unwrap();
        manager
            .preferences()
            .set_rules(owner, guild(), creator(), Some("No spoilers"))
            .await
            .unwrap();

        let room = spawn(&manager, &fake, owner).await;
        let sent: Vec<String> = fake
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(channel, text) if channel == room.channel_id() => Some(text),
                _ => None,
            })
            .collect();

        assert_eq!(sent[0], "Hey <@7>!");
        assert!(sent[1].contains("No spoilers"), "{:?}", sent);
    }

    #[tokio::test]
    async fn spawning_uses_last_preferences_and_role_inference() {
        let (manager, fake) = setup().await;
        let owner = user(8);
        let xbox_role = serenity::RoleId::new(77);
        manager
            .relations()
            .set_platform_role(guild(), xbox_role, Platform::Xbox)
            .await
            .unwrap();
        manager
            .preferences()
            .update(owner, guild(), PreferenceUpdate::LastLimit(4))
            .await
            .unwrap();

        fake.connect(owner, Some(creator()));
        let mut transition = moved(owner, None, Some(creator()));
        transition.member.role_ids = vec![xbox_role];
        manager.handle_voice_transition(&fake, transition).await.unwrap();

        let Call::Create(spec) = &fake.calls()[0] else {
            panic!("expected create");
        };
        assert_eq!(spec.name, "user8 [Xbox]");
        assert_eq!(spec.user_limit, 4);
    }

    #[tokio::test]
    async fn nothing_is_created_without_manage_channels() {
        let (manager, mut fake) = setup().await;
        fake.manage = false;
        fake.connect(user(1), Some(creator()));

        manager
            .handle_voice_transition(&fake, moved(user(1), None, Some(creator())))
            .await
            .unwrap();

        assert!(fake.calls().is_empty());
        assert!(manager.registry().rooms_in_guild(guild()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_move_rolls_back_room_and_record() {
        let (manager, mut fake) = setup().await;
        fake.fail_move = true;
        fake.connect(user(1), Some(creator()));

        let result = manager
            .handle_voice_transition(&fake, moved(user(1), None, Some(creator())))
            .await;
        assert!(result.is_err());

        let calls = fake.calls();
        let Call::Create(_) = &calls[0] else {
            panic!("expected create");
        };
        assert!(calls.iter().any(|c| matches!(c, Call::Delete(_))));
        assert!(manager.registry().rooms_in_guild(guild()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn initial_overwrites_are_retried_once() {
        let (manager, fake) = setup().await;
        fake.fail_next_applies(1);
        let room = spawn(&manager, &fake, user(1)).await;

        let calls = fake.calls();
        assert!(matches!(&calls[1], Call::Apply(..)), "{:?}", calls);
        assert_eq!(calls[2], Call::Move(user(1), room.channel_id()));
    }

    #[tokio::test]
    async fn failed_initial_overwrites_roll_back_before_the_move() {
        let (manager, fake) = setup().await;
        fake.fail_next_applies(2);
        fake.connect(user(1), Some(creator()));

        let result = manager
            .handle_voice_transition(&fake, moved(user(1), None, Some(creator())))
            .await;
        assert!(result.is_err());

        let calls = fake.calls();
        assert!(calls.iter().any(|c| matches!(c, Call::Delete(_))));
        assert!(!calls.iter().any(|c| matches!(c, Call::Move(..))));
        assert!(manager.registry().rooms_in_guild(guild()).await.unwrap().is_empty());
        assert_eq!(fake.voice_channel_of(guild(), user(1)), Some(creator()));
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_record_for_the_sweep() {
        let (manager, mut fake) = setup().await;
        let owner = user(1);
        let room_id = spawn(&manager, &fake, owner).await.channel_id();

        fake.fail_delete = Some(|| ProviderError::Timeout(PROVIDER_TIMEOUT));
        fake.connect(owner, None);
        let result = manager
            .handle_voice_transition(&fake, moved(owner, Some(room_id), None))
            .await;
        assert!(result.is_err());
        assert!(manager.registry().room(room_id).await.unwrap().is_some());

        fake.fail_delete = None;
        fake.clear_calls();
        assert_eq!(manager.sweep_guild(&fake, guild()).await.unwrap(), 1);
        assert_eq!(fake.calls(), vec![Call::Delete(room_id)]);
        assert!(manager.registry().room(room_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn room_already_gone_at_the_provider_is_forgotten() {
        let (manager, mut fake) = setup().await;
        let owner = user(1);
        let room_id = spawn(&manager, &fake, owner).await.channel_id();

        fake.fail_delete = Some(|| ProviderError::NotFound("Unknown Channel".into()));
        fake.connect(owner, None);
        manager
            .handle_voice_transition(&fake, moved(owner, Some(room_id), None))
            .await
            .unwrap();
        assert!(manager.registry().room(room_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn untracked_channels_leave_no_lock_entries() {
        let (manager, fake) = setup().await;
        let lobby = serenity::ChannelId::new(600);
        let music = serenity::ChannelId::new(601);

        fake.connect(user(1), Some(lobby));
        manager
            .handle_voice_transition(&fake, moved(user(1), None, Some(lobby)))
            .await
            .unwrap();
        fake.connect(user(1), Some(music));
        manager
            .handle_voice_transition(&fake, moved(user(1), Some(lobby), Some(music)))
            .await
            .unwrap();
        fake.connect(user(1), None);
        manager
            .handle_voice_transition(&fake, moved(user(1), Some(music), None))
            .await
            .unwrap();

        assert_eq!(manager.locks.len(), 0);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn last_departure_deletes_once() {
        let (manager, fake) = setup().await;
        let owner = user(1);
        let room = spawn(&manager, &fake, owner).await;
        let room_id = room.channel_id();

        let guest = user(2);
        fake.connect(guest, Some(room_id));
        manager
            .handle_voice_transition(&fake, moved(guest, None, Some(room_id)))
            .await
            .unwrap();

        fake.clear_calls();
        fake.connect(owner, None);
        manager
            .handle_voice_transition(&fake, moved(owner, Some(room_id), None))
            .await
            .unwrap();
        assert!(matches!(fake.calls().as_slice(), [Call::Apply(..)]));

        fake.connect(guest, None);
        manager
            .handle_voice_transition(&fake, moved(guest, Some(room_id), None))
            .await
            .unwrap();
        // A duplicate notification must not delete twice.
        manager
            .handle_voice_transition(&fake, moved(guest, Some(room_id), None))
            .await
            .unwrap();

        let deletes = fake
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Delete(_)))
            .count();
        assert_eq!(deletes, 1);
        assert!(manager.registry().room(room_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fullness_restricts_chat_for_newcomers_only() {
        let (manager, fake) = setup().await;
        let owner = user(1);
        manager
            .preferences()
            .update(owner, guild(), PreferenceUpdate::Chat(ChatRestriction::OpenSpots))
            .await
            .unwrap();
        let room = spawn(&manager, &fake, owner).await;
        manager.set_limit(&fake, room.channel_id(), 2).await.unwrap();

        let guest = user(2);
        fake.clear_calls();
        fake.connect(guest, Some(room.channel_id()));
        manager
            .handle_voice_transition(&fake, moved(guest, None, Some(room.channel_id())))
            .await
            .unwrap();

        let Some(Call::Apply(_, overwrites, _)) = fake.calls().pop() else {
            panic!("expected overwrites");
        };
        let everyone = Subject::Role(serenity::RoleId::new(GUILD));
        assert!(overwrites.get(&everyone).unwrap().deny.contains(CHAT));
        assert!(overwrites.get(&Subject::Member(guest)).unwrap().allow.contains(CHAT));
    }

    #[tokio::test]
    async fn fullness_follows_the_limit_set_at_the_provider() {
        let (manager, fake) = setup().await;
        let owner = user(1);
        manager
            .preferences()
            .update(owner, guild(), PreferenceUpdate::Chat(ChatRestriction::OpenSpots))
            .await
            .unwrap();
        let room = spawn(&manager, &fake, owner).await;
        assert_eq!(room.limit(), 0);

        // Changed from the client; the record still says unlimited.
        fake.set_provider_limit(room.channel_id(), 2);
        let guest = user(2);
        fake.clear_calls();
        fake.connect(guest, Some(room.channel_id()));
        manager
            .handle_voice_transition(&fake, moved(guest, None, Some(room.channel_id())))
            .await
            .unwrap();

        let Some(Call::Apply(_, overwrites, _)) = fake.calls().pop() else {
            panic!("expected overwrites");
        };
        let everyone = Subject::Role(serenity::RoleId::new(GUILD));
        assert!(overwrites.get(&everyone).unwrap().deny.contains(CHAT));
    }

    #[tokio::test]
    async fn channel_edits_sync_the_stored_limit() {
        let (manager, fake) = setup().await;
        let room_id = spawn(&manager, &fake, user(1)).await.channel_id();

        fake.clear_calls();
        fake.set_provider_limit(room_id, 3);
        manager.sync_room(&fake, room_id).await.unwrap();
        assert_eq!(manager.registry().room(room_id).await.unwrap().unwrap().limit(), 3);
        assert!(matches!(fake.calls().as_slice(), [Call::Apply(..)]));

        // Our own overwrite edits come back as channel updates too.
        fake.clear_calls();
        manager.sync_room(&fake, room_id).await.unwrap();
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn claim_only_succeeds_once_the_owner_left() {
        let (manager, fake) = setup().await;
        let owner = user(1);
        let guest = user(2);
        let room = spawn(&manager, &fake, owner).await;
        let room_id = room.channel_id();
        fake.connect(guest, Some(room_id));

        assert_eq!(
            manager.claim(&fake, room_id, guest).await.unwrap(),
            ClaimOutcome::OwnerPresent
        );
        assert_eq!(manager.registry().room(room_id).await.unwrap().unwrap().owner(), owner);

        fake.connect(owner, None);
        fake.clear_calls();
        assert_eq!(
            manager.claim(&fake, room_id, guest).await.unwrap(),
            ClaimOutcome::Claimed
        );
        assert_eq!(manager.registry().room(room_id).await.unwrap().unwrap().owner(), guest);

        let Some(Call::Apply(_, overwrites, _)) = fake.calls().pop() else {
            panic!("claim must re-apply overwrites");
        };
        assert_eq!(overwrites.get(&Subject::Member(guest)).unwrap().allow, OWNER_ALLOW);

        assert_eq!(
            manager.claim(&fake, serenity::ChannelId::new(1), guest).await.unwrap(),
            ClaimOutcome::NotTracked
        );
    }

    #[tokio::test]
    async fn transfer_requires_owner_and_connected_target() {
        let (manager, fake) = setup().await;
        let owner = user(1);
        let guest = user(2);
        let room = spawn(&manager, &fake, owner).await;
        let room_id = room.channel_id();

        assert_eq!(
            manager.transfer(&fake, room_id, owner, guest).await.unwrap(),
            TransferOutcome::TargetNotConnected
        );
        fake.connect(guest, Some(room_id));
        assert_eq!(
            manager.transfer(&fake, room_id, guest, guest).await.unwrap(),
            TransferOutcome::NotOwner
        );
        assert_eq!(
            manager.transfer(&fake, room_id, owner, owner).await.unwrap(),
            TransferOutcome::SelfTransfer
        );
        assert_eq!(manager.registry().room(room_id).await.unwrap().unwrap().owner(), owner);

        assert_eq!(
            manager.transfer(&fake, room_id, owner, guest).await.unwrap(),
            TransferOutcome::Transferred
        );
        assert_eq!(manager.registry().room(room_id).await.unwrap().unwrap().owner(), guest);
    }

    #[tokio::test]
    async fn room_edits_rename_and_remember_preferences() {
        let (manager, fake) = setup().await;
        let owner = user(3);
        let room = spawn(&manager, &fake, owner).await;
        let room_id = room.channel_id();
        fake.clear_calls();

        let updated = manager
            .set_platform(&fake, room_id, Platform::Ps5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.platform, Some(Platform::Ps5));
        assert_eq!(
            fake.calls()[0],
            Call::Edit(
                room_id,
                RoomEdit {
                    name: Some("user3 [PS5]".into()),
                    user_limit: None,
                }
            )
        );

        manager
            .set_build(&fake, room_id, Some("  Farming ".into()))
            .await
            .unwrap();
        manager.set_limit(&fake, room_id, 5).await.unwrap();

        let prefs = manager.preferences().get(owner, guild()).await.unwrap().unwrap();
        assert_eq!(prefs.last_platform, Some(Platform::Ps5));
        assert_eq!(prefs.last_build.as_deref(), Some("Farming"));
        assert_eq!(prefs.last_limit, Some(5));
        assert_eq!(
            manager.registry().room(room_id).await.unwrap().unwrap().limit(),
            5
        );
    }

    #[tokio::test]
    async fn settings_changes_reach_every_owned_room() {
        let (manager, fake) = setup().await;
        let owner = user(4);
        let room = spawn(&manager, &fake, owner).await;
        fake.clear_calls();

        let pest = user(5);
        manager
            .relations()
            .add(RelationKind::Block, owner, guild(), pest)
            .await
            .unwrap();
        let updated = manager
            .reevaluate_owned_rooms(&fake, guild(), owner)
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let Some(Call::Apply(channel, overwrites, _)) = fake.calls().pop() else {
            panic!("expected overwrites");
        };
        assert_eq!(channel, room.channel_id());
        assert!(
            overwrites
                .get(&Subject::Member(pest))
                .unwrap()
                .deny
                .contains(serenity::Permissions::CONNECT)
        );
    }

    #[tokio::test]
    async fn staff_roles_reach_every_room_in_the_guild() {
        let (manager, fake) = setup().await;
        let mods = serenity::RoleId::new(77);
        let helper = user(3);
        fake.state.lock().unwrap().roles.insert(helper, vec![mods]);
        for owner in [user(1), user(2)] {
            manager
                .relations()
                .add(RelationKind::Block, owner, guild(), helper)
                .await
                .unwrap();
            spawn(&manager, &fake, owner).await;
        }
        fake.clear_calls();

        manager.relations().add_staff_role(guild(), mods).await.unwrap();
        assert_eq!(manager.reevaluate_guild(&fake, guild()).await.unwrap(), 2);

        let applied: Vec<OverwriteSet> = fake
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Apply(_, overwrites, _) => Some(overwrites),
                _ => None,
            })
            .collect();
        assert_eq!(applied.len(), 2);
        for overwrites in applied {
            let denied = overwrites
                .get(&Subject::Member(helper))
                .is_some_and(|r| r.deny.contains(serenity::Permissions::CONNECT));
            assert!(!denied, "staff must not be locked out");
        }
    }

    #[tokio::test]
    async fn may_command_follows_owner_access_mode() {
        let (manager, fake) = setup().await;
        let owner = user(1);
        let room = spawn(&manager, &fake, owner).await;

        assert!(manager.may_command(&room, user(2)).await.unwrap());
        manager
            .relations()
            .add(RelationKind::Block, owner, guild(), user(2))
            .await
            .unwrap();
        assert!(!manager.may_command(&room, user(2)).await.unwrap());
        assert!(manager.may_command(&room, owner).await.unwrap());
    }

    #[tokio::test]
    async fn sweep_removes_only_empty_rooms() {
        let (manager, fake) = setup().await;
        let busy = spawn(&manager, &fake, user(1)).await;
        let idle = spawn(&manager, &fake, user(2)).await;
        fake.connect(user(2), None);

        assert_eq!(manager.sweep_guild(&fake, guild()).await.unwrap(), 1);
        assert!(manager.registry().room(busy.channel_id()).await.unwrap().is_some());
        assert!(manager.registry().room(idle.channel_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn external_deletion_forgets_room() {
        let (manager, fake) = setup().await;
        let room = spawn(&manager, &fake, user(1)).await;

        manager.forget_channel(room.channel_id()).await.unwrap();
        assert!(manager.registry().room(room.channel_id()).await.unwrap().is_none());

        manager.forget_channel(creator()).await.unwrap();
        assert!(manager.registry().creator(creator()).await.unwrap().is_none());
    }
}
