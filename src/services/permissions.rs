//! Computes the permission overwrites of a temporary room from its owner's
//! policies and the room's live state.
//!
//! [`resolve`] is pure: it reads nothing beyond its inputs, so it is safe to
//! call after every membership change and always describes the full target
//! state rather than a diff.

use crate::db::entities::user_preferences::{ChatRestriction, SoundboardRestriction};
use poise::serenity_prelude as serenity;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};

pub const CHAT: serenity::Permissions = serenity::Permissions::SEND_MESSAGES;

pub const SOUNDBOARD: serenity::Permissions = serenity::Permissions::USE_SOUNDBOARD
    .union(serenity::Permissions::USE_EXTERNAL_SOUNDS);

const TRUSTED_ALLOW: serenity::Permissions = CHAT.union(serenity::Permissions::MOVE_MEMBERS);

const BLOCKED_DENY: serenity::Permissions = serenity::Permissions::CONNECT.union(CHAT);

/// The owner keeps soundboard access even when it is restricted to them.
pub const OWNER_ALLOW: serenity::Permissions = serenity::Permissions::CONNECT
    .union(serenity::Permissions::MANAGE_CHANNELS)
    .union(serenity::Permissions::MOVE_MEMBERS)
    .union(CHAT)
    .union(SOUNDBOARD);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subject {
    Role(serenity::RoleId),
    Member(serenity::UserId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rule {
    pub allow: serenity::Permissions,
    pub deny: serenity::Permissions,
}

impl Rule {
    pub fn allow(&mut self, perms: serenity::Permissions) {
        self.allow.insert(perms);
        self.deny.remove(perms);
    }

    pub fn deny(&mut self, perms: serenity::Permissions) {
        self.deny.insert(perms);
        self.allow.remove(perms);
    }
}

/// Subject-keyed overwrite table. Ordered so identical inputs always produce
/// an identical set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverwriteSet {
    rules: BTreeMap<Subject, Rule>,
}

impl OverwriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from existing channel overwrites (e.g. a category's).
    pub fn from_overwrites<'a>(
        overwrites: impl IntoIterator<Item = &'a serenity::PermissionOverwrite>,
    ) -> Self {
        let mut set = Self::new();
        for overwrite in overwrites {
            let subject = match overwrite.kind {
                serenity::PermissionOverwriteType::Member(id) => Subject::Member(id),
                serenity::PermissionOverwriteType::Role(id) => Subject::Role(id),
                _ => continue,
            };
            set.replace(
                subject,
                Rule {
                    allow: overwrite.allow,
                    deny: overwrite.deny,
                },
            );
        }
        set
    }

    pub fn get(&self, subject: &Subject) -> Option<&Rule> {
        self.rules.get(subject)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Subject, &Rule)> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule for `subject`, created empty if missing. Earlier capabilities
    /// of the subject are kept unless the caller overrides them.
    pub fn rule_mut(&mut self, subject: Subject) -> &mut Rule {
        self.rules.entry(subject).or_default()
    }

    pub fn replace(&mut self, subject: Subject, rule: Rule) {
        self.rules.insert(subject, rule);
    }

    /// Wire form accepted by the channel edit endpoint.
    pub fn to_json(&self) -> serde_json::Value {
        let overwrites: Vec<_> = self
            .rules
            .iter()
            .map(|(subject, rule)| {
                let (id, kind) = match subject {
                    Subject::Role(id) => (id.get(), 0),
                    Subject::Member(id) => (id.get(), 1),
                };
                json!({
                    "id": id.to_string(),
                    "type": kind,
                    "allow": rule.allow.bits().to_string(),
                    "deny": rule.deny.bits().to_string(),
                })
            })
            .collect();
        serde_json::Value::Array(overwrites)
    }
}

/// The subset of an owner preference the resolver reads. Absent rows resolve
/// to the defaults (chat always allowed, soundboard open).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnerPolicy {
    pub chat: ChatRestriction,
    pub soundboard: SoundboardRestriction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRoles {
    pub user_id: serenity::UserId,
    pub role_ids: Vec<serenity::RoleId>,
}

impl MemberRoles {
    pub fn has_any(&self, roles: &HashSet<serenity::RoleId>) -> bool {
        self.role_ids.iter().any(|r| roles.contains(r))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomState {
    pub guild_id: serenity::GuildId,
    pub owner_id: serenity::UserId,
    /// 0 means unlimited.
    pub user_limit: u32,
    pub member_count: usize,
}

impl RoomState {
    pub fn is_full(&self) -> bool {
        self.user_limit > 0 && self.member_count >= self.user_limit as usize
    }

    /// The guild's "everyone" role shares the guild's id.
    pub fn everyone(&self) -> Subject {
        Subject::Role(serenity::RoleId::new(self.guild_id.get()))
    }
}

pub struct PolicyInputs<'a> {
    pub room: RoomState,
    pub policy: OwnerPolicy,
    pub trusted: &'a HashSet<serenity::UserId>,
    /// Blocked users, with whatever roles the guild cache knows for them.
    pub blocked: &'a [MemberRoles],
    pub staff_roles: &'a HashSet<serenity::RoleId>,
    pub live_members: &'a [MemberRoles],
    pub baseline: &'a OverwriteSet,
}

/// Precedence is fixed: later steps win over earlier ones for the same
/// subject and capability.
pub fn resolve(inputs: &PolicyInputs<'_>) -> OverwriteSet {
    let room = inputs.room;
    let mut set = inputs.baseline.clone();
    let connected: HashSet<serenity::UserId> =
        inputs.live_members.iter().map(|m| m.user_id).collect();

    let chat_restricted = inputs.policy.chat == ChatRestriction::OpenSpots && room.is_full();

    let everyone = set.rule_mut(room.everyone());
    if chat_restricted {
        everyone.deny(CHAT);
    } else {
        everyone.allow(CHAT);
    }
    match inputs.policy.soundboard {
        SoundboardRestriction::Anyone => everyone.allow(SOUNDBOARD),
        SoundboardRestriction::Owner => everyone.deny(SOUNDBOARD),
    }

    for user_id in inputs.trusted {
        set.rule_mut(Subject::Member(*user_id)).allow(TRUSTED_ALLOW);
    }

    // Filling the room never mutes people who are already talking in it.
    if chat_restricted {
        for member in inputs.live_members {
            if !inputs.trusted.contains(&member.user_id) {
                set.rule_mut(Subject::Member(member.user_id)).allow(CHAT);
            }
        }
    }

    // A block only stops future entry; present members and staff are exempt.
    for blocked in inputs.blocked {
        if connected.contains(&blocked.user_id) || blocked.has_any(inputs.staff_roles) {
            continue;
        }
        set.rule_mut(Subject::Member(blocked.user_id)).deny(BLOCKED_DENY);
    }

    set.replace(
        Subject::Member(room.owner_id),
        Rule {
            allow: OWNER_ALLOW,
            deny: serenity::Permissions::empty(),
        },
    );

    set
}
