use crate::db::entities::user_preferences::CommandAccess;
use poise::serenity_prelude as serenity;
use std::collections::HashSet;

/// Result of a claim attempt. Only [`ClaimOutcome::Claimed`] mutates anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    AlreadyOwner,
    OwnerPresent,
    ClaimantNotConnected,
    NotTracked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Transferred,
    NotOwner,
    SelfTransfer,
    TargetNotConnected,
    NotTracked,
}

pub fn check_claim(
    owner_id: serenity::UserId,
    claimant_id: serenity::UserId,
    connected: &[serenity::UserId],
) -> ClaimOutcome {
    if claimant_id == owner_id {
        ClaimOutcome::AlreadyOwner
    } else if !connected.contains(&claimant_id) {
        ClaimOutcome::ClaimantNotConnected
    } else if connected.contains(&owner_id) {
        ClaimOutcome::OwnerPresent
    } else {
        ClaimOutcome::Claimed
    }
}

pub fn check_transfer(
    owner_id: serenity::UserId,
    actor_id: serenity::UserId,
    target_id: serenity::UserId,
    connected: &[serenity::UserId],
) -> TransferOutcome {
    if actor_id != owner_id {
        TransferOutcome::NotOwner
    } else if target_id == owner_id {
        TransferOutcome::SelfTransfer
    } else if !connected.contains(&target_id) {
        TransferOutcome::TargetNotConnected
    } else {
        TransferOutcome::Transferred
    }
}

/// Whether `actor_id` may run room commands under the owner's access mode.
/// The owner always may.
pub fn can_run_group_command(
    access: CommandAccess,
    actor_id: serenity::UserId,
    owner_id: serenity::UserId,
    trusted: &HashSet<serenity::UserId>,
    blocked: &HashSet<serenity::UserId>,
) -> bool {
    if actor_id == owner_id {
        return true;
    }

    match access {
        CommandAccess::Anyone => !blocked.contains(&actor_id),
        CommandAccess::Trusted => trusted.contains(&actor_id),
        CommandAccess::Owner => false,
    }
}
