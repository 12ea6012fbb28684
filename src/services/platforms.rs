use crate::db::entities::platform_roles::Platform;
use poise::serenity_prelude as serenity;
use std::collections::HashSet;

/// Platform for a new room: the owner's last choice, otherwise the single
/// platform implied by their roles. Ambiguous or missing role matches leave
/// it unset.
pub fn resolve_platform(
    last_used: Option<Platform>,
    associations: &[(serenity::RoleId, Platform)],
    member_roles: &[serenity::RoleId],
) -> Option<Platform> {
    last_used.or_else(|| infer_from_roles(associations, member_roles))
}

pub fn infer_from_roles(
    associations: &[(serenity::RoleId, Platform)],
    member_roles: &[serenity::RoleId],
) -> Option<Platform> {
    let matches: HashSet<Platform> = associations
        .iter()
        .filter(|(role_id, _)| member_roles.contains(role_id))
        .map(|(_, platform)| *platform)
        .collect();

    if matches.len() == 1 {
        matches.into_iter().next()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: u64) -> serenity::RoleId {
        serenity::RoleId::new(id)
    }

    fn associations() -> Vec<(serenity::RoleId, Platform)> {
        vec![
            (role(1), Platform::Steam),
            (role(2), Platform::Xbox),
            (role(3), Platform::Steam),
        ]
    }

    #[test]
    fn last_used_wins() {
        assert_eq!(
            resolve_platform(Some(Platform::Switch), &associations(), &[role(2)]),
            Some(Platform::Switch)
        );
    }

    #[test]
    fn single_match_is_inferred() {
        assert_eq!(
            resolve_platform(None, &associations(), &[role(2), role(99)]),
            Some(Platform::Xbox)
        );
        // Two roles, same platform: still unambiguous.
        assert_eq!(
            infer_from_roles(&associations(), &[role(1), role(3)]),
            Some(Platform::Steam)
        );
    }

    #[test]
    fn ambiguity_is_never_guessed() {
        assert_eq!(infer_from_roles(&associations(), &[role(1), role(2)]), None);
        assert_eq!(infer_from_roles(&associations(), &[role(42)]), None);
        assert_eq!(infer_from_roles(&[], &[role(1)]), None);
    }
}
