use crate::db::entities::platform_roles::Platform;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Provider-side limit for channel names.
pub const MAX_NAME_LEN: usize = 100;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(USER|PLATFORM|BUILD)(?::-(.*?))?\}").unwrap());

/// Fills a creator channel's name template.
///
/// Supported placeholders: `{USER}`, `{PLATFORM}` and `{BUILD}`. The latter two
/// accept a fallback with `:-`, e.g. `{BUILD:-Farming}`, used when the value is
/// missing or empty.
pub fn format_room_name(
    template: &str,
    display_name: &str,
    platform: Option<Platform>,
    build: Option<&str>,
) -> String {
    let platform = platform.map(|p| p.short()).unwrap_or_default();
    let build = build.unwrap_or_default();

    // Single pass, so substituted text is never scanned for placeholders.
    let name = PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
        let value = match &caps[1] {
            "USER" => display_name,
            "PLATFORM" => platform,
            _ => build,
        };
        if !value.is_empty() {
            return value.to_string();
        }
        caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default()
    });

    truncate(name.trim())
}

fn truncate(name: &str) -> String {
    name.chars().take(MAX_NAME_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_every_placeholder() {
        let name = format_room_name(
            "{USER}'s {PLATFORM} Channel - {BUILD}",
            "Ada",
            Some(Platform::Ps5),
            Some("Farming"),
        );
        assert_eq!(name, "Ada's PS5 Channel - Farming");
    }

    #[test]
    fn falls_back_to_defaults_or_empty() {
        let template = "[{PLATFORM:-Any}] {USER} {BUILD:-Chill}{BUILD}";
        assert_eq!(format_room_name(template, "Bo", None, None), "[Any] Bo Chill");
        assert_eq!(format_room_name(template, "Bo", None, Some("")), "[Any] Bo Chill");
        assert_eq!(
            format_room_name(template, "Bo", Some(Platform::Steam), Some("PvP")),
            "[Steam] Bo PvPPvP"
        );
    }

    #[test]
    fn display_names_are_inserted_literally() {
        assert_eq!(format_room_name("{USER}", "$1 {BUILD}", None, None), "$1 {BUILD}");
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "x".repeat(150);
        assert_eq!(format_room_name("{USER}", &long, None, None).len(), MAX_NAME_LEN);
    }
}
