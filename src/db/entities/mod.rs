pub mod creator_channels;
pub mod platform_roles;
pub mod staff_roles;
pub mod temp_channels;
pub mod user_blocks;
pub mod user_preferences;
pub mod user_rules;
pub mod user_trusts;
