pub mod channel_name;
pub mod event_manager;
pub mod gateway;
pub mod help;
pub mod lifecycle;
pub mod localization;
pub mod ownership;
pub mod permissions;
pub mod platforms;
pub mod preferences;
pub mod relations;
pub mod room_locks;
pub mod rooms;
