// Blacklist domain - creation-time screening plus entry administration

pub mod actions;
pub mod models;

pub use models::{BlacklistEntry, BlacklistStatus};
