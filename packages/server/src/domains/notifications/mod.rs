// Notifications domain - append-only intents, delivered elsewhere

pub mod actions;
pub mod models;

pub use models::Notification;
