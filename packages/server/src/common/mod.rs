// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod errors;
pub mod id;
pub mod types;

pub use auth::{Principal, Role, Stage, Visibility};
pub use entity_ids::*;
pub use errors::DomainError;
pub use id::Id;
pub use types::*;
