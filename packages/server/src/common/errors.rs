use thiserror::Error;

/// Domain errors surfaced by the workflow entry points.
///
/// Validation and authorization failures are rejected synchronously with no
/// state change. Read paths return `NotFound` both when the resource is
/// missing and when the principal may not see it, so existence is not leaked.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Visitor '{full_name}' matches an active blacklist entry")]
    Blacklisted { full_name: String },

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Role is not authorized to create a {duration} request")]
    ForbiddenDuration { duration: String },

    #[error("Invalid request state for this action: {0}")]
    InvalidState(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Identity '{iin}' exceeds the short-term request limit")]
    RateLimited { iin: String },

    #[error("Unknown checkpoint: {0}")]
    UnknownCheckpoint(i32),

    #[error("A decline reason is required")]
    MissingReason,

    #[error("Resource not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
