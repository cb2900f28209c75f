//! Recipient-facing notification actions.

use sqlx::PgPool;

use crate::common::{DomainError, NotificationId, Principal};

use super::models::Notification;

/// List the principal's own notifications.
pub async fn list_notifications(
    principal: &Principal,
    unread_only: bool,
    pool: &PgPool,
) -> Result<Vec<Notification>, DomainError> {
    Notification::find_for_user(principal.id, unread_only, pool)
        .await
        .map_err(DomainError::Internal)
}

/// Mark one of the principal's notifications read. Someone else's
/// notification looks exactly like a missing one.
pub async fn mark_notification_read(
    principal: &Principal,
    notification_id: NotificationId,
    pool: &PgPool,
) -> Result<Notification, DomainError> {
    Notification::mark_read(notification_id, principal.id, pool)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)
}

/// Mark all of the principal's notifications read.
pub async fn mark_all_read(principal: &Principal, pool: &PgPool) -> Result<u64, DomainError> {
    Notification::mark_all_read(principal.id, pool)
        .await
        .map_err(DomainError::Internal)
}
