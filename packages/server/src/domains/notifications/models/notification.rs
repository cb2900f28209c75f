use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{NotificationId, RequestId, UserId};

/// Notification intent - SQL persistence layer
///
/// The core only enqueues; delivery is someone else's job. The read flag
/// belongs to the recipient.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub message: String,
    pub related_request_id: Option<RequestId>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Enqueue one notification inside the acting transaction.
    pub async fn enqueue(
        user_id: UserId,
        message: &str,
        related_request_id: Option<RequestId>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, message, related_request_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(NotificationId::new())
        .bind(user_id)
        .bind(message)
        .bind(related_request_id)
        .fetch_one(conn)
        .await?;
        Ok(notification)
    }

    /// Enqueue the same message for many recipients.
    pub async fn enqueue_many(
        user_ids: &[UserId],
        message: &str,
        related_request_id: Option<RequestId>,
        conn: &mut PgConnection,
    ) -> Result<()> {
        for user_id in user_ids {
            Self::enqueue(*user_id, message, related_request_id, conn).await?;
        }
        Ok(())
    }

    /// A recipient's notifications, newest first.
    pub async fn find_for_user(
        user_id: UserId,
        unread_only: bool,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR is_read = false)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(pool)
        .await?;
        Ok(notifications)
    }

    /// Mark one notification read; only its recipient can.
    pub async fn mark_read(
        id: NotificationId,
        user_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = true
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(notification)
    }

    /// Mark all of a recipient's notifications read. Returns how many
    /// changed.
    pub async fn mark_all_read(user_id: UserId, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
