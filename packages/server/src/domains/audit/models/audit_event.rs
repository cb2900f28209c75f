use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};

use crate::common::{AuditEventId, UserId};

/// Audit event - append-only, one row per mutating operation
///
/// `actor_id` is NULL for system-originated actions. `entity_id` is stored as
/// text so any entity's key fits.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub actor_id: Option<UserId>,
    pub entity: String,
    pub entity_id: String,
    pub action: String,
    pub data: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Append an audit event inside the acting transaction.
    pub async fn record(
        actor_id: Option<UserId>,
        entity: &str,
        entity_id: &str,
        action: &str,
        data: Option<JsonValue>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let event = sqlx::query_as::<_, AuditEvent>(
            r#"
            INSERT INTO audit_log (id, actor_id, entity, entity_id, action, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(AuditEventId::new())
        .bind(actor_id)
        .bind(entity)
        .bind(entity_id)
        .bind(action)
        .bind(data)
        .fetch_one(conn)
        .await?;
        Ok(event)
    }

    /// Events for one entity, oldest first.
    pub async fn find_by_entity(
        entity: &str,
        entity_id: &str,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let events = sqlx::query_as::<_, AuditEvent>(
            r#"
            SELECT * FROM audit_log
            WHERE entity = $1 AND entity_id = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(entity)
        .bind(entity_id)
        .fetch_all(pool)
        .await?;
        Ok(events)
    }
}
