use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{BlacklistEntryId, UserId};

/// Lifecycle status of a blacklist entry; only ACTIVE entries screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "blacklist_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlacklistStatus {
    Active,
    Inactive,
}

/// Blacklist entry - SQL persistence layer
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlacklistEntry {
    pub id: BlacklistEntryId,
    pub full_name: String,
    pub doc_number: Option<String>,
    pub iin: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub status: BlacklistStatus,
    pub added_by: UserId,
    pub added_at: DateTime<Utc>,
    pub removed_by: Option<UserId>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl BlacklistEntry {
    /// Whether this entry matches a presented identity.
    ///
    /// The name is matched by the lookup query; a positive match additionally
    /// requires a shared strong identifier: same document number or same
    /// national ID. A visitor presenting neither identifier never matches.
    pub fn matches_identity(&self, doc_number: Option<&str>, iin: Option<&str>) -> bool {
        let doc_match = match (self.doc_number.as_deref(), doc_number) {
            (Some(ours), Some(theirs)) => ours.eq_ignore_ascii_case(theirs.trim()),
            _ => false,
        };
        let iin_match = match (self.iin.as_deref(), iin) {
            (Some(ours), Some(theirs)) => ours == theirs.trim(),
            _ => false,
        };
        doc_match || iin_match
    }

    /// Active entries for a name (case-insensitive).
    pub async fn find_active_by_name(full_name: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let entries = sqlx::query_as::<_, BlacklistEntry>(
            r#"
            SELECT * FROM blacklist
            WHERE status = 'ACTIVE' AND LOWER(full_name) = LOWER($1)
            "#,
        )
        .bind(full_name.trim())
        .fetch_all(pool)
        .await?;
        Ok(entries)
    }

    /// Screen a presented identity against the active blacklist. Returns the
    /// first matching entry, if any.
    pub async fn screen(
        full_name: &str,
        doc_number: Option<&str>,
        iin: Option<&str>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let candidates = Self::find_active_by_name(full_name, pool).await?;
        Ok(candidates
            .into_iter()
            .find(|entry| entry.matches_identity(doc_number, iin)))
    }

    /// Insert a new active entry (inside the acting transaction).
    pub async fn insert(
        full_name: &str,
        doc_number: Option<&str>,
        iin: Option<&str>,
        birth_date: Option<NaiveDate>,
        reason: Option<&str>,
        added_by: UserId,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let entry = sqlx::query_as::<_, BlacklistEntry>(
            r#"
            INSERT INTO blacklist (id, full_name, doc_number, iin, birth_date, reason, status, added_by)
            VALUES ($1, $2, $3, $4, $5, $6, 'ACTIVE', $7)
            RETURNING *
            "#,
        )
        .bind(BlacklistEntryId::new())
        .bind(full_name.trim())
        .bind(doc_number)
        .bind(iin)
        .bind(birth_date)
        .bind(reason)
        .bind(added_by)
        .fetch_one(conn)
        .await?;
        Ok(entry)
    }

    /// Deactivate an entry (inside the acting transaction); it stops
    /// screening immediately.
    pub async fn deactivate(
        id: BlacklistEntryId,
        removed_by: UserId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let entry = sqlx::query_as::<_, BlacklistEntry>(
            r#"
            UPDATE blacklist
            SET status = 'INACTIVE', removed_by = $2, removed_at = NOW()
            WHERE id = $1 AND status = 'ACTIVE'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(removed_by)
        .fetch_optional(conn)
        .await?;
        Ok(entry)
    }

    /// All entries, newest first.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let entries =
            sqlx::query_as::<_, BlacklistEntry>("SELECT * FROM blacklist ORDER BY added_at DESC")
                .fetch_all(pool)
                .await?;
        Ok(entries)
    }
}
