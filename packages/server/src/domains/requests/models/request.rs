use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{CheckpointId, DepartmentId, DurationClass, RequestId, UserId};

use super::status::RequestStatus;

/// Pass request - SQL persistence layer
///
/// Created fully routed (no draft step); its status is owned by the approval
/// workflow from then on.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Request {
    pub id: RequestId,
    pub creator_id: UserId,
    pub duration: DurationClass,
    pub purpose: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional listing filters, applied after the visibility scope.
#[derive(Debug, Clone, Default)]
pub struct RequestFilters {
    pub status: Option<RequestStatus>,
    pub duration: Option<DurationClass>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl RequestFilters {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(100)
    }

    fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }
}

impl Request {
    /// Insert a new request (inside the creation transaction).
    pub async fn insert(&self, conn: &mut PgConnection) -> Result<Self> {
        let request = sqlx::query_as::<_, Request>(
            r#"
            INSERT INTO requests (id, creator_id, duration, purpose, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.creator_id)
        .bind(self.duration)
        .bind(&self.purpose)
        .bind(self.start_date)
        .bind(self.end_date)
        .bind(self.status)
        .fetch_one(conn)
        .await?;
        Ok(request)
    }

    /// Find a request by ID.
    pub async fn find_by_id(id: RequestId, pool: &PgPool) -> Result<Option<Self>> {
        let request = sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(request)
    }

    /// Find a request by ID and take a row lock for the rest of the
    /// transaction. Every person-mutation-plus-finalization sequence and
    /// every bulk action must go through this: concurrent approvals on one
    /// request race on the aggregate status otherwise.
    pub async fn find_by_id_for_update(
        id: RequestId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let request =
            sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(conn)
                .await?;
        Ok(request)
    }

    /// Update the request status.
    pub async fn update_status(
        id: RequestId,
        status: RequestStatus,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let request = sqlx::query_as::<_, Request>(
            r#"
            UPDATE requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_one(conn)
        .await?;
        Ok(request)
    }

    /// Link the request to its target checkpoints.
    pub async fn link_checkpoints(
        id: RequestId,
        checkpoint_ids: &[CheckpointId],
        conn: &mut PgConnection,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO request_checkpoints (request_id, checkpoint_id)
            SELECT $1, checkpoint_id FROM UNNEST($2::int4[]) AS t(checkpoint_id)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(checkpoint_ids)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Target checkpoint ids of a request.
    pub async fn checkpoint_ids(id: RequestId, conn: &mut PgConnection) -> Result<Vec<CheckpointId>> {
        let ids = sqlx::query_scalar::<_, CheckpointId>(
            "SELECT checkpoint_id FROM request_checkpoints WHERE request_id = $1 ORDER BY checkpoint_id",
        )
        .bind(id)
        .fetch_all(conn)
        .await?;
        Ok(ids)
    }

    /// Same as [`checkpoint_ids`](Self::checkpoint_ids), for read paths
    /// outside a transaction.
    pub async fn checkpoint_ids_on_pool(
        id: RequestId,
        pool: &PgPool,
    ) -> Result<Vec<CheckpointId>> {
        let ids = sqlx::query_scalar::<_, CheckpointId>(
            "SELECT checkpoint_id FROM request_checkpoints WHERE request_id = $1 ORDER BY checkpoint_id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }

    /// Delete a request; persons, checkpoint links and approval history
    /// cascade.
    pub async fn delete(id: RequestId, conn: &mut PgConnection) -> Result<()> {
        sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Count distinct prior SHORT_TERM requests containing a given national
    /// ID since `since` (the 30-day rate-limit window).
    pub async fn count_recent_short_term_by_iin(
        iin: &str,
        since: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT r.id)
            FROM requests r
            JOIN request_persons p ON p.request_id = r.id
            WHERE p.iin = $1
              AND r.duration = 'SHORT_TERM'
              AND r.created_at >= $2
            "#,
        )
        .bind(iin)
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    // =========================================================================
    // Listing - one query per visibility scope
    // =========================================================================

    /// List without scope restriction (admin and stage authorities).
    pub async fn list_all(filters: &RequestFilters, pool: &PgPool) -> Result<Vec<Self>> {
        let requests = sqlx::query_as::<_, Request>(
            r#"
            SELECT * FROM requests
            WHERE ($1::request_status IS NULL OR status = $1)
              AND ($2::duration_class IS NULL OR duration = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filters.status)
        .bind(filters.duration)
        .bind(filters.limit())
        .bind(filters.offset())
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }

    /// List requests created by one principal.
    pub async fn list_by_creator(
        creator_id: UserId,
        filters: &RequestFilters,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let requests = sqlx::query_as::<_, Request>(
            r#"
            SELECT * FROM requests
            WHERE creator_id = $1
              AND ($2::request_status IS NULL OR status = $2)
              AND ($3::duration_class IS NULL OR duration = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(creator_id)
        .bind(filters.status)
        .bind(filters.duration)
        .bind(filters.limit())
        .bind(filters.offset())
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }

    /// List requests whose creator belongs to one of the given departments
    /// (manager subtree scope).
    pub async fn list_by_creator_departments(
        department_ids: &[DepartmentId],
        filters: &RequestFilters,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let requests = sqlx::query_as::<_, Request>(
            r#"
            SELECT r.* FROM requests r
            JOIN users u ON u.id = r.creator_id
            WHERE u.department_id = ANY($1)
              AND ($2::request_status IS NULL OR r.status = $2)
              AND ($3::duration_class IS NULL OR r.duration = $3)
            ORDER BY r.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(department_ids)
        .bind(filters.status)
        .bind(filters.duration)
        .bind(filters.limit())
        .bind(filters.offset())
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }

    /// List admissible requests targeting one checkpoint (operator scope).
    /// The allowed-status set is fixed: operators only ever see passes they
    /// can act on at the gate.
    pub async fn list_by_checkpoint(
        checkpoint_id: CheckpointId,
        filters: &RequestFilters,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let requests = sqlx::query_as::<_, Request>(
            r#"
            SELECT r.* FROM requests r
            JOIN request_checkpoints rc ON rc.request_id = r.id
            WHERE rc.checkpoint_id = $1
              AND r.status IN ('APPROVED_AS', 'ISSUED')
              AND ($2::request_status IS NULL OR r.status = $2)
              AND ($3::duration_class IS NULL OR r.duration = $3)
            ORDER BY r.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(checkpoint_id)
        .bind(filters.status)
        .bind(filters.duration)
        .bind(filters.limit())
        .bind(filters.offset())
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }
}
