use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{NationalityClass, PersonId, RequestId};

use super::status::PersonStatus;

/// Visitor entry of a pass request - SQL persistence layer
///
/// Lives and dies with its request; only the approval workflow moves its
/// status.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RequestPerson {
    pub id: PersonId,
    pub request_id: RequestId,
    pub full_name: String,
    pub doc_number: Option<String>,
    pub iin: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: NationalityClass,
    pub status: PersonStatus,
    pub rejection_reason: Option<String>,
    pub entered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RequestPerson {
    /// Insert a new visitor entry (inside the creation transaction).
    pub async fn insert(&self, conn: &mut PgConnection) -> Result<Self> {
        let person = sqlx::query_as::<_, RequestPerson>(
            r#"
            INSERT INTO request_persons (
                id, request_id, full_name, doc_number, iin, birth_date,
                nationality, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.request_id)
        .bind(&self.full_name)
        .bind(&self.doc_number)
        .bind(&self.iin)
        .bind(self.birth_date)
        .bind(self.nationality)
        .bind(self.status)
        .fetch_one(conn)
        .await?;
        Ok(person)
    }

    /// Find a visitor entry by ID.
    pub async fn find_by_id(id: PersonId, pool: &PgPool) -> Result<Option<Self>> {
        let person =
            sqlx::query_as::<_, RequestPerson>("SELECT * FROM request_persons WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(person)
    }

    /// Reload a visitor entry inside a transaction (after the request row is
    /// locked).
    pub async fn find_by_id_in_tx(id: PersonId, conn: &mut PgConnection) -> Result<Option<Self>> {
        let person =
            sqlx::query_as::<_, RequestPerson>("SELECT * FROM request_persons WHERE id = $1")
                .bind(id)
                .fetch_optional(conn)
                .await?;
        Ok(person)
    }

    /// All visitor entries of a request, in submission order (v7 ids are
    /// time-ordered).
    pub async fn find_by_request(
        request_id: RequestId,
        conn: &mut PgConnection,
    ) -> Result<Vec<Self>> {
        let persons = sqlx::query_as::<_, RequestPerson>(
            "SELECT * FROM request_persons WHERE request_id = $1 ORDER BY id",
        )
        .bind(request_id)
        .fetch_all(conn)
        .await?;
        Ok(persons)
    }

    /// Same as [`find_by_request`], for read paths outside a transaction.
    pub async fn find_by_request_on_pool(
        request_id: RequestId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let persons = sqlx::query_as::<_, RequestPerson>(
            "SELECT * FROM request_persons WHERE request_id = $1 ORDER BY id",
        )
        .bind(request_id)
        .fetch_all(pool)
        .await?;
        Ok(persons)
    }

    /// Move one visitor entry to a new status. The rejection reason is set on
    /// declines and cleared on approvals.
    pub async fn update_status(
        id: PersonId,
        status: PersonStatus,
        rejection_reason: Option<&str>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let person = sqlx::query_as::<_, RequestPerson>(
            r#"
            UPDATE request_persons
            SET status = $2, rejection_reason = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(rejection_reason)
        .fetch_one(conn)
        .await?;
        Ok(person)
    }

    /// Record a checkpoint check-in.
    pub async fn set_entered(
        id: PersonId,
        entered_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let person = sqlx::query_as::<_, RequestPerson>(
            r#"
            UPDATE request_persons
            SET entered_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entered_at)
        .fetch_one(conn)
        .await?;
        Ok(person)
    }
}
