use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::CheckpointId;

/// Checkpoint - immutable reference data
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub code: String,
    pub name: String,
}

impl Checkpoint {
    /// Find a checkpoint by ID.
    pub async fn find_by_id(id: CheckpointId, pool: &PgPool) -> Result<Option<Self>> {
        let checkpoint = sqlx::query_as::<_, Checkpoint>("SELECT * FROM checkpoints WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(checkpoint)
    }

    /// Of the given ids, those that actually exist.
    pub async fn existing_ids(ids: &[CheckpointId], pool: &PgPool) -> Result<Vec<CheckpointId>> {
        let existing = sqlx::query_scalar::<_, CheckpointId>(
            "SELECT id FROM checkpoints WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;
        Ok(existing)
    }

    /// All checkpoints, by id.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let checkpoints =
            sqlx::query_as::<_, Checkpoint>("SELECT * FROM checkpoints ORDER BY id")
                .fetch_all(pool)
                .await?;
        Ok(checkpoints)
    }

    /// Insert a checkpoint (seed/test data).
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let checkpoint = sqlx::query_as::<_, Checkpoint>(
            r#"
            INSERT INTO checkpoints (id, code, name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.code)
        .bind(&self.name)
        .fetch_one(pool)
        .await?;
        Ok(checkpoint)
    }
}
