use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::auth::KPP_ROLE_PREFIX;
use crate::common::{CheckpointId, DepartmentId, Principal, UserId};

/// Staff user - SQL persistence layer
///
/// Owned by the external identity process; this core only reads users, to
/// authenticate-adjacent data (role code, department) and to resolve
/// notification recipients.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub role_code: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Find a user by ID.
    pub async fn find_by_id(id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// All active holders of a role code (stage-authority notification
    /// fan-out).
    pub async fn find_active_by_role_code(role_code: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role_code = $1 AND active = true ORDER BY created_at",
        )
        .bind(role_code)
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    /// Active operators of one checkpoint (`KPP-<id>` role code).
    pub async fn find_active_checkpoint_operators(
        checkpoint_id: CheckpointId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let code = format!("{}{}", KPP_ROLE_PREFIX, checkpoint_id);
        Self::find_active_by_role_code(&code, pool).await
    }

    /// Insert a user (seed/test data; production users come from the identity
    /// process).
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, full_name, role_code, department_id, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.username)
        .bind(&self.full_name)
        .bind(&self.role_code)
        .bind(self.department_id)
        .bind(self.active)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    /// Resolve this user into an authenticated principal.
    pub fn principal(&self) -> Principal {
        Principal::new(
            self.id,
            self.role_code.as_deref(),
            self.department_id,
            self.active,
        )
    }
}
