use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{ApprovalId, RequestId, Stage, UserId};

/// Verdict of one approval action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "approval_verdict", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalVerdict {
    Approved,
    Declined,
}

/// Approval history row - one per approve/decline action, bulk or
/// per-person. Append-only; cascades with the request.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Approval {
    pub id: ApprovalId,
    pub request_id: RequestId,
    pub approver_id: UserId,
    pub stage: Stage,
    pub verdict: ApprovalVerdict,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Approval {
    /// Append a history row inside the acting transaction.
    pub async fn record(
        request_id: RequestId,
        approver_id: UserId,
        stage: Stage,
        verdict: ApprovalVerdict,
        comment: Option<&str>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let approval = sqlx::query_as::<_, Approval>(
            r#"
            INSERT INTO approvals (id, request_id, approver_id, stage, verdict, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(ApprovalId::new())
        .bind(request_id)
        .bind(approver_id)
        .bind(stage)
        .bind(verdict)
        .bind(comment)
        .fetch_one(conn)
        .await?;
        Ok(approval)
    }

    /// Decision history of a request, oldest first.
    pub async fn find_by_request(request_id: RequestId, pool: &PgPool) -> Result<Vec<Self>> {
        let approvals = sqlx::query_as::<_, Approval>(
            "SELECT * FROM approvals WHERE request_id = $1 ORDER BY created_at, id",
        )
        .bind(request_id)
        .fetch_all(pool)
        .await?;
        Ok(approvals)
    }
}
