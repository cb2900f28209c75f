//! Blacklist administration actions.
//!
//! Entry management is restricted to the admin and both stage authorities.
//! Screening itself happens inside request creation; see
//! `domains::requests::actions`.

use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use crate::common::auth::can_manage_blacklist;
use crate::common::{BlacklistEntryId, DomainError, Principal};
use crate::domains::audit::{actions as audit_actions, entities, AuditEvent};

use super::models::BlacklistEntry;

/// Fields of a new blacklist entry.
#[derive(Debug, Clone)]
pub struct NewBlacklistEntry {
    pub full_name: String,
    pub doc_number: Option<String>,
    pub iin: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

fn ensure_manager(principal: &Principal) -> Result<(), DomainError> {
    if !principal.active {
        return Err(DomainError::Forbidden("principal is inactive".to_string()));
    }
    if !can_manage_blacklist(principal.role) {
        return Err(DomainError::Forbidden(
            "role may not manage the blacklist".to_string(),
        ));
    }
    Ok(())
}

/// Add an active blacklist entry.
pub async fn add_entry(
    principal: &Principal,
    new_entry: NewBlacklistEntry,
    pool: &PgPool,
) -> Result<BlacklistEntry, DomainError> {
    ensure_manager(principal)?;

    if new_entry.full_name.trim().is_empty() {
        return Err(DomainError::Validation("full name is required".to_string()));
    }

    let mut tx = pool.begin().await.map_err(DomainError::Database)?;

    let entry = BlacklistEntry::insert(
        &new_entry.full_name,
        new_entry.doc_number.as_deref(),
        new_entry.iin.as_deref(),
        new_entry.birth_date,
        new_entry.reason.as_deref(),
        principal.id,
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    AuditEvent::record(
        Some(principal.id),
        entities::BLACKLIST_ENTRY,
        &entry.id.to_string(),
        audit_actions::BLACKLIST_ADD,
        Some(json!({ "full_name": entry.full_name })),
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    tx.commit().await.map_err(DomainError::Database)?;

    info!(entry_id = %entry.id, actor_id = %principal.id, "Blacklist entry added");
    Ok(entry)
}

/// Deactivate an entry so it stops screening.
pub async fn deactivate_entry(
    principal: &Principal,
    entry_id: BlacklistEntryId,
    pool: &PgPool,
) -> Result<BlacklistEntry, DomainError> {
    ensure_manager(principal)?;

    let mut tx = pool.begin().await.map_err(DomainError::Database)?;

    let entry = BlacklistEntry::deactivate(entry_id, principal.id, &mut tx)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;

    AuditEvent::record(
        Some(principal.id),
        entities::BLACKLIST_ENTRY,
        &entry.id.to_string(),
        audit_actions::BLACKLIST_REMOVE,
        None,
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;
    tx.commit().await.map_err(DomainError::Database)?;

    info!(entry_id = %entry.id, actor_id = %principal.id, "Blacklist entry deactivated");
    Ok(entry)
}

/// List all entries (active and inactive).
pub async fn list_entries(
    principal: &Principal,
    pool: &PgPool,
) -> Result<Vec<BlacklistEntry>, DomainError> {
    ensure_manager(principal)?;
    BlacklistEntry::find_all(pool)
        .await
        .map_err(DomainError::Internal)
}
