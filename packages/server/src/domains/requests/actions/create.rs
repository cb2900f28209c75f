//! Request creation: authorization gate, blacklist screen, routing, and the
//! transactional persist with its audit/notification side effects.

use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::common::auth::{can_create_request, AS_ROLE_CODE, USB_ROLE_CODE};
use crate::common::{
    CheckpointId, DomainError, DurationClass, NationalityClass, PersonId, Principal, RequestId,
    Stage,
};
use crate::domains::audit::{actions as audit_actions, entities, AuditEvent};
use crate::domains::blacklist::models::BlacklistEntry;
use crate::domains::checkpoints::models::Checkpoint;
use crate::domains::notifications::models::Notification;
use crate::domains::requests::machines;
use crate::domains::requests::models::{Request, RequestPerson};
use crate::domains::users::models::User;

/// Window of the short-term per-identity rate limit.
const RATE_LIMIT_WINDOW_DAYS: i64 = 30;
/// Prior short-term requests allowed per identity inside the window.
const RATE_LIMIT_MAX_PRIOR: i64 = 2;

/// One visitor entry of a request draft.
#[derive(Debug, Clone)]
pub struct PersonDraft {
    pub full_name: String,
    pub doc_number: Option<String>,
    pub iin: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: NationalityClass,
}

/// A pass request as submitted by its creator. Creation routes and submits in
/// one step; there is no separate draft state.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub duration: DurationClass,
    pub purpose: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub checkpoint_ids: Vec<CheckpointId>,
    pub persons: Vec<PersonDraft>,
}

/// Create, screen and route a new pass request.
///
/// On any precondition failure nothing is persisted; the blacklist case
/// additionally leaves a CREATE_FAIL audit event.
pub async fn create_request(
    principal: &Principal,
    draft: RequestDraft,
    pool: &PgPool,
) -> Result<Request, DomainError> {
    if !principal.active {
        return Err(DomainError::Forbidden("principal is inactive".to_string()));
    }
    if !can_create_request(principal.role, draft.duration) {
        return Err(DomainError::ForbiddenDuration {
            duration: draft.duration.to_string(),
        });
    }
    if draft.persons.is_empty() {
        return Err(DomainError::Validation(
            "a request needs at least one visitor".to_string(),
        ));
    }
    if draft.persons.iter().any(|p| p.full_name.trim().is_empty()) {
        return Err(DomainError::Validation(
            "every visitor needs a name".to_string(),
        ));
    }
    if draft.checkpoint_ids.is_empty() {
        return Err(DomainError::Validation(
            "a request needs at least one target checkpoint".to_string(),
        ));
    }

    let existing = Checkpoint::existing_ids(&draft.checkpoint_ids, pool)
        .await
        .map_err(DomainError::Internal)?;
    if let Some(missing) = draft
        .checkpoint_ids
        .iter()
        .copied()
        .find(|id| !existing.contains(id))
    {
        return Err(DomainError::UnknownCheckpoint(missing));
    }

    if draft.duration == DurationClass::ShortTerm {
        validate_short_term_window(&draft)?;
        enforce_rate_limit(&draft, pool).await?;
    }

    // Blacklist screen runs before anything is written; a hit aborts the
    // whole request, not just the matching visitor.
    let request_id = RequestId::new();
    for person in &draft.persons {
        let hit = BlacklistEntry::screen(
            &person.full_name,
            person.doc_number.as_deref(),
            person.iin.as_deref(),
            pool,
        )
        .await
        .map_err(DomainError::Internal)?;

        if let Some(entry) = hit {
            warn!(
                request_id = %request_id,
                entry_id = %entry.id,
                creator_id = %principal.id,
                "Pass request rejected by blacklist screen"
            );
            let mut conn = pool.acquire().await.map_err(DomainError::Database)?;
            AuditEvent::record(
                Some(principal.id),
                entities::REQUEST,
                &request_id.to_string(),
                audit_actions::CREATE_FAIL,
                Some(json!({
                    "reason": "BLACKLISTED",
                    "full_name": person.full_name,
                    "blacklist_entry_id": entry.id,
                })),
                &mut conn,
            )
            .await
            .map_err(DomainError::Internal)?;
            return Err(DomainError::Blacklisted {
                full_name: person.full_name.clone(),
            });
        }
    }

    // Routing decides which authority sees the request first.
    let nationalities: Vec<NationalityClass> =
        draft.persons.iter().map(|p| p.nationality).collect();
    let stage = machines::route(draft.duration, &nationalities);
    let (request_status, person_status) = machines::initial_statuses(stage);

    let mut tx = pool.begin().await.map_err(DomainError::Database)?;

    let now = Utc::now();
    let request = Request {
        id: request_id,
        creator_id: principal.id,
        duration: draft.duration,
        purpose: draft.purpose.clone(),
        start_date: draft.start_date,
        end_date: draft.end_date,
        status: request_status,
        created_at: now,
        updated_at: now,
    }
    .insert(&mut tx)
    .await
    .map_err(DomainError::Internal)?;

    for person in &draft.persons {
        RequestPerson {
            id: PersonId::new(),
            request_id,
            full_name: person.full_name.trim().to_string(),
            doc_number: person.doc_number.clone(),
            iin: person.iin.clone(),
            birth_date: person.birth_date,
            nationality: person.nationality,
            status: person_status,
            rejection_reason: None,
            entered_at: None,
            created_at: now,
        }
        .insert(&mut tx)
        .await
        .map_err(DomainError::Internal)?;
    }

    Request::link_checkpoints(request_id, &draft.checkpoint_ids, &mut tx)
        .await
        .map_err(DomainError::Internal)?;

    AuditEvent::record(
        Some(principal.id),
        entities::REQUEST,
        &request_id.to_string(),
        audit_actions::CREATE_AND_SUBMIT,
        Some(json!({
            "status": request_status,
            "duration": draft.duration,
            "persons": draft.persons.len(),
            "checkpoints": draft.checkpoint_ids,
        })),
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    // One intent per active holder of the routed-to authority role.
    let authority_code = match stage {
        Stage::Usb => USB_ROLE_CODE,
        Stage::As => AS_ROLE_CODE,
    };
    let recipients = User::find_active_by_role_code(authority_code, pool)
        .await
        .map_err(DomainError::Internal)?;
    let recipient_ids: Vec<_> = recipients.iter().map(|u| u.id).collect();
    Notification::enqueue_many(
        &recipient_ids,
        &format!("Pass request {} awaits {} review", request_id, stage),
        Some(request_id),
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    tx.commit().await.map_err(DomainError::Database)?;

    info!(
        request_id = %request_id,
        creator_id = %principal.id,
        status = %request_status,
        persons = draft.persons.len(),
        "Pass request created and routed"
    );

    Ok(request)
}

fn validate_short_term_window(draft: &RequestDraft) -> Result<(), DomainError> {
    let (start, end) = match (draft.start_date, draft.end_date) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(DomainError::InvalidDateRange(
                "short-term requests need start and end dates".to_string(),
            ))
        }
    };
    if end < start {
        return Err(DomainError::InvalidDateRange(
            "end date precedes start date".to_string(),
        ));
    }
    if (end - start).num_days() > 1 {
        return Err(DomainError::InvalidDateRange(
            "span exceeds one day; use a long-term request".to_string(),
        ));
    }
    Ok(())
}

async fn enforce_rate_limit(draft: &RequestDraft, pool: &PgPool) -> Result<(), DomainError> {
    let since = Utc::now() - Duration::days(RATE_LIMIT_WINDOW_DAYS);
    let mut seen: HashSet<&str> = HashSet::new();
    for person in &draft.persons {
        let Some(iin) = person.iin.as_deref() else {
            continue;
        };
        if !seen.insert(iin) {
            continue;
        }
        let prior = Request::count_recent_short_term_by_iin(iin, since, pool)
            .await
            .map_err(DomainError::Internal)?;
        if prior >= RATE_LIMIT_MAX_PRIOR {
            return Err(DomainError::RateLimited {
                iin: iin.to_string(),
            });
        }
    }
    Ok(())
}
