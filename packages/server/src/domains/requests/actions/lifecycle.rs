//! Post-approval lifecycle: checkpoint check-in (which issues the pass),
//! closing, and early deletion.

use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use crate::common::{DomainError, PersonId, Principal, RequestId, Role};
use crate::domains::audit::{actions as audit_actions, entities, AuditEvent};
use crate::domains::requests::models::{PersonStatus, Request, RequestPerson, RequestStatus};

/// Record a visitor's entry at a checkpoint.
///
/// Only an admin or an operator of one of the request's target checkpoints
/// may check a visitor in; the visitor must be AS-approved and not already
/// inside. The first check-in moves the request from APPROVED_AS to ISSUED.
pub async fn check_in_person(
    person_id: PersonId,
    principal: &Principal,
    pool: &PgPool,
) -> Result<RequestPerson, DomainError> {
    if !principal.active {
        return Err(DomainError::Forbidden("principal is inactive".to_string()));
    }
    let operator_checkpoint = match principal.role {
        Role::Admin => None,
        Role::CheckpointOperator(checkpoint_id) => Some(checkpoint_id),
        _ => {
            return Err(DomainError::Forbidden(
                "role may not register visitor entries".to_string(),
            ))
        }
    };

    let person = RequestPerson::find_by_id(person_id, pool)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;

    let mut tx = pool.begin().await.map_err(DomainError::Database)?;

    let request = Request::find_by_id_for_update(person.request_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;

    if !request.status.is_admissible() {
        return Err(DomainError::InvalidState(format!(
            "request is {}, not admissible at a checkpoint",
            request.status
        )));
    }
    if let Some(checkpoint_id) = operator_checkpoint {
        let targets = Request::checkpoint_ids(request.id, &mut tx)
            .await
            .map_err(DomainError::Internal)?;
        if !targets.contains(&checkpoint_id) {
            return Err(DomainError::Forbidden(
                "request does not target this checkpoint".to_string(),
            ));
        }
    }

    let person = RequestPerson::find_by_id_in_tx(person_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;
    if person.status != PersonStatus::ApprovedAs {
        return Err(DomainError::InvalidState(format!(
            "visitor is {}, not approved for entry",
            person.status
        )));
    }
    if person.entered_at.is_some() {
        return Err(DomainError::InvalidState(
            "visitor already checked in".to_string(),
        ));
    }

    let entered_at = Utc::now();
    let updated = RequestPerson::set_entered(person_id, entered_at, &mut tx)
        .await
        .map_err(DomainError::Internal)?;

    AuditEvent::record(
        Some(principal.id),
        entities::REQUEST_PERSON,
        &person_id.to_string(),
        audit_actions::CHECK_IN,
        Some(json!({ "request_id": request.id, "entered_at": entered_at })),
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    if request.status == RequestStatus::ApprovedAs {
        Request::update_status(request.id, RequestStatus::Issued, &mut tx)
            .await
            .map_err(DomainError::Internal)?;
        AuditEvent::record(
            Some(principal.id),
            entities::REQUEST,
            &request.id.to_string(),
            audit_actions::STATUS_CHANGED,
            Some(json!({ "from": request.status, "to": RequestStatus::Issued })),
            &mut tx,
        )
        .await
        .map_err(DomainError::Internal)?;
    }

    tx.commit().await.map_err(DomainError::Database)?;

    info!(
        person_id = %person_id,
        request_id = %request.id,
        actor_id = %principal.id,
        "Visitor checked in"
    );
    Ok(updated)
}

/// Close a finished pass. Only the creator or an admin, and only once the
/// request has been approved (possibly issued).
pub async fn close_request(
    request_id: RequestId,
    principal: &Principal,
    pool: &PgPool,
) -> Result<Request, DomainError> {
    if !principal.active {
        return Err(DomainError::Forbidden("principal is inactive".to_string()));
    }

    let mut tx = pool.begin().await.map_err(DomainError::Database)?;

    let request = Request::find_by_id_for_update(request_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;

    if principal.role != Role::Admin && request.creator_id != principal.id {
        return Err(DomainError::Forbidden(
            "only the creator or an admin may close a request".to_string(),
        ));
    }
    if !request.status.is_admissible() {
        return Err(DomainError::InvalidState(format!(
            "request is {}, only approved or issued requests close",
            request.status
        )));
    }

    let request = Request::update_status(request_id, RequestStatus::Closed, &mut tx)
        .await
        .map_err(DomainError::Internal)?;

    AuditEvent::record(
        Some(principal.id),
        entities::REQUEST,
        &request_id.to_string(),
        audit_actions::CLOSE,
        None,
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    tx.commit().await.map_err(DomainError::Database)?;

    info!(request_id = %request_id, actor_id = %principal.id, "Request closed");
    Ok(request)
}

/// Delete a request that is still fully undecided. Visitor entries,
/// checkpoint links and approval history cascade with the row.
pub async fn delete_request(
    request_id: RequestId,
    principal: &Principal,
    pool: &PgPool,
) -> Result<(), DomainError> {
    if !principal.active {
        return Err(DomainError::Forbidden("principal is inactive".to_string()));
    }

    let mut tx = pool.begin().await.map_err(DomainError::Database)?;

    let request = Request::find_by_id_for_update(request_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;

    if principal.role != Role::Admin && request.creator_id != principal.id {
        return Err(DomainError::Forbidden(
            "only the creator or an admin may delete a request".to_string(),
        ));
    }
    if !request.status.is_pending() {
        return Err(DomainError::InvalidState(format!(
            "request is {}, only pending requests can be deleted",
            request.status
        )));
    }
    let persons = RequestPerson::find_by_request(request_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?;
    if persons
        .iter()
        .any(|p| p.status != PersonStatus::PendingUsb && p.status != PersonStatus::PendingAs)
    {
        return Err(DomainError::InvalidState(
            "some visitor entries were already decided".to_string(),
        ));
    }

    Request::delete(request_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?;

    AuditEvent::record(
        Some(principal.id),
        entities::REQUEST,
        &request_id.to_string(),
        audit_actions::DELETE,
        Some(json!({ "status": request.status, "persons": persons.len() })),
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    tx.commit().await.map_err(DomainError::Database)?;

    info!(request_id = %request_id, actor_id = %principal.id, "Request deleted");
    Ok(())
}
