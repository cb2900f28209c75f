//! Stage and person approval actions.
//!
//! Every mutation here runs in one transaction with the request row locked
//! FOR UPDATE, so concurrent decisions on one request serialize and the
//! finalization read-then-write cannot lose an update.

use serde_json::json;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::common::auth::{can_act_at_stage, AS_ROLE_CODE};
use crate::common::{DomainError, PersonId, Principal, RequestId, Role, Stage};
use crate::domains::audit::{actions as audit_actions, entities, AuditEvent};
use crate::domains::notifications::models::Notification;
use crate::domains::requests::machines;
use crate::domains::requests::models::{
    Approval, ApprovalVerdict, PersonStatus, Request, RequestPerson, RequestStatus,
};
use crate::domains::users::models::User;

/// Approve every reachable person of a request at `stage` in one step.
///
/// At USB this advances the request straight to PENDING_AS; the per-person
/// path ends at APPROVED_USB instead. Callers depend on the difference.
pub async fn approve_stage(
    stage: Stage,
    request_id: RequestId,
    principal: &Principal,
    pool: &PgPool,
) -> Result<Request, DomainError> {
    ensure_stage_actor(principal, stage)?;

    let mut tx = pool.begin().await.map_err(DomainError::Database)?;

    let request = Request::find_by_id_for_update(request_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;
    ensure_stage_allows(stage, request.status)?;

    let persons = RequestPerson::find_by_request(request_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?;
    let mut touched = 0usize;
    for person in &persons {
        if let Some(target) = machines::bulk_approve_target(stage, person.status) {
            RequestPerson::update_status(person.id, target, None, &mut tx)
                .await
                .map_err(DomainError::Internal)?;
            touched += 1;
        }
    }

    let new_status = machines::bulk_request_status(stage, true);
    let request = Request::update_status(request_id, new_status, &mut tx)
        .await
        .map_err(DomainError::Internal)?;

    Approval::record(
        request_id,
        principal.id,
        stage,
        ApprovalVerdict::Approved,
        None,
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    AuditEvent::record(
        Some(principal.id),
        entities::REQUEST,
        &request_id.to_string(),
        audit_actions::APPROVE_STAGE,
        Some(json!({ "stage": stage, "to": new_status, "persons_touched": touched })),
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    notify_status_change(&request, new_status, pool, &mut tx)
        .await
        .map_err(DomainError::Internal)?;

    tx.commit().await.map_err(DomainError::Database)?;

    info!(
        request_id = %request_id,
        stage = %stage,
        actor_id = %principal.id,
        status = %new_status,
        persons_touched = touched,
        "Stage approved"
    );
    Ok(request)
}

/// Decline a whole request at `stage`. Requires a reason; the request lands
/// in the stage's terminal declined status.
pub async fn decline_stage(
    stage: Stage,
    request_id: RequestId,
    principal: &Principal,
    reason: &str,
    pool: &PgPool,
) -> Result<Request, DomainError> {
    ensure_stage_actor(principal, stage)?;
    let reason = non_blank_reason(reason)?;

    let mut tx = pool.begin().await.map_err(DomainError::Database)?;

    let request = Request::find_by_id_for_update(request_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;
    ensure_stage_allows(stage, request.status)?;

    let persons = RequestPerson::find_by_request(request_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?;
    let mut touched = 0usize;
    for person in &persons {
        if let Some(target) = machines::bulk_decline_target(stage, person.status) {
            RequestPerson::update_status(person.id, target, Some(reason), &mut tx)
                .await
                .map_err(DomainError::Internal)?;
            touched += 1;
        }
    }

    let new_status = machines::bulk_request_status(stage, false);
    let request = Request::update_status(request_id, new_status, &mut tx)
        .await
        .map_err(DomainError::Internal)?;

    Approval::record(
        request_id,
        principal.id,
        stage,
        ApprovalVerdict::Declined,
        Some(reason),
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    AuditEvent::record(
        Some(principal.id),
        entities::REQUEST,
        &request_id.to_string(),
        audit_actions::DECLINE_STAGE,
        Some(json!({ "stage": stage, "to": new_status, "reason": reason })),
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    notify_status_change(&request, new_status, pool, &mut tx)
        .await
        .map_err(DomainError::Internal)?;

    tx.commit().await.map_err(DomainError::Database)?;

    info!(
        request_id = %request_id,
        stage = %stage,
        actor_id = %principal.id,
        status = %new_status,
        "Stage declined"
    );
    Ok(request)
}

/// Approve one visitor entry, then re-aggregate the request status.
pub async fn approve_person(
    person_id: PersonId,
    principal: &Principal,
    pool: &PgPool,
) -> Result<RequestPerson, DomainError> {
    decide_person(person_id, principal, None, pool).await
}

/// Reject one visitor entry (reason required), then re-aggregate.
pub async fn reject_person(
    person_id: PersonId,
    principal: &Principal,
    reason: &str,
    pool: &PgPool,
) -> Result<RequestPerson, DomainError> {
    let reason = non_blank_reason(reason)?;
    decide_person(person_id, principal, Some(reason), pool).await
}

/// Shared body of the individual decisions. `rejection_reason` is `None` for
/// approvals.
async fn decide_person(
    person_id: PersonId,
    principal: &Principal,
    rejection_reason: Option<&str>,
    pool: &PgPool,
) -> Result<RequestPerson, DomainError> {
    if !principal.active {
        return Err(DomainError::Forbidden("principal is inactive".to_string()));
    }

    let person = RequestPerson::find_by_id(person_id, pool)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;

    let mut tx = pool.begin().await.map_err(DomainError::Database)?;

    let request = Request::find_by_id_for_update(person.request_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;

    // Re-read under the lock; another decision may have landed in between.
    let person = RequestPerson::find_by_id_in_tx(person_id, &mut tx)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;

    let stage = match principal.role {
        Role::UsbOfficer => Stage::Usb,
        Role::AsOfficer => Stage::As,
        Role::Admin => machines::admin_stage_for(request.status),
        _ => {
            return Err(DomainError::Forbidden(
                "role may not decide visitor entries".to_string(),
            ))
        }
    };
    ensure_stage_allows(stage, request.status)?;
    if stage == Stage::As && person.status == PersonStatus::DeclinedUsb {
        return Err(DomainError::InvalidState(
            "person was declined at the USB stage".to_string(),
        ));
    }

    let approve = rejection_reason.is_none();
    let target = machines::person_decision_target(stage, approve);
    let updated = RequestPerson::update_status(person_id, target, rejection_reason, &mut tx)
        .await
        .map_err(DomainError::Internal)?;

    let verdict = if approve {
        ApprovalVerdict::Approved
    } else {
        ApprovalVerdict::Declined
    };
    Approval::record(
        request.id,
        principal.id,
        stage,
        verdict,
        rejection_reason,
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    let action = if approve {
        audit_actions::APPROVE_PERSON
    } else {
        audit_actions::REJECT_PERSON
    };
    AuditEvent::record(
        Some(principal.id),
        entities::REQUEST_PERSON,
        &person_id.to_string(),
        action,
        Some(json!({ "request_id": request.id, "stage": stage, "to": target })),
        &mut tx,
    )
    .await
    .map_err(DomainError::Internal)?;

    // Aggregate: derive the request status from the full person list.
    let persons = RequestPerson::find_by_request(request.id, &mut tx)
        .await
        .map_err(DomainError::Internal)?;
    let statuses: Vec<PersonStatus> = persons.iter().map(|p| p.status).collect();
    if let Some(new_status) = machines::finalize(stage, request.status, &statuses) {
        let old_status = request.status;
        let request = Request::update_status(request.id, new_status, &mut tx)
            .await
            .map_err(DomainError::Internal)?;
        AuditEvent::record(
            Some(principal.id),
            entities::REQUEST,
            &request.id.to_string(),
            audit_actions::STATUS_CHANGED,
            Some(json!({ "from": old_status, "to": new_status })),
            &mut tx,
        )
        .await
        .map_err(DomainError::Internal)?;
        notify_status_change(&request, new_status, pool, &mut tx)
            .await
            .map_err(DomainError::Internal)?;

        info!(
            request_id = %request.id,
            status = %new_status,
            "Request status finalized from person decisions"
        );
    }

    tx.commit().await.map_err(DomainError::Database)?;

    info!(
        person_id = %person_id,
        request_id = %request.id,
        stage = %stage,
        status = %target,
        actor_id = %principal.id,
        "Visitor entry decided"
    );
    Ok(updated)
}

// ============================================================================
// Helpers
// ============================================================================

fn ensure_stage_actor(principal: &Principal, stage: Stage) -> Result<(), DomainError> {
    if !principal.active {
        return Err(DomainError::Forbidden("principal is inactive".to_string()));
    }
    if !can_act_at_stage(principal.role, stage) {
        return Err(DomainError::Forbidden(format!(
            "role is not a {} authority",
            stage
        )));
    }
    Ok(())
}

fn ensure_stage_allows(stage: Stage, status: RequestStatus) -> Result<(), DomainError> {
    if status.allows_stage(stage) {
        Ok(())
    } else {
        Err(DomainError::InvalidState(format!(
            "{} actions are not allowed while the request is {}",
            stage, status
        )))
    }
}

fn non_blank_reason(reason: &str) -> Result<&str, DomainError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(DomainError::MissingReason);
    }
    Ok(trimmed)
}

/// Notification fan-out mirroring the bulk actions: the AS authority when the
/// request enters its stage, the creator and the target checkpoints' operators
/// on final approval, the creator on declines.
async fn notify_status_change(
    request: &Request,
    new_status: RequestStatus,
    pool: &PgPool,
    conn: &mut PgConnection,
) -> anyhow::Result<()> {
    match new_status {
        RequestStatus::PendingAs | RequestStatus::ApprovedUsb => {
            let recipients = User::find_active_by_role_code(AS_ROLE_CODE, pool).await?;
            let ids: Vec<_> = recipients.iter().map(|u| u.id).collect();
            Notification::enqueue_many(
                &ids,
                &format!("Pass request {} awaits AS review", request.id),
                Some(request.id),
                conn,
            )
            .await?;
        }
        RequestStatus::ApprovedAs => {
            Notification::enqueue(
                request.creator_id,
                &format!("Pass request {} was approved", request.id),
                Some(request.id),
                conn,
            )
            .await?;
            let checkpoint_ids = Request::checkpoint_ids(request.id, conn).await?;
            for checkpoint_id in checkpoint_ids {
                let operators =
                    User::find_active_checkpoint_operators(checkpoint_id, pool).await?;
                let ids: Vec<_> = operators.iter().map(|u| u.id).collect();
                Notification::enqueue_many(
                    &ids,
                    &format!(
                        "Pass request {} approved for checkpoint {}",
                        request.id, checkpoint_id
                    ),
                    Some(request.id),
                    conn,
                )
                .await?;
            }
        }
        RequestStatus::DeclinedUsb | RequestStatus::DeclinedAs => {
            Notification::enqueue(
                request.creator_id,
                &format!("Pass request {} was declined", request.id),
                Some(request.id),
                conn,
            )
            .await?;
        }
        _ => {}
    }
    Ok(())
}
