//! Read paths: listing with the principal's visibility scope applied before
//! any explicit filter, and single-request fetches that answer NOT_FOUND for
//! both missing and invisible requests.

use sqlx::PgPool;

use crate::common::auth::{can_view_all_requests, visibility_for, Visibility};
use crate::common::{CheckpointId, DomainError, Principal, RequestId, Role};
use crate::domains::hierarchy;
use crate::domains::requests::models::{Approval, Request, RequestFilters, RequestPerson};
use crate::domains::users::models::User;

/// A request with its visitor entries, target checkpoints and decision
/// history.
#[derive(Debug, Clone)]
pub struct RequestDetail {
    pub request: Request,
    pub persons: Vec<RequestPerson>,
    pub checkpoint_ids: Vec<CheckpointId>,
    pub approvals: Vec<Approval>,
}

/// List requests the principal may see.
pub async fn list_requests(
    principal: &Principal,
    filters: &RequestFilters,
    pool: &PgPool,
) -> Result<Vec<Request>, DomainError> {
    if !principal.active {
        return Err(DomainError::Forbidden("principal is inactive".to_string()));
    }

    let requests = match visibility_for(principal) {
        Visibility::Unrestricted => Request::list_all(filters, pool).await,
        Visibility::CreatorOnly => Request::list_by_creator(principal.id, filters, pool).await,
        Visibility::DepartmentSubtree(department_id) => {
            let scope = hierarchy::descendants(department_id, pool)
                .await
                .map_err(DomainError::Internal)?;
            let scope: Vec<_> = scope.into_iter().collect();
            Request::list_by_creator_departments(&scope, filters, pool).await
        }
        Visibility::Checkpoint(checkpoint_id) => {
            Request::list_by_checkpoint(checkpoint_id, filters, pool).await
        }
    }
    .map_err(DomainError::Internal)?;

    Ok(requests)
}

/// Fetch one request with its detail rows, if the principal may see it.
pub async fn get_request(
    principal: &Principal,
    request_id: RequestId,
    pool: &PgPool,
) -> Result<RequestDetail, DomainError> {
    if !principal.active {
        return Err(DomainError::Forbidden("principal is inactive".to_string()));
    }

    let request = Request::find_by_id(request_id, pool)
        .await
        .map_err(DomainError::Internal)?
        .ok_or(DomainError::NotFound)?;

    let checkpoint_ids = Request::checkpoint_ids_on_pool(request_id, pool)
        .await
        .map_err(DomainError::Internal)?;

    if !can_view(principal, &request, &checkpoint_ids, pool).await? {
        return Err(DomainError::NotFound);
    }

    let persons = RequestPerson::find_by_request_on_pool(request_id, pool)
        .await
        .map_err(DomainError::Internal)?;
    let approvals = Approval::find_by_request(request_id, pool)
        .await
        .map_err(DomainError::Internal)?;

    Ok(RequestDetail {
        request,
        persons,
        checkpoint_ids,
        approvals,
    })
}

/// Single-resource visibility: everything-viewers, the creator, managers over
/// the creator's unit, and checkpoint operators for admissible requests
/// targeting their checkpoint.
async fn can_view(
    principal: &Principal,
    request: &Request,
    checkpoint_ids: &[CheckpointId],
    pool: &PgPool,
) -> Result<bool, DomainError> {
    if can_view_all_requests(principal.role) {
        return Ok(true);
    }
    if request.creator_id == principal.id {
        return Ok(true);
    }
    if principal.role.is_manager() {
        if let Some(own_department) = principal.department_id {
            let creator = User::find_by_id(request.creator_id, pool)
                .await
                .map_err(DomainError::Internal)?;
            if let Some(creator_department) = creator.and_then(|u| u.department_id) {
                let scope = hierarchy::descendants(own_department, pool)
                    .await
                    .map_err(DomainError::Internal)?;
                if scope.contains(&creator_department) {
                    return Ok(true);
                }
            }
        }
    }
    if let Role::CheckpointOperator(checkpoint_id) = principal.role {
        if request.status.is_admissible() && checkpoint_ids.contains(&checkpoint_id) {
            return Ok(true);
        }
    }
    Ok(false)
}
