//! Workflow entry points.
//!
//! Actions are self-contained: they gate on the principal, run one
//! transaction, and leave the audit/notification side effects behind.

mod approval;
mod create;
mod lifecycle;
mod queries;

pub use approval::{approve_person, approve_stage, decline_stage, reject_person};
pub use create::{create_request, PersonDraft, RequestDraft};
pub use lifecycle::{check_in_person, close_request, delete_request};
pub use queries::{get_request, list_requests, RequestDetail};
