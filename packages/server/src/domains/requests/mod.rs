// Requests domain - the two-level approval workflow
//
// Responsibilities:
// - Routing new requests to the first or second approval authority
// - Bulk stage approvals/declines and per-person decisions
// - Aggregating person statuses into the request status
// - Issuance (checkpoint check-in), closing, early deletion

pub mod actions;
pub mod machines;
pub mod models;

pub use models::*;
