// Gatepass - visitor entry-pass approval core
//
// This crate implements the two-level approval workflow for physical-site
// entry passes: routing of new requests to the first or second approval
// authority, bulk and per-person stage decisions, and the aggregation that
// derives a request's overall status from its visitor entries.
//
// Transport, credential issuance and the admin UI live outside this crate;
// callers hand in an already-authenticated Principal.

pub mod common;
pub mod config;
pub mod domains;

pub use config::*;
