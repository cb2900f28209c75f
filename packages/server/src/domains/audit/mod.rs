// Audit domain - append-only trail of every mutating operation

pub mod models;

pub use models::AuditEvent;

/// Entity names used in the audit trail.
pub mod entities {
    pub const REQUEST: &str = "request";
    pub const REQUEST_PERSON: &str = "request_person";
    pub const BLACKLIST_ENTRY: &str = "blacklist_entry";
}

/// Action codes used in the audit trail.
pub mod actions {
    pub const CREATE_AND_SUBMIT: &str = "CREATE_AND_SUBMIT";
    pub const CREATE_FAIL: &str = "CREATE_FAIL";
    pub const APPROVE_STAGE: &str = "APPROVE_STAGE";
    pub const DECLINE_STAGE: &str = "DECLINE_STAGE";
    pub const APPROVE_PERSON: &str = "APPROVE_PERSON";
    pub const REJECT_PERSON: &str = "REJECT_PERSON";
    pub const STATUS_CHANGED: &str = "STATUS_CHANGED";
    pub const CHECK_IN: &str = "CHECK_IN";
    pub const CLOSE: &str = "CLOSE";
    pub const DELETE: &str = "DELETE";
    pub const BLACKLIST_ADD: &str = "BLACKLIST_ADD";
    pub const BLACKLIST_REMOVE: &str = "BLACKLIST_REMOVE";
}
