//! Typed ID definitions for all domain entities.

// Re-export the core Id type
pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for User entities (staff principals).
pub struct User;

/// Marker type for Department entities (organizational units).
pub struct Department;

/// Marker type for Request entities (pass requests).
pub struct Request;

/// Marker type for RequestPerson entities (visitor entries).
pub struct RequestPerson;

/// Marker type for BlacklistEntry entities.
pub struct BlacklistEntry;

/// Marker type for Approval history rows.
pub struct Approval;

/// Marker type for AuditEvent rows.
pub struct AuditEvent;

/// Marker type for Notification rows.
pub struct Notification;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for User entities.
pub type UserId = Id<User>;

/// Typed ID for Department entities.
pub type DepartmentId = Id<Department>;

/// Typed ID for Request entities.
pub type RequestId = Id<Request>;

/// Typed ID for RequestPerson entities.
pub type PersonId = Id<RequestPerson>;

/// Typed ID for BlacklistEntry entities.
pub type BlacklistEntryId = Id<BlacklistEntry>;

/// Typed ID for Approval history rows.
pub type ApprovalId = Id<Approval>;

/// Typed ID for AuditEvent rows.
pub type AuditEventId = Id<AuditEvent>;

/// Typed ID for Notification rows.
pub type NotificationId = Id<Notification>;

/// Checkpoints are fixed reference data keyed by a small serial id; the id is
/// also encoded into checkpoint-operator role codes (`KPP-<id>`).
pub type CheckpointId = i32;
