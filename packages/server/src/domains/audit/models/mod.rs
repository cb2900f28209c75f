mod audit_event;

pub use audit_event::AuditEvent;
