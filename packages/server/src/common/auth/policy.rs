use super::role::{Principal, Role, Stage};
use crate::common::{CheckpointId, DepartmentId, DurationClass};

/// Which requests a principal may list.
///
/// `DepartmentSubtree` is resolved to the concrete descendant set by the
/// hierarchy resolver at query time; `Checkpoint` carries the fixed
/// allowed-status set {APPROVED_AS, ISSUED} implicitly (the listing query
/// applies it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Admin and both stage authorities see everything.
    Unrestricted,
    /// Default: only requests the principal created.
    CreatorOnly,
    /// Managers see requests created within their own unit's subtree.
    DepartmentSubtree(DepartmentId),
    /// Checkpoint operators see approved/issued requests targeting their
    /// checkpoint.
    Checkpoint(CheckpointId),
}

/// Whether a role may create a request of the given duration class.
///
/// Long-term requests require the department-head tier; short-term requests
/// admit unit heads as well. Admin may create either.
pub fn can_create_request(role: Role, duration: DurationClass) -> bool {
    match role {
        Role::Admin => true,
        Role::DepartmentHead => true,
        Role::UnitHead => duration == DurationClass::ShortTerm,
        _ => false,
    }
}

/// Whether a role may approve/decline at the given stage.
pub fn can_act_at_stage(role: Role, stage: Stage) -> bool {
    role == Role::Admin || role.authority_stage() == Some(stage)
}

/// Whether a role may add or deactivate blacklist entries.
pub fn can_manage_blacklist(role: Role) -> bool {
    matches!(role, Role::Admin | Role::UsbOfficer | Role::AsOfficer)
}

/// Whether a role sees every request regardless of scope.
pub fn can_view_all_requests(role: Role) -> bool {
    matches!(role, Role::Admin | Role::UsbOfficer | Role::AsOfficer)
}

/// Compute the listing visibility for a principal.
///
/// A manager without a department falls back to creator-only rather than
/// silently widening.
pub fn visibility_for(principal: &Principal) -> Visibility {
    if can_view_all_requests(principal.role) {
        return Visibility::Unrestricted;
    }
    if principal.role.is_manager() {
        if let Some(department_id) = principal.department_id {
            return Visibility::DepartmentSubtree(department_id);
        }
        return Visibility::CreatorOnly;
    }
    if let Role::CheckpointOperator(checkpoint_id) = principal.role {
        return Visibility::Checkpoint(checkpoint_id);
    }
    Visibility::CreatorOnly
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UserId;

    fn principal(role_code: Option<&str>, department: Option<DepartmentId>) -> Principal {
        Principal::new(UserId::new(), role_code, department, true)
    }

    #[test]
    fn test_long_term_requires_department_head() {
        assert!(can_create_request(Role::DepartmentHead, DurationClass::LongTerm));
        assert!(can_create_request(Role::Admin, DurationClass::LongTerm));
        assert!(!can_create_request(Role::UnitHead, DurationClass::LongTerm));
        assert!(!can_create_request(Role::Employee, DurationClass::LongTerm));
    }

    #[test]
    fn test_short_term_admits_unit_heads() {
        assert!(can_create_request(Role::UnitHead, DurationClass::ShortTerm));
        assert!(can_create_request(Role::DepartmentHead, DurationClass::ShortTerm));
        assert!(!can_create_request(Role::UsbOfficer, DurationClass::ShortTerm));
    }

    #[test]
    fn test_stage_gate() {
        assert!(can_act_at_stage(Role::UsbOfficer, Stage::Usb));
        assert!(!can_act_at_stage(Role::UsbOfficer, Stage::As));
        assert!(can_act_at_stage(Role::AsOfficer, Stage::As));
        assert!(!can_act_at_stage(Role::AsOfficer, Stage::Usb));
        assert!(can_act_at_stage(Role::Admin, Stage::Usb));
        assert!(can_act_at_stage(Role::Admin, Stage::As));
        assert!(!can_act_at_stage(Role::DepartmentHead, Stage::Usb));
    }

    #[test]
    fn test_visibility_unrestricted_for_authorities() {
        for code in ["admin", "usb_officer", "as_officer"] {
            assert_eq!(
                visibility_for(&principal(Some(code), None)),
                Visibility::Unrestricted
            );
        }
    }

    #[test]
    fn test_visibility_manager_scope() {
        let department = DepartmentId::new();
        assert_eq!(
            visibility_for(&principal(Some("head_of_department"), Some(department))),
            Visibility::DepartmentSubtree(department)
        );
        // No department: fall back to creator-only
        assert_eq!(
            visibility_for(&principal(Some("head_of_department"), None)),
            Visibility::CreatorOnly
        );
    }

    #[test]
    fn test_visibility_checkpoint_operator() {
        assert_eq!(
            visibility_for(&principal(Some("KPP-2"), None)),
            Visibility::Checkpoint(2)
        );
        // Malformed suffix degrades to the default scope
        assert_eq!(
            visibility_for(&principal(Some("KPP-two"), None)),
            Visibility::CreatorOnly
        );
    }

    #[test]
    fn test_visibility_default_creator_only() {
        assert_eq!(
            visibility_for(&principal(None, None)),
            Visibility::CreatorOnly
        );
        assert_eq!(
            visibility_for(&principal(Some("employee"), None)),
            Visibility::CreatorOnly
        );
    }
}
