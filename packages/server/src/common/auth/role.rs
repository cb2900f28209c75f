use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::{CheckpointId, DepartmentId, UserId};

/// Role code of the administrator.
pub const ADMIN_ROLE_CODE: &str = "admin";
/// Role code of the first-stage (USB) approval authority.
pub const USB_ROLE_CODE: &str = "usb_officer";
/// Role code of the second-stage (AS) approval authority.
pub const AS_ROLE_CODE: &str = "as_officer";
/// Role code of a department head (may create long-term requests).
pub const DEPARTMENT_HEAD_ROLE_CODE: &str = "head_of_department";
/// Role code of a division/unit head (short-term requests only).
pub const UNIT_HEAD_ROLE_CODE: &str = "head_of_management_unit";
/// Prefix of checkpoint-operator role codes; the suffix is the checkpoint id,
/// e.g. `KPP-3`.
pub const KPP_ROLE_PREFIX: &str = "KPP-";

/// The two approval stages of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "approval_stage", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    /// First stage: security review.
    Usb,
    /// Second stage: administrative service.
    As,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Usb => write!(f, "USB"),
            Stage::As => write!(f, "AS"),
        }
    }
}

/// A role code resolved into its structured form.
///
/// Checkpoint-operator codes are parametric: `KPP-<checkpoint id>`. A code
/// with the prefix but a malformed suffix resolves to [`Role::Employee`],
/// so a bad suffix denies access instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    UsbOfficer,
    AsOfficer,
    DepartmentHead,
    UnitHead,
    CheckpointOperator(CheckpointId),
    Employee,
}

impl Role {
    /// Resolve a raw role code. Unknown codes and users without a role are
    /// plain employees.
    pub fn from_code(code: Option<&str>) -> Self {
        let Some(code) = code else {
            return Role::Employee;
        };
        match code {
            ADMIN_ROLE_CODE => Role::Admin,
            USB_ROLE_CODE => Role::UsbOfficer,
            AS_ROLE_CODE => Role::AsOfficer,
            DEPARTMENT_HEAD_ROLE_CODE => Role::DepartmentHead,
            UNIT_HEAD_ROLE_CODE => Role::UnitHead,
            other => match other.strip_prefix(KPP_ROLE_PREFIX) {
                Some(suffix) => suffix
                    .parse::<CheckpointId>()
                    .map(Role::CheckpointOperator)
                    .unwrap_or(Role::Employee),
                None => Role::Employee,
            },
        }
    }

    /// The stage this role is an authority for, if any.
    pub fn authority_stage(&self) -> Option<Stage> {
        match self {
            Role::UsbOfficer => Some(Stage::Usb),
            Role::AsOfficer => Some(Stage::As),
            _ => None,
        }
    }

    /// Department heads and unit heads see their own subtree.
    pub fn is_manager(&self) -> bool {
        matches!(self, Role::DepartmentHead | Role::UnitHead)
    }
}

/// An authenticated caller, as handed in by the external auth layer.
///
/// The role code is resolved exactly once, here.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
    pub department_id: Option<DepartmentId>,
    pub active: bool,
}

impl Principal {
    pub fn new(
        id: UserId,
        role_code: Option<&str>,
        department_id: Option<DepartmentId>,
        active: bool,
    ) -> Self {
        Self {
            id,
            role: Role::from_code(role_code),
            department_id,
            active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_resolve() {
        assert_eq!(Role::from_code(Some("admin")), Role::Admin);
        assert_eq!(Role::from_code(Some("usb_officer")), Role::UsbOfficer);
        assert_eq!(Role::from_code(Some("as_officer")), Role::AsOfficer);
        assert_eq!(
            Role::from_code(Some("head_of_department")),
            Role::DepartmentHead
        );
        assert_eq!(
            Role::from_code(Some("head_of_management_unit")),
            Role::UnitHead
        );
    }

    #[test]
    fn test_checkpoint_operator_suffix() {
        assert_eq!(
            Role::from_code(Some("KPP-3")),
            Role::CheckpointOperator(3)
        );
        assert_eq!(
            Role::from_code(Some("KPP-12")),
            Role::CheckpointOperator(12)
        );
    }

    #[test]
    fn test_malformed_operator_suffix_is_employee() {
        // Parse failure must deny, not error
        assert_eq!(Role::from_code(Some("KPP-")), Role::Employee);
        assert_eq!(Role::from_code(Some("KPP-x")), Role::Employee);
        assert_eq!(Role::from_code(Some("KPP-1.5")), Role::Employee);
    }

    #[test]
    fn test_unknown_and_missing_codes_are_employee() {
        assert_eq!(Role::from_code(Some("intern")), Role::Employee);
        assert_eq!(Role::from_code(None), Role::Employee);
    }

    #[test]
    fn test_authority_stage() {
        assert_eq!(Role::UsbOfficer.authority_stage(), Some(Stage::Usb));
        assert_eq!(Role::AsOfficer.authority_stage(), Some(Stage::As));
        assert_eq!(Role::Admin.authority_stage(), None);
    }
}
