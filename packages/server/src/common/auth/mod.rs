//! Authorization for the pass-approval core.
//!
//! Role codes are resolved once, at the boundary, into the tagged [`Role`]
//! variant; everything downstream matches on the variant instead of
//! re-parsing strings. Policy functions are pure: they map a principal (and
//! sometimes a resource) to allow/deny or to a [`Visibility`] descriptor the
//! query layer translates into SQL filters.

mod policy;
mod role;

pub use policy::{
    can_act_at_stage, can_create_request, can_manage_blacklist, can_view_all_requests,
    visibility_for, Visibility,
};
pub use role::{
    Principal, Role, Stage, ADMIN_ROLE_CODE, AS_ROLE_CODE, DEPARTMENT_HEAD_ROLE_CODE,
    KPP_ROLE_PREFIX, UNIT_HEAD_ROLE_CODE, USB_ROLE_CODE,
};
