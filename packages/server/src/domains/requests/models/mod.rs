mod approval;
mod request;
mod request_person;
mod status;

pub use approval::{Approval, ApprovalVerdict};
pub use request::{Request, RequestFilters};
pub use request_person::RequestPerson;
pub use status::{PersonStatus, RequestStatus};
