// Users domain - read-only view of staff principals
//
// User lifecycle belongs to the external identity process; the workflow
// reads users for role resolution and notification fan-out.

pub mod models;

pub use models::User;
