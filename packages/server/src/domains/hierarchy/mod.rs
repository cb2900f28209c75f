// Hierarchy domain - the organizational-unit forest and descendant lookup

pub mod models;

pub use models::{collect_descendants, descendants, Department, DepartmentKind};
