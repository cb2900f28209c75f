mod department;

pub use department::{collect_descendants, descendants, Department, DepartmentKind};
