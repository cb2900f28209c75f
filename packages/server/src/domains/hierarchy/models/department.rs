use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};

use crate::common::DepartmentId;

/// Kind of organizational unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "department_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepartmentKind {
    Company,
    Department,
    Division,
    Unit,
}

/// Organizational unit - a node of the parent-pointer forest
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub parent_id: Option<DepartmentId>,
    pub kind: DepartmentKind,
}

impl Department {
    /// Find a department by ID.
    pub async fn find_by_id(id: DepartmentId, pool: &PgPool) -> Result<Option<Self>> {
        let department =
            sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(department)
    }

    /// Load the whole forest.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let departments =
            sqlx::query_as::<_, Department>("SELECT * FROM departments ORDER BY id")
                .fetch_all(pool)
                .await?;
        Ok(departments)
    }

    /// Insert a department (seed/test data).
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        let department = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (id, name, parent_id, kind)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(self.parent_id)
        .bind(self.kind)
        .fetch_one(pool)
        .await?;
        Ok(department)
    }
}

/// A unit id plus all its descendants, walked over the loaded forest.
///
/// The parent pointers are supposed to form a forest; if corrupted data
/// introduces a cycle the walk notices the revisit and errors out instead of
/// spinning.
pub fn collect_descendants(
    departments: &[Department],
    root: DepartmentId,
) -> Result<HashSet<DepartmentId>> {
    let mut children: HashMap<DepartmentId, Vec<DepartmentId>> = HashMap::new();
    for department in departments {
        if let Some(parent_id) = department.parent_id {
            children.entry(parent_id).or_default().push(department.id);
        }
    }

    let mut visited = HashSet::new();
    visited.insert(root);
    let mut queue = vec![root];
    while let Some(unit) = queue.pop() {
        for child in children.get(&unit).into_iter().flatten() {
            if !visited.insert(*child) {
                bail!("department hierarchy contains a cycle at {}", child);
            }
            queue.push(*child);
        }
    }
    Ok(visited)
}

/// Resolve a unit id to itself plus all descendant unit ids.
pub async fn descendants(unit_id: DepartmentId, pool: &PgPool) -> Result<HashSet<DepartmentId>> {
    let departments = Department::find_all(pool).await?;
    collect_descendants(&departments, unit_id)
}
