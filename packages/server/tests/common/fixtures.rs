//! Seed data builders shared by the integration suites.
//!
//! Every fixture gets unique usernames so suites can share one database.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use gatepass_core::common::{
    CheckpointId, DepartmentId, DurationClass, NationalityClass, Principal, UserId,
};
use gatepass_core::domains::checkpoints::models::Checkpoint;
use gatepass_core::domains::hierarchy::{Department, DepartmentKind};
use gatepass_core::domains::requests::actions::{PersonDraft, RequestDraft};
use gatepass_core::domains::users::models::User;

/// A seeded organization: one company with a department and a child division,
/// two checkpoints, and one user per interesting role.
pub struct Fixture {
    pub company_id: DepartmentId,
    pub department_id: DepartmentId,
    pub division_id: DepartmentId,
    pub checkpoint_a: CheckpointId,
    pub checkpoint_b: CheckpointId,
    pub admin: Principal,
    pub usb_officer: Principal,
    pub as_officer: Principal,
    pub department_head: Principal,
    pub unit_head: Principal,
    pub operator_a: Principal,
    pub employee: Principal,
}

pub async fn seed(pool: &PgPool) -> Fixture {
    let company_id = seed_department(pool, "Company", None, DepartmentKind::Company).await;
    let department_id =
        seed_department(pool, "Security Dept", Some(company_id), DepartmentKind::Department).await;
    let division_id =
        seed_department(pool, "Ops Division", Some(department_id), DepartmentKind::Division).await;

    let checkpoint_a = seed_checkpoint(pool, "main gate").await;
    let checkpoint_b = seed_checkpoint(pool, "cargo gate").await;

    let admin = seed_user(pool, Some("admin"), None).await;
    let usb_officer = seed_user(pool, Some("usb_officer"), None).await;
    let as_officer = seed_user(pool, Some("as_officer"), None).await;
    let department_head = seed_user(pool, Some("head_of_department"), Some(department_id)).await;
    let unit_head = seed_user(pool, Some("head_of_management_unit"), Some(division_id)).await;
    let operator_a = seed_user(pool, Some(&format!("KPP-{}", checkpoint_a)), None).await;
    let employee = seed_user(pool, None, Some(division_id)).await;

    Fixture {
        company_id,
        department_id,
        division_id,
        checkpoint_a,
        checkpoint_b,
        admin,
        usb_officer,
        as_officer,
        department_head,
        unit_head,
        operator_a,
        employee,
    }
}

pub async fn seed_department(
    pool: &PgPool,
    name: &str,
    parent_id: Option<DepartmentId>,
    kind: DepartmentKind,
) -> DepartmentId {
    let department = Department {
        id: DepartmentId::new(),
        name: format!("{} {}", name, short_token()),
        parent_id,
        kind,
    };
    department.insert(pool).await.expect("seed department");
    department.id
}

pub async fn seed_checkpoint(pool: &PgPool, name: &str) -> CheckpointId {
    // Checkpoint ids are plain integers; derive a unique one per fixture.
    let id = (Uuid::new_v4().as_u128() % 2_000_000_000) as i32 + 1;
    Checkpoint {
        id,
        code: format!("KPP-{}", id),
        name: name.to_string(),
    }
    .insert(pool)
    .await
    .expect("seed checkpoint");
    id
}

pub async fn seed_user(
    pool: &PgPool,
    role_code: Option<&str>,
    department_id: Option<DepartmentId>,
) -> Principal {
    let user = User {
        id: UserId::new(),
        username: format!("user-{}", short_token()),
        full_name: "Test User".to_string(),
        role_code: role_code.map(String::from),
        department_id,
        active: true,
        created_at: Utc::now(),
    };
    let user = user.insert(pool).await.expect("seed user");
    user.principal()
}

/// A one-day short-term draft for `n` local visitors.
pub fn short_term_draft(checkpoint_ids: Vec<CheckpointId>, names: &[&str]) -> RequestDraft {
    let today = Utc::now().date_naive();
    RequestDraft {
        duration: DurationClass::ShortTerm,
        purpose: "maintenance visit".to_string(),
        start_date: Some(today),
        end_date: Some(today),
        checkpoint_ids,
        persons: names.iter().map(|name| local_person(name)).collect(),
    }
}

/// A long-term draft for the given visitors.
pub fn long_term_draft(checkpoint_ids: Vec<CheckpointId>, names: &[&str]) -> RequestDraft {
    RequestDraft {
        duration: DurationClass::LongTerm,
        purpose: "contractor works".to_string(),
        start_date: Some(Utc::now().date_naive()),
        end_date: Some(Utc::now().date_naive() + chrono::Duration::days(90)),
        checkpoint_ids,
        persons: names.iter().map(|name| local_person(name)).collect(),
    }
}

pub fn local_person(name: &str) -> PersonDraft {
    PersonDraft {
        full_name: name.to_string(),
        doc_number: Some(format!("N{}", short_token())),
        iin: Some(format!("{:012}", Uuid::new_v4().as_u128() % 1_000_000_000_000)),
        birth_date: None,
        nationality: NationalityClass::Local,
    }
}

pub fn foreign_person(name: &str) -> PersonDraft {
    PersonDraft {
        nationality: NationalityClass::Foreign,
        ..local_person(name)
    }
}

fn short_token() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
