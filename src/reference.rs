//! Reference data: users, departments and the static catalogs.
//!
//! Users and departments are loaded from the record store and never owned by a
//! project; projects, tasks and templates refer to them by id.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::fields::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub initials: String,
    pub role: Role,
    #[serde(default)]
    pub department_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// User id of the department head.
    #[serde(default)]
    pub lead: Option<String>,
}

/// The user on whose behalf a mutation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub initials: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, initials: impl Into<String>) -> Self {
        Actor {
            id: id.into(),
            initials: initials.into(),
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor::new(user.id.clone(), user.initials.clone())
    }
}

/// Read-only lookup over users and departments.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    users: Vec<User>,
    departments: Vec<Department>,
}

impl ReferenceData {
    pub fn new(users: Vec<User>, departments: Vec<Department>) -> Self {
        ReferenceData { users, departments }
    }

    /// The built-in directory used when the store has no users yet.
    pub fn seeded() -> Self {
        let user = |id: &str, name: &str, role: Role, dept: &str| User {
            id: id.into(),
            name: name.into(),
            initials: id.to_uppercase(),
            role,
            department_id: Some(dept.into()),
        };
        let dept = |id: &str, name: &str, lead: &str| Department {
            id: id.into(),
            name: name.into(),
            description: None,
            lead: Some(lead.into()),
        };
        ReferenceData {
            users: vec![
                user("kh", "Kevin H.", Role::Pm, "pm"),
                user("rb", "Ryan B.", Role::Technician, "field"),
                user("es", "Eric S.", Role::Technician, "software"),
                user("jm", "Josh M.", Role::Admin, "production"),
            ],
            departments: vec![
                dept("pm", "Project Management", "kh"),
                dept("field", "Field Service", "rb"),
                dept("software", "Software Support", "es"),
                dept("production", "Production", "jm"),
            ],
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    /// Case-insensitive lookup by id or initials.
    pub fn user(&self, id: &str) -> Option<&User> {
        let id = id.trim();
        self.users
            .iter()
            .find(|u| u.id.eq_ignore_ascii_case(id) || u.initials.eq_ignore_ascii_case(id))
    }

    pub fn require_user(&self, id: &str) -> Result<&User, ValidationError> {
        self.user(id)
            .ok_or_else(|| ValidationError::UnknownUser(id.to_string()))
    }

    pub fn department(&self, id: &str) -> Option<&Department> {
        self.departments.iter().find(|d| d.id == id)
    }

    pub fn users_in_department<'a>(&'a self, department_id: &'a str) -> impl Iterator<Item = &'a User> {
        self.users
            .iter()
            .filter(move |u| u.department_id.as_deref() == Some(department_id))
    }

    pub fn is_manager(&self, id: &str) -> bool {
        self.user(id).map(|u| u.role.is_manager()).unwrap_or(false)
    }

    pub fn time_categories(&self) -> &'static [TimeCategory] {
        &TimeCategory::ALL
    }

    pub fn task_categories(&self) -> &'static [TaskCategory] {
        &TaskCategory::ALL
    }

    pub fn task_statuses(&self) -> &'static [TaskStatus] {
        &TaskStatus::ALL
    }

    pub fn project_types(&self) -> &'static [ProjectType] {
        &ProjectType::ALL
    }
}
