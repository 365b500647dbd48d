//! Task data structures: tasks, their logged time and their comments.
//!
//! A task belongs to exactly one project and may sit one level below a parent
//! task. Time entries and comments are append-only children of a task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::fields::*;

/// A unit of work within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_task_id: Option<Uuid>,
    pub title: String,
    pub owner: String,
    #[serde(default)]
    pub department_id: Option<String>,
    pub status: TaskStatus,
    pub phase: Option<String>,
    pub milestone: Milestone,
    pub category: TaskCategory,
    pub estimated_hours: f64,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hours spent on a task. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub duration: f64,
    pub category: TimeCategory,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Free-text annotation on a task. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Caller-supplied fields for an ad-hoc task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub owner: String,
    pub parent_task_id: Option<Uuid>,
    pub department_id: Option<String>,
    pub status: TaskStatus,
    pub phase: Option<String>,
    pub milestone: Milestone,
    pub category: TaskCategory,
    pub estimated_hours: f64,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Empty("task title"));
        }
        if self.estimated_hours < 0.0 || self.estimated_hours.is_nan() {
            return Err(ValidationError::Negative {
                field: "estimated hours",
                value: self.estimated_hours,
            });
        }
        Ok(())
    }
}

impl Task {
    /// Build a fresh task with a new identity and empty child collections.
    pub fn from_new(project_id: Uuid, new: NewTask, now: DateTime<Utc>) -> Self {
        Task {
            id: Uuid::new_v4(),
            project_id,
            parent_task_id: new.parent_task_id,
            title: new.title.trim().to_string(),
            owner: new.owner,
            department_id: new.department_id,
            status: new.status,
            phase: new.phase.filter(|p| !p.trim().is_empty()),
            milestone: new.milestone,
            category: new.category,
            estimated_hours: new.estimated_hours,
            time_entries: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_task_id.is_some()
    }

    /// Sum of every logged time entry, in hours.
    pub fn logged_hours(&self) -> f64 {
        self.time_entries.iter().map(|e| e.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(title: &str, hours: f64) -> NewTask {
        NewTask {
            title: title.to_string(),
            owner: "KH".into(),
            parent_task_id: None,
            department_id: None,
            status: TaskStatus::Ready,
            phase: Some("  ".into()),
            milestone: Milestone::M60,
            category: TaskCategory::Configuration,
            estimated_hours: hours,
        }
    }

    #[test]
    fn test_validate_rejects_blank_title_and_negative_hours() {
        assert_eq!(
            new_task("   ", 1.0).validate(),
            Err(ValidationError::Empty("task title"))
        );
        assert!(matches!(
            new_task("Wire scales", -2.0).validate(),
            Err(ValidationError::Negative { .. })
        ));
        assert!(new_task("Wire scales", 0.0).validate().is_ok());
    }

    #[test]
    fn test_from_new_trims_and_drops_blank_phase() {
        let pid = Uuid::new_v4();
        let now = Utc::now();
        let task = Task::from_new(pid, new_task("  Wire scales ", 3.0), now);
        assert_eq!(task.title, "Wire scales");
        assert_eq!(task.phase, None);
        assert_eq!(task.project_id, pid);
        assert_eq!(task.created_at, now);
        assert!(task.time_entries.is_empty() && task.comments.is_empty());
    }

    #[test]
    fn test_logged_hours_sums_entries() {
        let mut task = Task::from_new(Uuid::new_v4(), new_task("Build", 4.0), Utc::now());
        for d in [1.5, 2.0] {
            task.time_entries.push(TimeEntry {
                id: Uuid::new_v4(),
                duration: d,
                category: TimeCategory::BuildTime,
                note: String::new(),
                created_at: Utc::now(),
                created_by: "RB".into(),
            });
        }
        assert_eq!(task.logged_hours(), 3.5);
    }
}
