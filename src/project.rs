//! Project aggregate: a customer engagement with its tasks and review notes.
//!
//! A project exclusively owns its tasks and review notes. The cached `blocked`
//! flag mirrors whether any owned task is `Blocked` and is refreshed by the
//! repository after every status change.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::*;
use crate::task::Task;

/// Budgeted hours per time category.
pub type QuotedHours = BTreeMap<TimeCategory, f64>;

/// A customer installation or implementation engagement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub customer: String,
    pub work_order_id: String,
    pub order_date: NaiveDate,
    pub lead_time_type: LeadTimeType,
    pub reseller: Option<String>,
    pub scale_dealer: Option<String>,
    pub owner: String,
    #[serde(default)]
    pub contributors: Vec<String>,
    pub status: ProjectStatus,
    pub blocked: bool,
    pub kind: ProjectKind,
    #[serde(default)]
    pub quoted_hours: QuotedHours,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub review_notes: Vec<ReviewNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// A PM observation on a project, independent of any task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewNote {
    pub id: Uuid,
    pub project_id: Uuid,
    pub text: String,
    pub is_reviewed: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
}

impl ReviewNote {
    /// Unreviewed to reviewed is a one-way transition; re-marking keeps the first stamp.
    pub fn mark_reviewed(&mut self, reviewer: &str, now: DateTime<Utc>) -> bool {
        if self.is_reviewed {
            return false;
        }
        self.is_reviewed = true;
        self.reviewed_at = Some(now);
        self.reviewed_by = Some(reviewer.to_string());
        true
    }
}

/// Quoted and logged hours for one time category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoursLine {
    pub category: TimeCategory,
    pub quoted: f64,
    pub actual: f64,
}

impl Project {
    pub fn is_open(&self) -> bool {
        self.status == ProjectStatus::Open
    }

    /// True iff at least one task is `Blocked`. Always computed from the tasks.
    pub fn has_blocked_tasks(&self) -> bool {
        self.tasks.iter().any(|t| t.status == TaskStatus::Blocked)
    }

    /// Refresh the cached `blocked` flag from the current task states.
    pub fn recompute_blocked(&mut self) {
        self.blocked = self.has_blocked_tasks();
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn note_mut(&mut self, id: Uuid) -> Option<&mut ReviewNote> {
        self.review_notes.iter_mut().find(|n| n.id == id)
    }

    /// Direct children of a task, in creation order.
    pub fn subtasks_of(&self, parent: Uuid) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(move |t| t.parent_task_id == Some(parent))
    }

    pub fn unreviewed_notes(&self) -> usize {
        self.review_notes.iter().filter(|n| !n.is_reviewed).count()
    }

    /// Total logged hours across every task.
    pub fn logged_hours(&self) -> f64 {
        self.tasks.iter().map(Task::logged_hours).sum()
    }

    /// Logged hours per time category. Categories with no entries are absent.
    pub fn hours_by_category(&self) -> BTreeMap<TimeCategory, f64> {
        let mut out: BTreeMap<TimeCategory, f64> = BTreeMap::new();
        for entry in self.tasks.iter().flat_map(|t| &t.time_entries) {
            *out.entry(entry.category).or_default() += entry.duration;
        }
        out
    }

    /// Quoted against logged hours for every category that has either.
    pub fn hours_vs_quote(&self) -> Vec<HoursLine> {
        let actual = self.hours_by_category();
        TimeCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let quoted = self.quoted_hours.get(&category).copied();
                let logged = actual.get(&category).copied();
                if quoted.is_none() && logged.is_none() {
                    return None;
                }
                Some(HoursLine {
                    category,
                    quoted: quoted.unwrap_or(0.0),
                    actual: logged.unwrap_or(0.0),
                })
            })
            .collect()
    }

    /// Latest task update, if the project has any tasks.
    pub fn last_task_update(&self) -> Option<DateTime<Utc>> {
        self.tasks.iter().map(|t| t.updated_at).max()
    }
}
