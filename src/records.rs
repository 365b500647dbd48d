//! Persisted row shapes and the startup join.
//!
//! Each entity persists as a flat row keyed by `id`, with its parent referenced
//! through `project_id` or `task_id`. Loading reads every resource once and
//! stitches the rows back into project trees.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::db::{RecordStore, Resource};
use crate::error::StoreError;
use crate::fields::*;
use crate::project::{Project, QuotedHours, ReviewNote};
use crate::reference::{Department, ReferenceData, User};
use crate::task::{Comment, Task, TimeEntry};

const UNKNOWN_OWNER: &str = "TBD";
const UNKNOWN_CREATOR: &str = "Unknown";

/// Stamp for a project row saved without timestamps. Children without their own
/// stamps inherit their parent's creation time.
const LEGACY_STAMP: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: Uuid,
    pub name: String,
    pub customer: String,
    pub work_order_id: String,
    pub order_date: NaiveDate,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub lead_time_type: Option<LeadTimeType>,
    #[serde(default)]
    pub reseller: Option<String>,
    #[serde(default)]
    pub scale_dealer: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub blocked: Option<bool>,
    /// Free-form column keyed by time-category label.
    #[serde(default)]
    pub quoted_hours: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

impl ProjectRow {
    pub fn from_project(project: &Project, project_type: ProjectType) -> Self {
        ProjectRow {
            id: project.id,
            name: project.name.clone(),
            customer: project.customer.clone(),
            work_order_id: project.work_order_id.clone(),
            order_date: project.order_date,
            project_type: Some(format!("{project_type:?}")),
            lead_time_type: Some(project.lead_time_type),
            reseller: project.reseller.clone(),
            scale_dealer: project.scale_dealer.clone(),
            owner: Some(project.owner.clone()),
            status: project.status,
            blocked: Some(project.blocked),
            quoted_hours: Some(
                project
                    .quoted_hours
                    .iter()
                    .map(|(category, hours)| (category.label().to_string(), *hours))
                    .collect(),
            ),
            created_at: Some(project.created_at),
            updated_at: Some(project.updated_at),
            closed_at: project.closed_at,
        }
    }

    fn into_project(self) -> Project {
        let kind = match self.project_type.as_deref() {
            Some("SoftwareOnly") => ProjectKind::SoftwareOnly,
            _ => ProjectKind::Hardware,
        };
        let quoted_hours = quoted_hours_from_column(self.id, self.quoted_hours.unwrap_or_default());
        let created_at = self.created_at.unwrap_or(LEGACY_STAMP);
        Project {
            id: self.id,
            name: self.name,
            customer: self.customer,
            work_order_id: self.work_order_id,
            order_date: self.order_date,
            lead_time_type: self.lead_time_type.unwrap_or_default(),
            reseller: self.reseller,
            scale_dealer: self.scale_dealer,
            owner: self.owner.unwrap_or_else(|| UNKNOWN_OWNER.into()),
            contributors: Vec::new(),
            status: self.status,
            blocked: self.blocked.unwrap_or(false),
            kind,
            quoted_hours,
            tasks: Vec::new(),
            review_notes: Vec::new(),
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
            closed_at: self.closed_at,
        }
    }
}

/// Keep recognised time categories; unknown keys are logged and dropped.
fn quoted_hours_from_column(project_id: Uuid, column: BTreeMap<String, f64>) -> QuotedHours {
    column
        .into_iter()
        .filter_map(|(key, hours)| match TimeCategory::parse(&key) {
            Ok(category) => Some((category, hours)),
            Err(_) => {
                warn!(%project_id, key = %key, "ignoring unknown quoted hours category");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: Uuid,
    pub project_id: Uuid,
    #[serde(default)]
    pub parent_task_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub phase: Option<String>,
    pub milestone: Milestone,
    pub category: TaskCategory,
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        TaskRow {
            id: task.id,
            project_id: task.project_id,
            parent_task_id: task.parent_task_id,
            title: task.title.clone(),
            owner: Some(task.owner.clone()),
            department_id: task.department_id.clone(),
            status: task.status,
            phase: task.phase.clone(),
            milestone: task.milestone,
            category: task.category,
            estimated_hours: task.estimated_hours,
            created_at: Some(task.created_at),
            updated_at: Some(task.updated_at),
        }
    }
}

impl TaskRow {
    /// `fallback` stands in for a missing `created_at`, usually the project's.
    fn into_task(self, fallback: DateTime<Utc>) -> Task {
        let created_at = self.created_at.unwrap_or(fallback);
        Task {
            id: self.id,
            project_id: self.project_id,
            parent_task_id: self.parent_task_id,
            title: self.title,
            owner: self.owner.unwrap_or_else(|| UNKNOWN_OWNER.into()),
            department_id: self.department_id,
            status: self.status,
            phase: self.phase,
            milestone: self.milestone,
            category: self.category,
            estimated_hours: self.estimated_hours,
            time_entries: Vec::new(),
            comments: Vec::new(),
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub duration: f64,
    pub category: TimeCategory,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TimeEntryRow {
    pub fn new(task_id: Uuid, entry: &TimeEntry) -> Self {
        TimeEntryRow {
            id: entry.id,
            task_id,
            duration: entry.duration,
            category: entry.category,
            note: Some(entry.note.clone()),
            created_by: Some(entry.created_by.clone()),
            created_at: Some(entry.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub text: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl CommentRow {
    pub fn new(task_id: Uuid, comment: &Comment) -> Self {
        CommentRow {
            id: comment.id,
            task_id,
            text: comment.text.clone(),
            created_by: Some(comment.created_by.clone()),
            created_at: Some(comment.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewNoteRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub text: String,
    #[serde(default)]
    pub is_reviewed: Option<bool>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
}

impl From<&ReviewNote> for ReviewNoteRow {
    fn from(note: &ReviewNote) -> Self {
        ReviewNoteRow {
            id: note.id,
            project_id: note.project_id,
            text: note.text.clone(),
            is_reviewed: Some(note.is_reviewed),
            created_by: Some(note.created_by.clone()),
            created_at: Some(note.created_at),
            reviewed_at: note.reviewed_at,
            reviewed_by: note.reviewed_by.clone(),
        }
    }
}

/// Serialize a row for the store. Row types contain only string keys, so this cannot fail.
pub fn to_value<T: Serialize>(row: &T) -> Value {
    serde_json::to_value(row).unwrap_or(Value::Null)
}

/// Decode rows, skipping (and logging) any that do not match the expected shape.
fn decode<T: DeserializeOwned>(resource: Resource, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(%resource, error = %e, "skipping malformed row");
                None
            }
        })
        .collect()
}

/// Read all five project resources once and join them into project trees.
pub fn load_projects(store: &dyn RecordStore) -> Result<Vec<Project>, StoreError> {
    let projects: Vec<ProjectRow> = decode(Resource::Projects, store.select_all(Resource::Projects)?);
    let tasks: Vec<TaskRow> = decode(Resource::Tasks, store.select_all(Resource::Tasks)?);
    let entries: Vec<TimeEntryRow> = decode(Resource::TimeEntries, store.select_all(Resource::TimeEntries)?);
    let comments: Vec<CommentRow> = decode(Resource::Comments, store.select_all(Resource::Comments)?);
    let notes: Vec<ReviewNoteRow> = decode(Resource::ReviewNotes, store.select_all(Resource::ReviewNotes)?);
    Ok(join(projects, tasks, entries, comments, notes))
}

/// Stitch flat rows back together by `project_id` / `task_id`.
pub fn join(
    projects: Vec<ProjectRow>,
    tasks: Vec<TaskRow>,
    entries: Vec<TimeEntryRow>,
    comments: Vec<CommentRow>,
    notes: Vec<ReviewNoteRow>,
) -> Vec<Project> {
    let mut out: Vec<Project> = projects.into_iter().map(ProjectRow::into_project).collect();
    let project_created: HashMap<Uuid, DateTime<Utc>> = out.iter().map(|p| (p.id, p.created_at)).collect();
    let project_stamp = |id: &Uuid| project_created.get(id).copied().unwrap_or(LEGACY_STAMP);

    let tasks: Vec<Task> = tasks
        .into_iter()
        .map(|row| {
            let fallback = project_stamp(&row.project_id);
            row.into_task(fallback)
        })
        .collect();
    let task_created: HashMap<Uuid, DateTime<Utc>> = tasks.iter().map(|t| (t.id, t.created_at)).collect();
    let task_stamp = |id: &Uuid| task_created.get(id).copied().unwrap_or(LEGACY_STAMP);

    let mut entries_by_task: HashMap<Uuid, Vec<TimeEntry>> = HashMap::new();
    for row in entries {
        entries_by_task.entry(row.task_id).or_default().push(TimeEntry {
            id: row.id,
            duration: row.duration,
            category: row.category,
            note: row.note.unwrap_or_default(),
            created_at: row.created_at.unwrap_or_else(|| task_stamp(&row.task_id)),
            created_by: row.created_by.unwrap_or_else(|| UNKNOWN_CREATOR.into()),
        });
    }

    let mut comments_by_task: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for row in comments {
        comments_by_task.entry(row.task_id).or_default().push(Comment {
            id: row.id,
            text: row.text,
            created_at: row.created_at.unwrap_or_else(|| task_stamp(&row.task_id)),
            created_by: row.created_by.unwrap_or_else(|| UNKNOWN_CREATOR.into()),
        });
    }

    let mut tasks_by_project: HashMap<Uuid, Vec<Task>> = HashMap::new();
    for mut task in tasks {
        task.time_entries = entries_by_task.remove(&task.id).unwrap_or_default();
        task.time_entries.sort_by_key(|e| e.created_at);
        task.comments = comments_by_task.remove(&task.id).unwrap_or_default();
        task.comments.sort_by_key(|c| c.created_at);
        tasks_by_project.entry(task.project_id).or_default().push(task);
    }

    let mut notes_by_project: HashMap<Uuid, Vec<ReviewNote>> = HashMap::new();
    for row in notes {
        notes_by_project.entry(row.project_id).or_default().push(ReviewNote {
            id: row.id,
            project_id: row.project_id,
            text: row.text,
            is_reviewed: row.is_reviewed.unwrap_or(false),
            created_at: row.created_at.unwrap_or_else(|| project_stamp(&row.project_id)),
            created_by: row.created_by.unwrap_or_else(|| UNKNOWN_CREATOR.into()),
            reviewed_at: row.reviewed_at,
            reviewed_by: row.reviewed_by,
        });
    }

    for project in &mut out {
        project.tasks = tasks_by_project.remove(&project.id).unwrap_or_default();
        project.review_notes = notes_by_project.remove(&project.id).unwrap_or_default();
        project.review_notes.sort_by_key(|n| n.created_at);
        project.recompute_blocked();
    }
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

/// Load users and departments, falling back to the built-in directory when the store has none.
pub fn load_reference(store: &dyn RecordStore) -> Result<(ReferenceData, bool), StoreError> {
    let users: Vec<User> = decode(Resource::Users, store.select_all(Resource::Users)?);
    let departments: Vec<Department> = decode(Resource::Departments, store.select_all(Resource::Departments)?);
    if users.is_empty() {
        return Ok((ReferenceData::seeded(), true));
    }
    Ok((ReferenceData::new(users, departments), false))
}
