//! Project instantiation: build a new project and its task tree from the template library.

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::fields::*;
use crate::project::{Project, QuotedHours};
use crate::reference::ReferenceData;
use crate::repo::ProjectRepository;
use crate::task::{NewTask, Task};
use crate::template::TemplateLibrary;

/// Everything a caller supplies to open a new project.
#[derive(Debug, Clone)]
pub struct ProjectCreatePayload {
    pub name: String,
    pub customer: String,
    pub work_order_id: String,
    pub order_date: NaiveDate,
    pub project_type: ProjectType,
    pub lead_time_type: LeadTimeType,
    pub owner: String,
    pub reseller: Option<String>,
    pub scale_dealer: Option<String>,
    pub quoted_hours: QuotedHours,
}

impl ProjectCreatePayload {
    pub fn validate(&self, reference: &ReferenceData) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("project name"));
        }
        if self.customer.trim().is_empty() {
            return Err(ValidationError::Empty("customer"));
        }
        if self.owner.trim().is_empty() {
            return Err(ValidationError::Empty("owner"));
        }
        reference.require_user(&self.owner)?;
        if let Some((_, &hours)) = self
            .quoted_hours
            .iter()
            .find(|(_, h)| **h < 0.0 || h.is_nan())
        {
            return Err(ValidationError::Negative {
                field: "quoted hours",
                value: hours,
            });
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build the task tree for `project_type` from a snapshot of the library.
///
/// Tasks come out in template order (milestone, then order); each template's
/// subtasks follow their parent immediately.
pub fn tasks_from_templates(
    project_id: Uuid,
    library: &TemplateLibrary,
    project_type: ProjectType,
    owner: &str,
) -> Vec<Task> {
    let now = Utc::now();
    let mut tasks = Vec::new();
    for template in library.for_project_type(project_type) {
        let parent = Task::from_new(
            project_id,
            NewTask {
                title: template.title.clone(),
                owner: template.assignee.resolve(owner),
                parent_task_id: None,
                department_id: template.department_id.clone(),
                status: TaskStatus::Backlog,
                phase: template.phase.clone(),
                milestone: template.milestone,
                category: template.category,
                estimated_hours: template.estimated_hours,
            },
            now,
        );
        let parent_id = parent.id;
        tasks.push(parent);

        for subtask in template.ordered_subtasks() {
            tasks.push(Task::from_new(
                project_id,
                NewTask {
                    title: subtask.title.clone(),
                    owner: subtask.assignee.resolve(owner),
                    parent_task_id: Some(parent_id),
                    department_id: template.department_id.clone(),
                    status: TaskStatus::Backlog,
                    phase: template.phase.clone(),
                    milestone: template.milestone,
                    category: template.category,
                    estimated_hours: subtask.estimated_hours,
                },
                now,
            ));
        }
    }
    tasks
}

/// Create a project seeded from every template tagged with the payload's project type.
///
/// The project is held in memory as soon as this returns; the store writes sit
/// on the repository's outbox, so a store outage does not fail the call.
pub fn create_project_from_template(
    repo: &mut ProjectRepository,
    library: &TemplateLibrary,
    reference: &ReferenceData,
    payload: ProjectCreatePayload,
) -> Result<Uuid> {
    payload.validate(reference)?;
    let now = Utc::now();
    let id = Uuid::new_v4();
    let owner = payload.owner.trim().to_uppercase();
    let tasks = tasks_from_templates(id, library, payload.project_type, &owner);

    let project = Project {
        id,
        name: payload.name.trim().to_string(),
        customer: payload.customer.trim().to_string(),
        work_order_id: payload.work_order_id.trim().to_string(),
        order_date: payload.order_date,
        lead_time_type: payload.lead_time_type,
        reseller: non_blank(payload.reseller),
        scale_dealer: non_blank(payload.scale_dealer),
        owner,
        contributors: Vec::new(),
        status: ProjectStatus::Open,
        blocked: false,
        kind: payload.project_type.kind(),
        quoted_hours: payload.quoted_hours,
        tasks,
        review_notes: Vec::new(),
        created_at: now,
        updated_at: now,
        closed_at: None,
    };
    info!(
        %id,
        name = %project.name,
        project_type = payload.project_type.label(),
        tasks = project.tasks.len(),
        "project created from templates"
    );
    Ok(repo.insert_project(project, payload.project_type))
}
