//! Task template library.
//!
//! Templates are reusable task blueprints tagged with the project types they
//! apply to. The library hands out clones on every read so callers can iterate
//! a snapshot while the library itself is edited.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::write_atomic;
use crate::error::{Result, TrackerError, ValidationError};
use crate::fields::*;

const PROJECT_OWNER: &str = "[ProjectOwner]";

/// Who a templated task is assigned to once instantiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Assignee {
    /// Whoever owns the project being created.
    ProjectOwner,
    /// A fixed user reference.
    User(String),
}

impl Assignee {
    /// Resolve to an uppercase user reference for a project owned by `owner`.
    pub fn resolve(&self, owner: &str) -> String {
        match self {
            Assignee::ProjectOwner => owner.to_uppercase(),
            Assignee::User(user) => user.to_uppercase(),
        }
    }
}

impl From<String> for Assignee {
    fn from(s: String) -> Self {
        if s == PROJECT_OWNER {
            Assignee::ProjectOwner
        } else {
            Assignee::User(s)
        }
    }
}

impl From<Assignee> for String {
    fn from(a: Assignee) -> String {
        match a {
            Assignee::ProjectOwner => PROJECT_OWNER.to_string(),
            Assignee::User(user) => user,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskTemplate {
    pub id: String,
    pub title: String,
    pub estimated_hours: f64,
    pub assignee: Assignee,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: String,
    pub title: String,
    pub project_types: Vec<ProjectType>,
    pub phase: Option<String>,
    pub milestone: Milestone,
    pub category: TaskCategory,
    pub estimated_hours: f64,
    pub assignee: Assignee,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskTemplate>,
    /// Position among templates sharing the same milestone.
    pub order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskTemplate {
    pub fn applies_to(&self, project_type: ProjectType) -> bool {
        self.project_types.contains(&project_type)
    }

    /// Subtask blueprints in their own order.
    pub fn ordered_subtasks(&self) -> Vec<&SubtaskTemplate> {
        let mut subtasks: Vec<&SubtaskTemplate> = self.subtasks.iter().collect();
        subtasks.sort_by_key(|s| s.order);
        subtasks
    }
}

/// Fields a caller supplies for a new template; id, order and stamps are assigned.
#[derive(Debug, Clone)]
pub struct TemplateDraft {
    pub title: String,
    pub project_types: Vec<ProjectType>,
    pub phase: Option<String>,
    pub milestone: Milestone,
    pub category: TaskCategory,
    pub estimated_hours: f64,
    pub assignee: Assignee,
    pub department_id: Option<String>,
}

impl TemplateDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Empty("template title"));
        }
        if self.project_types.is_empty() {
            return Err(ValidationError::Empty("template project types"));
        }
        check_hours(self.estimated_hours)
    }
}

fn check_hours(hours: f64) -> Result<(), ValidationError> {
    if hours < 0.0 || hours.is_nan() {
        return Err(ValidationError::Negative {
            field: "estimated hours",
            value: hours,
        });
    }
    Ok(())
}

/// The ordered catalog of task templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateLibrary {
    templates: Vec<TaskTemplate>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<TaskTemplate>) -> Self {
        TemplateLibrary { templates }
    }

    /// Load the library from a JSON file, seeding the default catalog if the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(TemplateLibrary::default_catalog());
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    /// Save via temp file + rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, &serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn list(&self) -> Vec<TaskTemplate> {
        self.templates.clone()
    }

    pub fn get(&self, id: &str) -> Option<TaskTemplate> {
        self.templates.iter().find(|t| t.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Insert or replace a template by id.
    pub fn put(&mut self, mut template: TaskTemplate) {
        template.updated_at = Utc::now();
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(slot) => *slot = template,
            None => self.templates.push(template),
        }
    }

    pub fn delete(&mut self, id: &str) -> Result<TaskTemplate> {
        let idx = self
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TrackerError::not_found("template", id))?;
        Ok(self.templates.remove(idx))
    }

    /// The order slot after every template currently at `milestone`.
    pub fn next_order(&self, milestone: Milestone) -> u32 {
        self.templates
            .iter()
            .filter(|t| t.milestone == milestone)
            .map(|t| t.order)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Create a template placed after every existing template at its milestone.
    pub fn create(&mut self, draft: TemplateDraft) -> Result<TaskTemplate> {
        draft.validate()?;
        let order = self.next_order(draft.milestone);
        let now = Utc::now();
        let template = TaskTemplate {
            id: format!("tmpl-{}", Uuid::new_v4().simple()),
            title: draft.title.trim().to_string(),
            project_types: draft.project_types,
            phase: draft.phase,
            milestone: draft.milestone,
            category: draft.category,
            estimated_hours: draft.estimated_hours,
            assignee: draft.assignee,
            department_id: draft.department_id,
            subtasks: Vec::new(),
            order,
            created_at: now,
            updated_at: now,
        };
        self.templates.push(template.clone());
        Ok(template)
    }

    /// Append a subtask blueprint to a template.
    pub fn add_subtask(
        &mut self,
        template_id: &str,
        title: &str,
        estimated_hours: f64,
        assignee: Assignee,
    ) -> Result<SubtaskTemplate> {
        if title.trim().is_empty() {
            return Err(ValidationError::Empty("subtask title").into());
        }
        check_hours(estimated_hours)?;
        let template = self
            .templates
            .iter_mut()
            .find(|t| t.id == template_id)
            .ok_or_else(|| TrackerError::not_found("template", template_id))?;
        let order = template.subtasks.iter().map(|s| s.order).max().unwrap_or(0) + 1;
        let subtask = SubtaskTemplate {
            id: format!("{}-s{}", template.id, order),
            title: title.trim().to_string(),
            estimated_hours,
            assignee,
            order,
        };
        template.subtasks.push(subtask.clone());
        template.updated_at = Utc::now();
        Ok(subtask)
    }

    /// Templates tagged with `project_type`, by milestone then order.
    pub fn for_project_type(&self, project_type: ProjectType) -> Vec<TaskTemplate> {
        let mut selected: Vec<TaskTemplate> = self
            .templates
            .iter()
            .filter(|t| t.applies_to(project_type))
            .cloned()
            .collect();
        selected.sort_by_key(|t| (t.milestone, t.order));
        selected
    }

    /// The stock catalog shipped with the tool.
    pub fn default_catalog() -> Self {
        use ProjectType::*;
        const ALL: &[ProjectType] = &[SoftwareOnly, HardwareOnly, HardwareSoftware];
        const HW: &[ProjectType] = &[HardwareOnly, HardwareSoftware];
        const SW: &[ProjectType] = &[SoftwareOnly, HardwareSoftware];

        let rows: [(&str, &[ProjectType], Milestone, TaskCategory, f64, &str, u32); 16] = [
            ("Initial customer kickoff call", ALL, Milestone::M20, TaskCategory::Setup, 1.0, PROJECT_OWNER, 1),
            ("Gather site requirements", HW, Milestone::M20, TaskCategory::Setup, 2.0, PROJECT_OWNER, 2),
            ("Current system analysis", SW, Milestone::M20, TaskCategory::Setup, 3.0, PROJECT_OWNER, 3),
            ("Hardware order placed and confirmed", HW, Milestone::M40, TaskCategory::Setup, 1.0, "jm", 1),
            ("Database conversion planning", SW, Milestone::M40, TaskCategory::Configuration, 4.0, PROJECT_OWNER, 2),
            ("Software configuration", SW, Milestone::M60, TaskCategory::Configuration, 8.0, PROJECT_OWNER, 1),
            ("Hardware staging and testing", HW, Milestone::M60, TaskCategory::Installation, 6.0, "jm", 2),
            ("Database migration", SW, Milestone::M60, TaskCategory::Configuration, 8.0, PROJECT_OWNER, 3),
            ("Onsite installation", HW, Milestone::M80, TaskCategory::Installation, 16.0, PROJECT_OWNER, 1),
            ("Software installation and configuration", &[SoftwareOnly], Milestone::M80, TaskCategory::Installation, 6.0, PROJECT_OWNER, 1),
            ("User training session", ALL, Milestone::M80, TaskCategory::Training, 4.0, PROJECT_OWNER, 2),
            ("User acceptance testing", SW, Milestone::M80, TaskCategory::Testing, 4.0, PROJECT_OWNER, 3),
            ("Production cutover", SW, Milestone::M90, TaskCategory::Installation, 4.0, PROJECT_OWNER, 1),
            ("Go-live support", ALL, Milestone::M90, TaskCategory::Installation, 8.0, PROJECT_OWNER, 2),
            ("Final documentation handoff", ALL, Milestone::M100, TaskCategory::Documentation, 2.0, PROJECT_OWNER, 1),
            ("Project closeout documentation", ALL, Milestone::M100, TaskCategory::Documentation, 2.0, PROJECT_OWNER, 2),
        ];

        let stamp = Utc::now() - Duration::days(100);
        let templates = rows
            .into_iter()
            .enumerate()
            .map(|(i, (title, types, milestone, category, hours, assignee, order))| TaskTemplate {
                id: format!("tmpl-{}", i + 1),
                title: title.to_string(),
                project_types: types.to_vec(),
                phase: None,
                milestone,
                category,
                estimated_hours: hours,
                assignee: Assignee::from(assignee.to_string()),
                department_id: None,
                subtasks: Vec::new(),
                order,
                created_at: stamp,
                updated_at: stamp,
            })
            .collect();
        TemplateLibrary { templates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, milestone: Milestone) -> TemplateDraft {
        TemplateDraft {
            title: title.into(),
            project_types: vec![ProjectType::HardwareOnly],
            phase: Some("Site-HW".into()),
            milestone,
            category: TaskCategory::Installation,
            estimated_hours: 3.0,
            assignee: Assignee::ProjectOwner,
            department_id: None,
        }
    }

    #[test]
    fn test_assignee_serde_uses_sentinel() {
        let owner: Assignee = serde_json::from_str("\"[ProjectOwner]\"").unwrap();
        assert_eq!(owner, Assignee::ProjectOwner);
        let jm: Assignee = serde_json::from_str("\"jm\"").unwrap();
        assert_eq!(jm, Assignee::User("jm".into()));
        assert_eq!(serde_json::to_string(&Assignee::ProjectOwner).unwrap(), "\"[ProjectOwner]\"");
    }

    #[test]
    fn test_assignee_resolution_uppercases() {
        assert_eq!(Assignee::ProjectOwner.resolve("kh"), "KH");
        assert_eq!(Assignee::User("jm".into()).resolve("kh"), "JM");
    }

    #[test]
    fn test_for_project_type_filters_and_sorts() {
        let lib = TemplateLibrary::default_catalog();
        let sw = lib.for_project_type(ProjectType::SoftwareOnly);
        assert!(sw.iter().all(|t| t.applies_to(ProjectType::SoftwareOnly)));
        assert_eq!(sw.len(), 12);
        let keys: Vec<(u8, u32)> = sw.iter().map(|t| (t.milestone.value(), t.order)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(sw[0].title, "Initial customer kickoff call");
        assert_eq!(lib.for_project_type(ProjectType::HardwareSoftware).len(), 15);
    }

    #[test]
    fn test_create_appends_order_within_milestone() {
        let mut lib = TemplateLibrary::default_catalog();
        let t = lib.create(draft("Calibrate scales", Milestone::M80)).unwrap();
        assert_eq!(t.order, 4);
        let fresh = lib.create(draft("Empty milestone", Milestone::M100)).unwrap();
        assert_eq!(fresh.order, 3);
        let mut empty = TemplateLibrary::default();
        assert_eq!(empty.create(draft("First", Milestone::M40)).unwrap().order, 1);
        assert!(matches!(
            empty.create(draft(" ", Milestone::M40)),
            Err(TrackerError::Validation(ValidationError::Empty(_)))
        ));
    }

    #[test]
    fn test_reads_are_copies() {
        let mut lib = TemplateLibrary::default_catalog();
        let snapshot = lib.list();
        lib.delete("tmpl-1").unwrap();
        assert_eq!(snapshot.len(), 16);
        assert_eq!(lib.len(), 15);
        assert!(lib.get("tmpl-1").is_none());
        assert!(matches!(lib.delete("tmpl-1"), Err(TrackerError::NotFound { .. })));

        let mut edited = lib.get("tmpl-2").unwrap();
        edited.title = "Gather site requirements (revised)".into();
        assert_eq!(lib.get("tmpl-2").unwrap().title, "Gather site requirements");
        lib.put(edited);
        assert_eq!(lib.get("tmpl-2").unwrap().title, "Gather site requirements (revised)");
    }

    #[test]
    fn test_add_subtask_orders_and_validates() {
        let mut lib = TemplateLibrary::default_catalog();
        let a = lib.add_subtask("tmpl-9", "Mount platform", 6.0, Assignee::ProjectOwner).unwrap();
        let b = lib.add_subtask("tmpl-9", "Wire indicator", 2.0, Assignee::User("rb".into())).unwrap();
        assert_eq!((a.order, b.order), (1, 2));
        assert_eq!(lib.get("tmpl-9").unwrap().ordered_subtasks().len(), 2);
        assert!(lib.add_subtask("tmpl-9", "Bad", -1.0, Assignee::ProjectOwner).is_err());
        assert!(matches!(
            lib.add_subtask("missing", "x", 1.0, Assignee::ProjectOwner),
            Err(TrackerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_seeds_and_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        let mut lib = TemplateLibrary::load(&path).unwrap();
        assert_eq!(lib.len(), 16);
        lib.delete("tmpl-16").unwrap();
        lib.save(&path).unwrap();
        let reloaded = TemplateLibrary::load(&path).unwrap();
        assert_eq!(reloaded.len(), 15);
        assert_eq!(reloaded.get("tmpl-4").unwrap().assignee, Assignee::User("jm".into()));
    }
}
