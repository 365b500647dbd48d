//! Project repository: the authoritative in-memory working set.
//!
//! Every mutation locates its project (and task or note) by identity, applies
//! the change, stamps `updated_at`, and enqueues the matching store writes on
//! the outbox. Callers observe the new state immediately whether or not the
//! store later accepts the write.

use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::{patch, RecordStore, Resource};
use crate::error::{Result, TrackerError, ValidationError};
use crate::fields::*;
use crate::outbox::Outbox;
use crate::project::{Project, ReviewNote};
use crate::records::{self, to_value, CommentRow, ProjectRow, ReviewNoteRow, TaskRow, TimeEntryRow};
use crate::reference::Actor;
use crate::task::{Comment, NewTask, Task, TimeEntry};

#[derive(Debug, Default)]
pub struct ProjectRepository {
    projects: Vec<Project>,
    outbox: Outbox,
}

impl ProjectRepository {
    pub fn new(outbox: Outbox) -> Self {
        ProjectRepository {
            projects: Vec::new(),
            outbox,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: Uuid) -> Result<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| TrackerError::not_found("project", id))
    }

    fn project_mut(&mut self, id: Uuid) -> Result<&mut Project> {
        self.projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| TrackerError::not_found("project", id))
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut Outbox {
        &mut self.outbox
    }

    pub fn active_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| p.is_open())
    }

    pub fn closed_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| !p.is_open())
    }

    /// Add loaded projects, keeping any project already held under the same id.
    pub fn merge(&mut self, loaded: Vec<Project>) -> usize {
        let mut added = 0;
        for project in loaded {
            if self.projects.iter().any(|p| p.id == project.id) {
                continue;
            }
            self.projects.push(project);
            added += 1;
        }
        added
    }

    /// Bulk-read the store once and merge the result. A failed read leaves the working set as-is.
    pub fn load_from(&mut self, store: &dyn RecordStore) -> usize {
        match records::load_projects(store) {
            Ok(loaded) => {
                let added = self.merge(loaded);
                debug!(added, "loaded projects from record store");
                added
            }
            Err(e) => {
                warn!(error = %e, "could not load projects from record store");
                0
            }
        }
    }

    /// Take ownership of a freshly built project and mirror it (and its tasks) to the store.
    pub fn insert_project(&mut self, project: Project, project_type: ProjectType) -> Uuid {
        let id = project.id;
        self.outbox.insert(
            Resource::Projects,
            vec![to_value(&ProjectRow::from_project(&project, project_type))],
        );
        if !project.tasks.is_empty() {
            let rows = project.tasks.iter().map(|t| to_value(&TaskRow::from(t))).collect();
            self.outbox.insert(Resource::Tasks, rows);
        }
        self.projects.push(project);
        id
    }

    pub fn set_task_status(&mut self, project_id: Uuid, task_id: Uuid, status: TaskStatus) -> Result<()> {
        let now = Utc::now();
        let project = self.project_mut(project_id)?;
        let task = project
            .task_mut(task_id)
            .ok_or_else(|| TrackerError::not_found("task", task_id))?;
        task.status = status;
        task.updated_at = now;
        project.updated_at = now;
        project.recompute_blocked();
        let blocked = project.blocked;
        debug!(%project_id, %task_id, status = status.label(), blocked, "task status changed");

        self.outbox.update(
            Resource::Tasks,
            task_id,
            patch([("status", json!(status)), ("updated_at", json!(now))]),
        );
        self.outbox.update(
            Resource::Projects,
            project_id,
            patch([("blocked", json!(blocked)), ("updated_at", json!(now))]),
        );
        Ok(())
    }

    pub fn add_time_entry(
        &mut self,
        project_id: Uuid,
        task_id: Uuid,
        duration: f64,
        category: TimeCategory,
        note: &str,
        actor: &Actor,
    ) -> Result<Uuid> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ValidationError::Duration(duration).into());
        }
        let now = Utc::now();
        let project = self.project_mut(project_id)?;
        let task = project
            .task_mut(task_id)
            .ok_or_else(|| TrackerError::not_found("task", task_id))?;
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            duration,
            category,
            note: note.trim().to_string(),
            created_at: now,
            created_by: actor.initials.clone(),
        };
        let row = to_value(&TimeEntryRow::new(task_id, &entry));
        let entry_id = entry.id;
        task.time_entries.push(entry);
        task.updated_at = now;
        project.updated_at = now;
        debug!(%project_id, %task_id, duration, category = category.label(), "time logged");

        self.outbox.insert(Resource::TimeEntries, vec![row]);
        Ok(entry_id)
    }

    pub fn add_comment(&mut self, project_id: Uuid, task_id: Uuid, text: &str, actor: &Actor) -> Result<Uuid> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty("comment").into());
        }
        let now = Utc::now();
        let project = self.project_mut(project_id)?;
        let task = project
            .task_mut(task_id)
            .ok_or_else(|| TrackerError::not_found("task", task_id))?;
        let comment = Comment {
            id: Uuid::new_v4(),
            text: text.to_string(),
            created_at: now,
            created_by: actor.initials.clone(),
        };
        let row = to_value(&CommentRow::new(task_id, &comment));
        let comment_id = comment.id;
        task.comments.push(comment);
        task.updated_at = now;
        project.updated_at = now;
        debug!(%project_id, %task_id, "comment added");

        self.outbox.insert(Resource::Comments, vec![row]);
        Ok(comment_id)
    }

    pub fn add_review_note(&mut self, project_id: Uuid, text: &str, actor: &Actor) -> Result<Uuid> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty("review note").into());
        }
        let now = Utc::now();
        let project = self.project_mut(project_id)?;
        let note = ReviewNote {
            id: Uuid::new_v4(),
            project_id,
            text: text.to_string(),
            is_reviewed: false,
            created_at: now,
            created_by: actor.initials.clone(),
            reviewed_at: None,
            reviewed_by: None,
        };
        let row = to_value(&ReviewNoteRow::from(&note));
        let note_id = note.id;
        project.review_notes.push(note);
        project.updated_at = now;
        debug!(%project_id, %note_id, "review note added");

        self.outbox.insert(Resource::ReviewNotes, vec![row]);
        Ok(note_id)
    }

    /// Mark a note reviewed. Returns false when it already was (the first stamp is kept).
    pub fn mark_note_reviewed(&mut self, project_id: Uuid, note_id: Uuid, actor: &Actor) -> Result<bool> {
        let now = Utc::now();
        let project = self.project_mut(project_id)?;
        let note = project
            .note_mut(note_id)
            .ok_or_else(|| TrackerError::not_found("review note", note_id))?;
        if !note.mark_reviewed(&actor.initials, now) {
            return Ok(false);
        }
        project.updated_at = now;
        debug!(%project_id, %note_id, "review note marked reviewed");
        self.enqueue_note_reviewed(note_id, actor, now);
        Ok(true)
    }

    fn enqueue_note_reviewed(&mut self, note_id: Uuid, actor: &Actor, now: chrono::DateTime<Utc>) {
        self.outbox.update(
            Resource::ReviewNotes,
            note_id,
            patch([
                ("is_reviewed", json!(true)),
                ("reviewed_at", json!(now)),
                ("reviewed_by", json!(actor.initials)),
            ]),
        );
    }

    /// Turn an unreviewed note into a punch-list task at the final checkpoint.
    pub fn convert_note_to_task(&mut self, project_id: Uuid, note_id: Uuid, actor: &Actor) -> Result<Uuid> {
        let now = Utc::now();
        let project = self.project_mut(project_id)?;
        let owner = project.owner.clone();
        let note = project
            .note_mut(note_id)
            .ok_or_else(|| TrackerError::not_found("review note", note_id))?;
        if note.is_reviewed {
            return Err(ValidationError::AlreadyReviewed.into());
        }
        let title = note.text.clone();
        note.mark_reviewed(&actor.initials, now);

        let task = Task::from_new(
            project_id,
            NewTask {
                title,
                owner,
                parent_task_id: None,
                department_id: None,
                status: TaskStatus::Ready,
                phase: None,
                milestone: Milestone::TERMINAL,
                category: TaskCategory::PunchList,
                estimated_hours: 1.0,
            },
            now,
        );
        let task_id = task.id;
        let row = to_value(&TaskRow::from(&task));
        project.tasks.push(task);
        project.updated_at = now;
        debug!(%project_id, %note_id, %task_id, "review note converted to punch-list task");

        self.outbox.insert(Resource::Tasks, vec![row]);
        self.enqueue_note_reviewed(note_id, actor, now);
        Ok(task_id)
    }

    /// Create a task from caller-supplied fields. Subtasks take milestone, phase and category from their parent.
    pub fn create_task(&mut self, project_id: Uuid, mut new: NewTask) -> Result<Uuid> {
        new.validate()?;
        let now = Utc::now();
        let project = self.project_mut(project_id)?;
        if let Some(parent_id) = new.parent_task_id {
            let parent = project
                .task(parent_id)
                .ok_or_else(|| TrackerError::not_found("task", parent_id))?;
            if parent.is_subtask() {
                return Err(ValidationError::NestedSubtask.into());
            }
            new.milestone = parent.milestone;
            new.phase = parent.phase.clone();
            new.category = parent.category;
        }
        let task = Task::from_new(project_id, new, now);
        let task_id = task.id;
        let row = to_value(&TaskRow::from(&task));
        project.tasks.push(task);
        project.updated_at = now;
        project.recompute_blocked();
        let blocked = project.blocked;
        debug!(%project_id, %task_id, blocked, "task created");

        self.outbox.insert(Resource::Tasks, vec![row]);
        self.outbox.update(
            Resource::Projects,
            project_id,
            patch([("blocked", json!(blocked)), ("updated_at", json!(now))]),
        );
        Ok(task_id)
    }

    pub fn close_project(&mut self, project_id: Uuid) -> Result<()> {
        self.set_project_status(project_id, ProjectStatus::Closed)
    }

    pub fn reopen_project(&mut self, project_id: Uuid) -> Result<()> {
        self.set_project_status(project_id, ProjectStatus::Open)
    }

    fn set_project_status(&mut self, project_id: Uuid, status: ProjectStatus) -> Result<()> {
        let now = Utc::now();
        let project = self.project_mut(project_id)?;
        if project.status == status {
            return Ok(());
        }
        project.status = status;
        project.closed_at = (status == ProjectStatus::Closed).then_some(now);
        project.updated_at = now;
        let closed_at = project.closed_at;
        debug!(%project_id, ?status, "project status changed");

        self.outbox.update(
            Resource::Projects,
            project_id,
            patch([
                ("status", json!(status)),
                ("closed_at", json!(closed_at)),
                ("updated_at", json!(now)),
            ]),
        );
        Ok(())
    }

    /// Resolve a project by full id, unique id prefix, or case-insensitive name.
    pub fn resolve_project(&self, query: &str) -> Result<Uuid> {
        resolve("project", query, self.projects.iter().map(|p| (p.id, p.name.as_str())))
    }

    /// Resolve a task of a project by full id, unique id prefix, or case-insensitive title.
    pub fn resolve_task(&self, project_id: Uuid, query: &str) -> Result<Uuid> {
        let project = self.project(project_id)?;
        resolve("task", query, project.tasks.iter().map(|t| (t.id, t.title.as_str())))
    }

    /// Resolve a review note of a project by full id or unique id prefix.
    pub fn resolve_note(&self, project_id: Uuid, query: &str) -> Result<Uuid> {
        let project = self.project(project_id)?;
        resolve("review note", query, project.review_notes.iter().map(|n| (n.id, "")))
    }
}

fn resolve<'a>(
    kind: &'static str,
    query: &str,
    candidates: impl Iterator<Item = (Uuid, &'a str)>,
) -> Result<Uuid> {
    let query = query.trim();
    let candidates: Vec<(Uuid, &str)> = candidates.collect();
    if let Ok(id) = Uuid::parse_str(query) {
        return candidates
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(cid, _)| *cid)
            .ok_or_else(|| TrackerError::not_found(kind, id));
    }

    let needle = query.to_lowercase();
    let matches: Vec<(Uuid, &str)> = candidates
        .into_iter()
        .filter(|(id, name)| {
            (!needle.is_empty() && id.to_string().starts_with(&needle))
                || (!name.is_empty() && name.to_lowercase() == needle)
        })
        .collect();

    match matches.len() {
        0 => Err(TrackerError::not_found(kind, query)),
        1 => Ok(matches[0].0),
        _ => Err(TrackerError::Ambiguous {
            kind,
            query: query.to_string(),
            candidates: matches.iter().map(|(id, name)| format!("  {id}  {name}")).collect(),
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::outbox::RetryPolicy;
    use crate::project::tests::{push_task, sample_project};
    use std::time::Duration;

    pub(crate) fn actor() -> Actor {
        Actor::new("kh", "KH")
    }

    fn repo_with(project: Project) -> ProjectRepository {
        let mut repo = ProjectRepository::new(Outbox::new(RetryPolicy { max_attempts: 1, backoff: Duration::ZERO }));
        repo.merge(vec![project]);
        repo
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            owner: "RB".into(),
            parent_task_id: None,
            department_id: None,
            status: TaskStatus::Backlog,
            phase: None,
            milestone: Milestone::M40,
            category: TaskCategory::Setup,
            estimated_hours: 2.0,
        }
    }

    #[test]
    fn test_blocked_flag_follows_status_changes() {
        let mut p = sample_project(ProjectKind::Hardware);
        let a = push_task(&mut p, Milestone::M20, TaskStatus::InProgress);
        let b = push_task(&mut p, Milestone::M40, TaskStatus::Ready);
        let pid = p.id;
        let mut repo = repo_with(p);

        repo.set_task_status(pid, a, TaskStatus::Blocked).unwrap();
        assert!(repo.project(pid).unwrap().blocked);
        repo.set_task_status(pid, b, TaskStatus::Blocked).unwrap();
        repo.set_task_status(pid, a, TaskStatus::Done).unwrap();
        assert!(repo.project(pid).unwrap().blocked, "b is still blocked");
        repo.set_task_status(pid, b, TaskStatus::Waiting).unwrap();
        assert!(!repo.project(pid).unwrap().blocked);
    }

    #[test]
    fn test_status_change_stamps_task_and_project() {
        let mut p = sample_project(ProjectKind::Hardware);
        let t = push_task(&mut p, Milestone::M20, TaskStatus::Backlog);
        let before = p.updated_at;
        let pid = p.id;
        let mut repo = repo_with(p);
        repo.set_task_status(pid, t, TaskStatus::Done).unwrap();
        let project = repo.project(pid).unwrap();
        assert!(project.updated_at >= before);
        assert_eq!(project.task(t).unwrap().updated_at, project.updated_at);
        assert_eq!(repo.outbox().pending_len(), 2);
    }

    #[test]
    fn test_missing_ids_report_not_found() {
        let mut p = sample_project(ProjectKind::Hardware);
        let t = push_task(&mut p, Milestone::M20, TaskStatus::Backlog);
        let pid = p.id;
        let mut repo = repo_with(p);
        let ghost = Uuid::new_v4();
        assert!(matches!(
            repo.set_task_status(ghost, t, TaskStatus::Done),
            Err(TrackerError::NotFound { kind: "project", .. })
        ));
        assert!(matches!(
            repo.add_comment(pid, ghost, "hello", &actor()),
            Err(TrackerError::NotFound { kind: "task", .. })
        ));
        assert!(matches!(
            repo.mark_note_reviewed(pid, ghost, &actor()),
            Err(TrackerError::NotFound { kind: "review note", .. })
        ));
        assert_eq!(repo.outbox().pending_len(), 0);
    }

    #[test]
    fn test_time_entries_and_comments_are_attributed() {
        let mut p = sample_project(ProjectKind::Hardware);
        let t = push_task(&mut p, Milestone::M20, TaskStatus::InProgress);
        let pid = p.id;
        let mut repo = repo_with(p);
        let rb = Actor::new("rb", "RB");

        repo.add_time_entry(pid, t, 2.5, TimeCategory::BuildTime, " staging ", &rb).unwrap();
        repo.add_comment(pid, t, "Waiting on platform", &rb).unwrap();
        assert!(matches!(
            repo.add_time_entry(pid, t, 0.0, TimeCategory::BuildTime, "", &rb),
            Err(TrackerError::Validation(ValidationError::Duration(_)))
        ));
        assert!(repo.add_comment(pid, t, "  ", &rb).is_err());

        let task = repo.project(pid).unwrap().task(t).unwrap();
        assert_eq!(task.time_entries.len(), 1);
        assert_eq!(task.time_entries[0].created_by, "RB");
        assert_eq!(task.time_entries[0].note, "staging");
        assert_eq!(task.comments[0].created_by, "RB");

        let mut store = MemoryStore::default();
        repo.outbox_mut().flush(&mut store);
        assert_eq!(store.rows(Resource::TimeEntries)[0]["task_id"], json!(t));
        assert_eq!(store.rows(Resource::Comments)[0]["created_by"], "RB");
    }

    #[test]
    fn test_convert_note_to_task() {
        let p = sample_project(ProjectKind::SoftwareOnly);
        let pid = p.id;
        let mut repo = repo_with(p);
        let note = repo.add_review_note(pid, "Customer wants CSV export", &actor()).unwrap();
        assert_eq!(repo.project(pid).unwrap().unreviewed_notes(), 1);

        let task_id = repo.convert_note_to_task(pid, note, &actor()).unwrap();
        let project = repo.project(pid).unwrap();
        let task = project.task(task_id).unwrap();
        assert_eq!(task.title, "Customer wants CSV export");
        assert_eq!(task.milestone, Milestone::M100);
        assert_eq!(task.category, TaskCategory::PunchList);
        assert_eq!(task.status, TaskStatus::Ready);
        assert_eq!(task.estimated_hours, 1.0);
        assert_eq!(task.owner, project.owner);

        let n = &project.review_notes[0];
        assert!(n.is_reviewed);
        assert_eq!(n.reviewed_by.as_deref(), Some("KH"));
        assert!(n.reviewed_at.is_some());
        assert!(matches!(
            repo.convert_note_to_task(pid, note, &actor()),
            Err(TrackerError::Validation(ValidationError::AlreadyReviewed))
        ));
    }

    #[test]
    fn test_mark_reviewed_twice_keeps_first_stamp() {
        let p = sample_project(ProjectKind::Hardware);
        let pid = p.id;
        let mut repo = repo_with(p);
        let note = repo.add_review_note(pid, "Follow up with vendor", &actor()).unwrap();
        assert!(repo.mark_note_reviewed(pid, note, &actor()).unwrap());
        assert!(!repo.mark_note_reviewed(pid, note, &Actor::new("rb", "RB")).unwrap());
        let n = &repo.project(pid).unwrap().review_notes[0];
        assert_eq!(n.reviewed_by.as_deref(), Some("KH"));
        // insert + one update
        assert_eq!(repo.outbox().pending_len(), 2);
    }

    #[test]
    fn test_create_task_and_subtask_inheritance() {
        let mut p = sample_project(ProjectKind::Hardware);
        let pid = p.id;
        let parent = push_task(&mut p, Milestone::M80, TaskStatus::Backlog);
        p.task_mut(parent).unwrap().phase = Some("Site-HW".into());
        let mut repo = repo_with(p);

        let id = repo.create_task(pid, new_task("Order cables")).unwrap();
        assert_eq!(repo.project(pid).unwrap().task(id).unwrap().milestone, Milestone::M40);

        let mut sub = new_task("Run cable to indicator");
        sub.parent_task_id = Some(parent);
        sub.status = TaskStatus::Blocked;
        let sub_id = repo.create_task(pid, sub).unwrap();
        let project = repo.project(pid).unwrap();
        let sub = project.task(sub_id).unwrap();
        assert_eq!(sub.milestone, Milestone::M80);
        assert_eq!(sub.phase.as_deref(), Some("Site-HW"));
        assert!(project.blocked);

        let mut nested = new_task("Too deep");
        nested.parent_task_id = Some(sub_id);
        assert!(matches!(
            repo.create_task(pid, nested),
            Err(TrackerError::Validation(ValidationError::NestedSubtask))
        ));
        assert!(repo.create_task(pid, new_task("")).is_err());
    }

    #[test]
    fn test_blocked_task_creation_reaches_store() {
        let p = sample_project(ProjectKind::Hardware);
        let pid = p.id;
        let mut store = MemoryStore::default();
        store
            .insert(Resource::Projects, vec![to_value(&ProjectRow::from_project(&p, ProjectType::HardwareOnly))])
            .unwrap();
        let mut repo = repo_with(p);

        let mut task = new_task("Waiting on pit inspection");
        task.status = TaskStatus::Blocked;
        repo.create_task(pid, task).unwrap();
        assert_eq!(repo.outbox().pending_len(), 2);

        let report = repo.outbox_mut().flush(&mut store);
        assert_eq!(report.failed, 0);
        let row = &store.rows(Resource::Projects)[0];
        assert_eq!(row["blocked"], true);
        assert_eq!(row["updated_at"], json!(repo.project(pid).unwrap().updated_at));
    }

    #[test]
    fn test_store_outage_does_not_roll_back_memory() {
        let mut p = sample_project(ProjectKind::Hardware);
        let t = push_task(&mut p, Milestone::M20, TaskStatus::Backlog);
        let pid = p.id;
        let mut repo = repo_with(p);
        repo.set_task_status(pid, t, TaskStatus::Done).unwrap();

        let mut store = MemoryStore::default();
        store.available = false;
        let report = repo.outbox_mut().flush(&mut store);
        assert_eq!(report.failed, 2);
        assert_eq!(repo.project(pid).unwrap().task(t).unwrap().status, TaskStatus::Done);
        assert_eq!(repo.outbox().failures().len(), 2);
    }

    #[test]
    fn test_close_and_reopen() {
        let p = sample_project(ProjectKind::Hardware);
        let pid = p.id;
        let mut repo = repo_with(p);
        repo.close_project(pid).unwrap();
        assert!(repo.project(pid).unwrap().closed_at.is_some());
        assert_eq!(repo.closed_projects().count(), 1);
        repo.reopen_project(pid).unwrap();
        let project = repo.project(pid).unwrap();
        assert_eq!(project.status, ProjectStatus::Open);
        assert!(project.closed_at.is_none());
        assert_eq!(repo.active_projects().count(), 1);
    }

    #[test]
    fn test_merge_skips_known_ids_and_load_from_store() {
        let p = sample_project(ProjectKind::Hardware);
        let pid = p.id;
        let mut repo = repo_with(p.clone());
        let mut renamed = p;
        renamed.name = "Different".into();
        assert_eq!(repo.merge(vec![renamed, sample_project(ProjectKind::SoftwareOnly)]), 1);
        assert_eq!(repo.project(pid).unwrap().name, "Haas & Sons Scale Install");

        let mut store = MemoryStore::default();
        repo.insert_project(sample_project(ProjectKind::SoftwareOnly), ProjectType::SoftwareOnly);
        repo.outbox_mut().flush(&mut store);
        let mut fresh = ProjectRepository::default();
        assert_eq!(fresh.load_from(&store), 1);
        store.available = false;
        assert_eq!(fresh.load_from(&store), 0);
    }

    #[test]
    fn test_resolve_by_prefix_and_name() {
        let mut p = sample_project(ProjectKind::Hardware);
        let t = push_task(&mut p, Milestone::M20, TaskStatus::Backlog);
        let pid = p.id;
        let repo = repo_with(p);
        assert_eq!(repo.resolve_project("haas & sons scale install").unwrap(), pid);
        assert_eq!(repo.resolve_project(&pid.to_string()[..8]).unwrap(), pid);
        assert_eq!(repo.resolve_project(&pid.to_string()).unwrap(), pid);
        assert!(matches!(repo.resolve_project("nope"), Err(TrackerError::NotFound { .. })));
        assert_eq!(repo.resolve_task(pid, "20% TASK 1").unwrap(), t);
    }

    #[test]
    fn test_resolve_reports_ambiguity() {
        let ids = [Uuid::new_v4(), Uuid::new_v4()];
        let err = resolve("task", "Same", ids.iter().map(|id| (*id, "same"))).unwrap_err();
        match err {
            TrackerError::Ambiguous { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
