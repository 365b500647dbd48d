//! Review aggregation: what changed on each project since the last review cycle.
//!
//! The cursor (last review date plus the progress snapshot taken for every
//! project when that cycle was closed) lives in `review.json` beside the store.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::MAX_DAYS;
use crate::db::write_atomic;
use crate::error::Result;
use crate::progress::compute_progress;
use crate::project::Project;
use crate::repo::ProjectRepository;

/// Placeholder step used when no snapshot exists for a project.
const FALLBACK_STEP: u8 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectChangeSummary {
    pub project_id: Uuid,
    pub project_name: String,
    pub previous_progress: u8,
    pub current_progress: u8,
    pub progress_change: i16,
    pub tasks_added: usize,
    pub tasks_completed: usize,
    /// Reopen tracking does not exist yet; always zero.
    pub tasks_reopened: usize,
    pub has_blocked_tasks: bool,
    pub unreviewed_notes: usize,
}

/// Summarize a project's movement since `since`. Read-only.
pub fn change_summary(project: &Project, since: DateTime<Utc>, snapshot: Option<u8>) -> ProjectChangeSummary {
    let current = compute_progress(project);
    let previous = snapshot.unwrap_or_else(|| current.saturating_sub(FALLBACK_STEP));
    ProjectChangeSummary {
        project_id: project.id,
        project_name: project.name.clone(),
        previous_progress: previous,
        current_progress: current,
        progress_change: i16::from(current) - i16::from(previous),
        tasks_added: project.tasks.iter().filter(|t| t.created_at > since).count(),
        tasks_completed: project
            .tasks
            .iter()
            .filter(|t| t.status.is_closed() && t.updated_at > since)
            .count(),
        tasks_reopened: 0,
        has_blocked_tasks: project.has_blocked_tasks(),
        unreviewed_notes: project.unreviewed_notes(),
    }
}

/// Where the last review cycle ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCursor {
    pub last_review: DateTime<Utc>,
    #[serde(default)]
    pub snapshots: HashMap<Uuid, u8>,
}

impl ReviewCursor {
    /// A cursor with no history, looking back `window_days`.
    pub fn fresh(window_days: i64) -> Self {
        ReviewCursor {
            last_review: Utc::now() - Duration::days(window_days.clamp(0, MAX_DAYS)),
            snapshots: HashMap::new(),
        }
    }

    pub fn load(path: &Path, window_days: i64) -> Result<Self> {
        if !path.exists() {
            return Ok(ReviewCursor::fresh(window_days));
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, &serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn snapshot(&self, project_id: Uuid) -> Option<u8> {
        self.snapshots.get(&project_id).copied()
    }

    /// Summaries for every open project, measured from `since` (or the cursor).
    pub fn summaries(&self, repo: &ProjectRepository, since: Option<DateTime<Utc>>) -> Vec<ProjectChangeSummary> {
        let since = since.unwrap_or(self.last_review);
        repo.active_projects()
            .map(|p| change_summary(p, since, self.snapshot(p.id)))
            .collect()
    }

    /// Projects closed after the last review.
    pub fn closed_since<'a>(&self, repo: &'a ProjectRepository) -> Vec<&'a Project> {
        repo.closed_projects()
            .filter(|p| p.closed_at.is_some_and(|at| at > self.last_review))
            .collect()
    }

    /// Record each project's current progress and move the cursor to now.
    pub fn close_cycle(&mut self, repo: &ProjectRepository) -> usize {
        self.snapshots = repo
            .projects()
            .iter()
            .map(|p| (p.id, compute_progress(p)))
            .collect();
        self.last_review = Utc::now();
        info!(projects = self.snapshots.len(), at = %self.last_review, "review cycle closed");
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::*;
    use crate::outbox::Outbox;
    use crate::project::tests::{push_task, sample_project};
    use crate::repo::tests::actor;

    #[test]
    fn test_summary_counts_changes_after_cursor() {
        let mut p = sample_project(ProjectKind::Hardware);
        let since = Utc::now() - Duration::days(3);
        let old = push_task(&mut p, Milestone::M20, TaskStatus::Done);
        {
            let t = p.task_mut(old).unwrap();
            t.created_at = since - Duration::days(10);
            t.updated_at = since - Duration::days(1);
        }
        push_task(&mut p, Milestone::M40, TaskStatus::Done);
        push_task(&mut p, Milestone::M40, TaskStatus::Blocked);
        push_task(&mut p, Milestone::M60, TaskStatus::Canceled);

        let s = change_summary(&p, since, None);
        assert_eq!(s.tasks_added, 3);
        assert_eq!(s.tasks_completed, 2);
        assert_eq!(s.tasks_reopened, 0);
        assert!(s.has_blocked_tasks);
        assert_eq!(s.current_progress, 20);
        assert_eq!(s.previous_progress, 0);
        assert_eq!(s.progress_change, 20);
    }

    #[test]
    fn test_blocked_is_recomputed_not_cached() {
        let mut p = sample_project(ProjectKind::SoftwareOnly);
        push_task(&mut p, Milestone::M20, TaskStatus::Blocked);
        p.blocked = false;
        assert!(change_summary(&p, Utc::now(), None).has_blocked_tasks);
    }

    #[test]
    fn test_snapshot_replaces_placeholder() {
        let mut p = sample_project(ProjectKind::Hardware);
        for m in [Milestone::M20, Milestone::M40, Milestone::M60] {
            push_task(&mut p, m, TaskStatus::Done);
        }
        let placeholder = change_summary(&p, Utc::now(), None);
        assert_eq!((placeholder.previous_progress, placeholder.current_progress), (40, 60));
        let snap = change_summary(&p, Utc::now(), Some(20));
        assert_eq!(snap.previous_progress, 20);
        assert_eq!(snap.progress_change, 40);
        let regressed = change_summary(&p, Utc::now(), Some(80));
        assert_eq!(regressed.progress_change, -20);
    }

    #[test]
    fn test_close_cycle_snapshots_and_moves_cursor() {
        let mut p = sample_project(ProjectKind::Hardware);
        push_task(&mut p, Milestone::M20, TaskStatus::Done);
        let pid = p.id;
        let mut repo = ProjectRepository::new(Outbox::default());
        repo.merge(vec![p]);
        repo.add_review_note(pid, "Waiting on customer IT", &actor()).unwrap();

        let mut cursor = ReviewCursor::fresh(7);
        let before = cursor.last_review;
        assert_eq!(cursor.summaries(&repo, None)[0].unreviewed_notes, 1);
        assert_eq!(cursor.close_cycle(&repo), 1);
        assert!(cursor.last_review > before);
        assert_eq!(cursor.snapshot(pid), Some(20));

        let after = cursor.summaries(&repo, None);
        assert_eq!(after[0].previous_progress, 20);
        assert_eq!(after[0].progress_change, 0);
        assert_eq!(after[0].tasks_added, 0);
    }

    #[test]
    fn test_closed_since_last_review() {
        let mut repo = ProjectRepository::new(Outbox::default());
        let a = sample_project(ProjectKind::Hardware);
        let mut b = sample_project(ProjectKind::Hardware);
        b.status = ProjectStatus::Closed;
        b.closed_at = Some(Utc::now() - Duration::days(30));
        let (aid, bid) = (a.id, b.id);
        repo.merge(vec![a, b]);
        repo.close_project(aid).unwrap();

        let cursor = ReviewCursor::fresh(7);
        let closed: Vec<Uuid> = cursor.closed_since(&repo).iter().map(|p| p.id).collect();
        assert_eq!(closed, vec![aid]);
        assert!(!closed.contains(&bid));
        assert!(cursor.summaries(&repo, None).is_empty());
    }

    #[test]
    fn test_fresh_cursor_clamps_window() {
        let oldest = Utc::now() - ReviewCursor::fresh(100_000_000).last_review;
        assert!(oldest >= Duration::days(MAX_DAYS) && oldest < Duration::days(MAX_DAYS + 1));
        assert!(ReviewCursor::fresh(-4).last_review <= Utc::now());
    }

    #[test]
    fn test_cursor_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.json");
        let fresh = ReviewCursor::load(&path, 7).unwrap();
        let age = Utc::now() - fresh.last_review;
        assert!(age >= Duration::days(7) && age < Duration::days(8));

        let mut cursor = fresh.clone();
        let id = Uuid::new_v4();
        cursor.snapshots.insert(id, 80);
        cursor.save(&path).unwrap();
        let loaded = ReviewCursor::load(&path, 7).unwrap();
        assert_eq!(loaded, cursor);
    }
}
