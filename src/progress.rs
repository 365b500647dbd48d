//! Milestone-based project progress.
//!
//! Progress is the highest checkpoint reached by an unbroken run of complete
//! checkpoints, scanning left to right. A checkpoint with no tasks is skipped; the
//! first checkpoint holding an open task ends the scan.

use crate::fields::{Milestone, ProjectKind};
use crate::project::Project;

const HARDWARE_SEQUENCE: [Milestone; 6] = Milestone::ALL;

// Software-only work has no hardware-ordering checkpoint.
const SOFTWARE_SEQUENCE: [Milestone; 5] = [
    Milestone::M20,
    Milestone::M60,
    Milestone::M80,
    Milestone::M90,
    Milestone::M100,
];

/// The ordered checkpoints that apply to a project kind.
pub fn milestone_sequence(kind: ProjectKind) -> &'static [Milestone] {
    match kind {
        ProjectKind::Hardware => &HARDWARE_SEQUENCE,
        ProjectKind::SoftwareOnly => &SOFTWARE_SEQUENCE,
    }
}

/// Completion percentage of a project: 0 or one of the checkpoint values.
pub fn compute_progress(project: &Project) -> u8 {
    let mut highest = 0;
    for &milestone in milestone_sequence(project.kind) {
        let mut tasks = project.tasks.iter().filter(|t| t.milestone == milestone).peekable();
        if tasks.peek().is_none() {
            continue;
        }
        if tasks.all(|t| t.status.is_closed()) {
            highest = milestone.value();
        } else {
            break;
        }
    }
    highest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TaskStatus;
    use crate::project::tests::{push_task, sample_project};

    #[test]
    fn test_sequences_per_kind() {
        let hw: Vec<u8> = milestone_sequence(ProjectKind::Hardware).iter().map(|m| m.value()).collect();
        let sw: Vec<u8> = milestone_sequence(ProjectKind::SoftwareOnly).iter().map(|m| m.value()).collect();
        assert_eq!(hw, vec![20, 40, 60, 80, 90, 100]);
        assert_eq!(sw, vec![20, 60, 80, 90, 100]);
    }

    #[test]
    fn test_no_tasks_is_zero() {
        assert_eq!(compute_progress(&sample_project(ProjectKind::Hardware)), 0);
        assert_eq!(compute_progress(&sample_project(ProjectKind::SoftwareOnly)), 0);
    }

    #[test]
    fn test_open_checkpoint_stops_the_scan() {
        let mut p = sample_project(ProjectKind::Hardware);
        push_task(&mut p, Milestone::M20, TaskStatus::Done);
        push_task(&mut p, Milestone::M20, TaskStatus::Done);
        push_task(&mut p, Milestone::M40, TaskStatus::InProgress);
        push_task(&mut p, Milestone::M60, TaskStatus::Done);
        push_task(&mut p, Milestone::M80, TaskStatus::Canceled);
        assert_eq!(compute_progress(&p), 20);
        assert_eq!(compute_progress(&p), compute_progress(&p));
    }

    #[test]
    fn test_empty_checkpoints_are_skipped() {
        let mut p = sample_project(ProjectKind::Hardware);
        push_task(&mut p, Milestone::M20, TaskStatus::Done);
        push_task(&mut p, Milestone::M80, TaskStatus::Canceled);
        push_task(&mut p, Milestone::M100, TaskStatus::Ready);
        assert_eq!(compute_progress(&p), 80);
    }

    #[test]
    fn test_software_projects_ignore_forty() {
        let mut p = sample_project(ProjectKind::SoftwareOnly);
        push_task(&mut p, Milestone::M20, TaskStatus::Done);
        push_task(&mut p, Milestone::M40, TaskStatus::Blocked);
        push_task(&mut p, Milestone::M60, TaskStatus::Done);
        assert_eq!(compute_progress(&p), 60);
        p.kind = ProjectKind::Hardware;
        assert_eq!(compute_progress(&p), 20);
    }

    #[test]
    fn test_first_checkpoint_open_is_zero() {
        let mut p = sample_project(ProjectKind::Hardware);
        push_task(&mut p, Milestone::M20, TaskStatus::Waiting);
        push_task(&mut p, Milestone::M40, TaskStatus::Done);
        assert_eq!(compute_progress(&p), 0);
    }

    #[test]
    fn test_fully_complete_project_is_hundred() {
        let mut p = sample_project(ProjectKind::Hardware);
        for m in Milestone::ALL {
            push_task(&mut p, m, TaskStatus::Done);
        }
        assert_eq!(compute_progress(&p), 100);
    }
}
