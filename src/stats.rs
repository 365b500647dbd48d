//! Estimation helpers over the working set.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::MAX_DAYS;
use crate::fields::{TaskCategory, TaskStatus};
use crate::project::Project;

/// Actual hours spent on finished tasks resembling a given one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoricalStats {
    /// Mean actual hours, rounded to one decimal.
    pub avg_hours: f64,
    pub min_hours: f64,
    pub max_hours: f64,
    pub task_count: usize,
}

/// Stats over every `Done` task with time logged whose title contains (or is
/// contained in) `title`, case-insensitively, or whose category equals `category`.
/// `None` when nothing matches.
pub fn historical_stats<'a>(
    projects: impl IntoIterator<Item = &'a Project>,
    title: &str,
    category: Option<TaskCategory>,
) -> Option<HistoricalStats> {
    let needle = title.trim().to_lowercase();
    let actuals: Vec<f64> = projects
        .into_iter()
        .flat_map(|p| &p.tasks)
        .filter(|t| t.status == TaskStatus::Done && !t.time_entries.is_empty())
        .filter(|t| {
            let hay = t.title.to_lowercase();
            let title_match = !needle.is_empty() && (hay.contains(&needle) || needle.contains(&hay));
            title_match || category == Some(t.category)
        })
        .map(|t| t.logged_hours())
        .collect();

    if actuals.is_empty() {
        return None;
    }
    let total: f64 = actuals.iter().sum();
    let avg = total / actuals.len() as f64;
    Some(HistoricalStats {
        avg_hours: (avg * 10.0).round() / 10.0,
        min_hours: actuals.iter().copied().fold(f64::INFINITY, f64::min),
        max_hours: actuals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        task_count: actuals.len(),
    })
}

/// True when the project's latest task update is older than `stall_days`.
/// A project without tasks is never stalled.
pub fn is_stalled(project: &Project, stall_days: i64, now: DateTime<Utc>) -> bool {
    let Some(cutoff) = now.checked_sub_signed(Duration::days(stall_days.clamp(0, MAX_DAYS))) else {
        return false;
    };
    project.last_task_update().is_some_and(|last| last < cutoff)
}
