//! Error types for the tracker core and its record store.

use thiserror::Error;

/// Rejected input, reported before any state changes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("milestone must be one of 20, 40, 60, 80, 90, 100 (got {0})")]
    Milestone(i64),
    #[error("duration must be greater than zero (got {0})")]
    Duration(f64),
    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("unknown {field} '{value}'")]
    UnknownLabel { field: &'static str, value: String },
    #[error("unknown user '{0}'")]
    UnknownUser(String),
    #[error("phase order must name every phase exactly once")]
    PhaseOrder,
    #[error("subtasks cannot be nested below another subtask")]
    NestedSubtask,
    #[error("review note has already been reviewed")]
    AlreadyReviewed,
}

/// Failure reported by a [`crate::db::RecordStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store rejected write to {resource}: {reason}")]
    Rejected { resource: &'static str, reason: String },
    #[error("record store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record store encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level error returned by repository operations and commands.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} '{query}' is ambiguous; candidates:\n{}", .candidates.join("\n"))]
    Ambiguous {
        kind: &'static str,
        query: String,
        candidates: Vec<String>,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TrackerError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        TrackerError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
