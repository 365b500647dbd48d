//! Enumerations and field types for installation project tracking.
//!
//! This module defines the closed vocabularies shared by projects, tasks and
//! templates: task statuses, task and time categories, project kinds and types,
//! lead-time classes, user roles and the milestone checkpoint values.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Workflow status of a single task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Backlog,
    Ready,
    InProgress,
    Blocked,
    Waiting,
    Done,
    Canceled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 7] = [
        TaskStatus::Backlog,
        TaskStatus::Ready,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Waiting,
        TaskStatus::Done,
        TaskStatus::Canceled,
    ];

    /// Done and Canceled both close out a task for milestone purposes.
    pub fn is_closed(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Canceled)
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "Backlog",
            TaskStatus::Ready => "Ready",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Blocked => "Blocked",
            TaskStatus::Waiting => "Waiting",
            TaskStatus::Done => "Done",
            TaskStatus::Canceled => "Canceled",
        }
    }
}

/// Kind of work a task represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum TaskCategory {
    Setup,
    Configuration,
    Installation,
    Training,
    Testing,
    Documentation,
    #[serde(rename = "Punch List")]
    PunchList,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 7] = [
        TaskCategory::Setup,
        TaskCategory::Configuration,
        TaskCategory::Installation,
        TaskCategory::Training,
        TaskCategory::Testing,
        TaskCategory::Documentation,
        TaskCategory::PunchList,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskCategory::Setup => "Setup",
            TaskCategory::Configuration => "Configuration",
            TaskCategory::Installation => "Installation",
            TaskCategory::Training => "Training",
            TaskCategory::Testing => "Testing",
            TaskCategory::Documentation => "Documentation",
            TaskCategory::PunchList => "Punch List",
        }
    }
}

/// Billing bucket for logged and quoted hours.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum TimeCategory {
    #[serde(rename = "PM Time")]
    PmTime,
    #[serde(rename = "Application Management / Install")]
    AppInstall,
    #[serde(rename = "Build Time")]
    BuildTime,
    #[serde(rename = "DB Conversion")]
    DbConversion,
    #[serde(rename = "Onsite Install – Work")]
    OnsiteWork,
    #[serde(rename = "Onsite Install – Travel")]
    OnsiteTravel,
}

impl TimeCategory {
    pub const ALL: [TimeCategory; 6] = [
        TimeCategory::PmTime,
        TimeCategory::AppInstall,
        TimeCategory::BuildTime,
        TimeCategory::DbConversion,
        TimeCategory::OnsiteWork,
        TimeCategory::OnsiteTravel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeCategory::PmTime => "PM Time",
            TimeCategory::AppInstall => "Application Management / Install",
            TimeCategory::BuildTime => "Build Time",
            TimeCategory::DbConversion => "DB Conversion",
            TimeCategory::OnsiteWork => "Onsite Install – Work",
            TimeCategory::OnsiteTravel => "Onsite Install – Travel",
        }
    }

    /// Accepts either the display label or the kebab-case CLI name.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .or_else(|| <Self as ValueEnum>::from_str(s, true).ok())
            .ok_or_else(|| ValidationError::UnknownLabel {
                field: "time category",
                value: s.to_string(),
            })
    }
}

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
pub enum ProjectStatus {
    #[default]
    Open,
    Closed,
}

/// Coarse project classification that selects the milestone checkpoint sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectKind {
    Hardware,
    SoftwareOnly,
}

impl ProjectKind {
    pub fn label(self) -> &'static str {
        match self {
            ProjectKind::Hardware => "Hardware",
            ProjectKind::SoftwareOnly => "Software Only",
        }
    }
}

/// Fine-grained project type used to pick templates at creation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum ProjectType {
    SoftwareOnly,
    HardwareOnly,
    HardwareSoftware,
}

impl ProjectType {
    pub const ALL: [ProjectType; 3] = [
        ProjectType::SoftwareOnly,
        ProjectType::HardwareOnly,
        ProjectType::HardwareSoftware,
    ];

    /// Collapse to the project kind: anything with hardware is `Hardware`.
    pub fn kind(self) -> ProjectKind {
        match self {
            ProjectType::SoftwareOnly => ProjectKind::SoftwareOnly,
            ProjectType::HardwareOnly | ProjectType::HardwareSoftware => ProjectKind::Hardware,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProjectType::SoftwareOnly => "Software Only",
            ProjectType::HardwareOnly => "Hardware Only",
            ProjectType::HardwareSoftware => "Hardware + Software",
        }
    }
}

/// Lead-time classification quoted to the customer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
pub enum LeadTimeType {
    SoftwareOnly,
    SoftwareAndHardware,
    HardwareOnly,
    /// Fallback for rows written without a lead-time class.
    #[default]
    #[serde(other)]
    Standard,
}

/// Role of a user in the organisation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "PM")]
    Pm,
    Technician,
    Admin,
}

impl Role {
    pub fn is_manager(self) -> bool {
        matches!(self, Role::Pm | Role::Admin)
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Pm => "PM",
            Role::Technician => "Technician",
            Role::Admin => "Admin",
        }
    }
}

/// A progress checkpoint: one of 20, 40, 60, 80, 90 or 100 percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Milestone(u8);

impl Milestone {
    pub const M20: Milestone = Milestone(20);
    pub const M40: Milestone = Milestone(40);
    pub const M60: Milestone = Milestone(60);
    pub const M80: Milestone = Milestone(80);
    pub const M90: Milestone = Milestone(90);
    pub const M100: Milestone = Milestone(100);

    pub const ALL: [Milestone; 6] = [
        Milestone::M20,
        Milestone::M40,
        Milestone::M60,
        Milestone::M80,
        Milestone::M90,
        Milestone::M100,
    ];

    /// The last checkpoint; punch-list work lands here.
    pub const TERMINAL: Milestone = Milestone::M100;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Milestone {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Milestone::ALL
            .into_iter()
            .find(|m| m.0 == value)
            .ok_or(ValidationError::Milestone(value as i64))
    }
}

impl From<Milestone> for u8 {
    fn from(m: Milestone) -> u8 {
        m.0
    }
}

impl FromStr for Milestone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().trim_end_matches('%');
        let value: i64 = raw.parse().map_err(|_| ValidationError::UnknownLabel {
            field: "milestone",
            value: s.to_string(),
        })?;
        u8::try_from(value)
            .map_err(|_| ValidationError::Milestone(value))
            .and_then(Milestone::try_from)
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Workflow-stage labels a new phase catalog starts with.
pub const PHASES: [&str; 8] = [
    "Special Proj. Notes",
    "Inhouse Planning",
    "Inhouse-HW/SW",
    "Inhouse Documentation",
    "Site-HW",
    "Site-SW",
    "Shipping/Install",
    "Go Live-Follow Up",
];
