//! Settings and data-directory layout.
//!
//! Settings come from an optional `pmt.toml` in the data directory. Every key
//! has a default; unknown keys are an error so typos do not pass silently.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, ValidationError};
use crate::outbox::RetryPolicy;

pub const SETTINGS_FILE: &str = "pmt.toml";

/// Longest look-back accepted for day-count settings.
pub const MAX_DAYS: i64 = 3650;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// User id used when `--actor` is not given.
    pub default_actor: Option<String>,
    pub stall_days: i64,
    pub outbox: OutboxSettings,
    pub review: ReviewSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutboxSettings {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReviewSettings {
    pub default_window_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_actor: None,
            stall_days: 14,
            outbox: OutboxSettings::default(),
            review: ReviewSettings::default(),
        }
    }
}

impl Default for OutboxSettings {
    fn default() -> Self {
        OutboxSettings {
            max_attempts: 3,
            backoff_ms: 50,
        }
    }
}

impl Default for ReviewSettings {
    fn default() -> Self {
        ReviewSettings {
            default_window_days: 7,
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_days("stall_days", self.stall_days, 1)?;
        check_days("review.default_window_days", self.review.default_window_days, 0)
    }

    /// Read `pmt.toml` from `dir`; defaults when the file is absent.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Settings::default());
        }
        Settings::from_toml(&fs::read_to_string(path)?)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.outbox.max_attempts.max(1),
            backoff: Duration::from_millis(self.outbox.backoff_ms),
        }
    }
}

fn check_days(field: &'static str, value: i64, min: i64) -> Result<(), ValidationError> {
    if (min..=MAX_DAYS).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max: MAX_DAYS,
        })
    }
}

/// Files kept under the data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    /// `--dir`, else `$PMT_DIR`, else `$HOME/.pmt`.
    pub fn resolve(cli_dir: Option<PathBuf>) -> Self {
        let root = cli_dir
            .or_else(|| std::env::var_os("PMT_DIR").map(PathBuf::from))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".pmt")
            });
        DataPaths { root }
    }

    pub fn store(&self) -> PathBuf {
        self.root.join("store")
    }

    pub fn outbox(&self) -> PathBuf {
        self.root.join("outbox.json")
    }

    pub fn templates(&self) -> PathBuf {
        self.root.join("templates.json")
    }

    pub fn phases(&self) -> PathBuf {
        self.root.join("phases.json")
    }

    pub fn review(&self) -> PathBuf {
        self.root.join("review.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let s = Settings::from_toml("default_actor = \"rb\"\n[outbox]\nmax_attempts = 5\n").unwrap();
        assert_eq!(s.default_actor.as_deref(), Some("rb"));
        assert_eq!(s.stall_days, 14);
        assert_eq!(s.outbox, OutboxSettings { max_attempts: 5, backoff_ms: 50 });
        assert_eq!(s.review.default_window_days, 7);
        assert_eq!(s.retry_policy().backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(Settings::from_toml("stall_dayz = 3"), Err(TrackerError::Toml(_))));
        assert!(Settings::from_toml("[outbox]\nretries = 2").is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load(dir.path()).unwrap(), Settings::default());
        fs::write(dir.path().join(SETTINGS_FILE), "stall_days = 21\n[review]\ndefault_window_days = 14\n").unwrap();
        let s = Settings::load(dir.path()).unwrap();
        assert_eq!((s.stall_days, s.review.default_window_days), (21, 14));
    }

    #[test]
    fn test_day_counts_are_range_checked() {
        for text in [
            "stall_days = 100000000",
            "stall_days = -3",
            "stall_days = 0",
            "[review]\ndefault_window_days = 100000000",
            "[review]\ndefault_window_days = -1",
        ] {
            assert!(
                matches!(
                    Settings::from_toml(text),
                    Err(TrackerError::Validation(ValidationError::OutOfRange { .. }))
                ),
                "{text}"
            );
        }
        let s = Settings::from_toml("stall_days = 3650\n[review]\ndefault_window_days = 0").unwrap();
        assert_eq!((s.stall_days, s.review.default_window_days), (MAX_DAYS, 0));

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "stall_days = 100000000").unwrap();
        assert!(Settings::load(dir.path()).is_err());
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let s = Settings::from_toml("[outbox]\nmax_attempts = 0").unwrap();
        assert_eq!(s.retry_policy().max_attempts, 1);
    }

    #[test]
    fn test_explicit_dir_wins() {
        let paths = DataPaths::resolve(Some(PathBuf::from("/tmp/pmt-data")));
        assert_eq!(paths.store(), PathBuf::from("/tmp/pmt-data/store"));
        assert_eq!(paths.outbox(), PathBuf::from("/tmp/pmt-data/outbox.json"));
    }
}
