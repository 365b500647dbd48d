//! The editable list of workflow phases tasks and templates are grouped under.
//!
//! Persisted to `phases.json` beside the template library and seeded from
//! [`PHASES`] on first use.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::write_atomic;
use crate::error::{Result, ValidationError};
use crate::fields::PHASES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseCatalog {
    phases: Vec<String>,
}

impl Default for PhaseCatalog {
    fn default() -> Self {
        PhaseCatalog {
            phases: PHASES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PhaseCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(PhaseCatalog::default());
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, &serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn list(&self) -> &[String] {
        &self.phases
    }

    /// The catalog's spelling of `name` (case-insensitive match).
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.phases
            .iter()
            .find(|p| p.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn require(&self, name: &str) -> Result<String, ValidationError> {
        self.get(name)
            .map(str::to_string)
            .ok_or_else(|| ValidationError::UnknownLabel {
                field: "phase",
                value: name.trim().to_string(),
            })
    }

    /// Append a phase. Returns false when it is already listed.
    pub fn add(&mut self, name: &str) -> Result<bool, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty("phase name"));
        }
        if self.get(name).is_some() {
            return Ok(false);
        }
        self.phases.push(name.to_string());
        debug!(phase = name, "phase added");
        Ok(true)
    }

    /// Remove a phase. Returns false when it was not listed.
    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.phases.len();
        self.phases.retain(|p| !p.eq_ignore_ascii_case(name));
        before != self.phases.len()
    }

    /// Replace the order. `order` must name every current phase exactly once.
    pub fn reorder(&mut self, order: &[String]) -> Result<(), ValidationError> {
        let mut reordered = Vec::with_capacity(order.len());
        for name in order {
            let phase = self.require(name)?;
            if reordered.contains(&phase) {
                return Err(ValidationError::PhaseOrder);
            }
            reordered.push(phase);
        }
        if reordered.len() != self.phases.len() {
            return Err(ValidationError::PhaseOrder);
        }
        self.phases = reordered;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_seeded_from_defaults() {
        let phases = PhaseCatalog::default();
        assert_eq!(phases.list().len(), 8);
        assert_eq!(phases.list()[1], "Inhouse Planning");
        assert_eq!(phases.get("site-hw"), Some("Site-HW"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut phases = PhaseCatalog::default();
        assert!(phases.add("Remote Support").unwrap());
        assert!(!phases.add("Remote Support").unwrap());
        assert!(!phases.add(" remote support ").unwrap());
        assert_eq!(phases.list().len(), 9);
        assert_eq!(phases.list()[8], "Remote Support");
        assert_eq!(phases.add("  "), Err(ValidationError::Empty("phase name")));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut phases = PhaseCatalog::default();
        assert!(!phases.remove("Warehouse"));
        assert_eq!(phases, PhaseCatalog::default());
        assert!(phases.remove("Site-SW"));
        assert!(phases.get("Site-SW").is_none());
        assert_eq!(phases.list().len(), 7);
    }

    #[test]
    fn test_reorder_requires_every_phase_once() {
        let mut phases = PhaseCatalog { phases: names(&["Site-HW", "Site-SW", "Go Live-Follow Up"]) };
        phases.reorder(&names(&["go live-follow up", "Site-HW", "Site-SW"])).unwrap();
        assert_eq!(phases.list(), names(&["Go Live-Follow Up", "Site-HW", "Site-SW"]).as_slice());

        assert_eq!(phases.reorder(&names(&["Site-HW", "Site-SW"])), Err(ValidationError::PhaseOrder));
        assert_eq!(
            phases.reorder(&names(&["Site-HW", "Site-HW", "Site-SW"])),
            Err(ValidationError::PhaseOrder)
        );
        assert!(matches!(
            phases.reorder(&names(&["Site-HW", "Site-SW", "Warehouse"])),
            Err(ValidationError::UnknownLabel { field: "phase", .. })
        ));
        assert_eq!(phases.list()[0], "Go Live-Follow Up");
    }

    #[test]
    fn test_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phases.json");
        let mut phases = PhaseCatalog::load(&path).unwrap();
        assert_eq!(phases, PhaseCatalog::default());
        phases.add("Remote Support").unwrap();
        phases.save(&path).unwrap();
        assert_eq!(PhaseCatalog::load(&path).unwrap(), phases);
    }
}
