//! Record store: the persistence collaborator behind the project repository.
//!
//! The core only needs three verbs against a resource: read every row, insert
//! rows, and patch a row by id. Rows are JSON objects with snake_case keys.
//! `JsonStore` keeps one JSON array per resource on disk; `MemoryStore` keeps
//! them in process and can simulate an outage.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Projects,
    Tasks,
    TimeEntries,
    Comments,
    ReviewNotes,
    Users,
    Departments,
}

impl Resource {
    pub fn name(self) -> &'static str {
        match self {
            Resource::Projects => "projects",
            Resource::Tasks => "tasks",
            Resource::TimeEntries => "time_entries",
            Resource::Comments => "comments",
            Resource::ReviewNotes => "review_notes",
            Resource::Users => "users",
            Resource::Departments => "departments",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request/response access to persisted rows.
pub trait RecordStore {
    fn select_all(&self, resource: Resource) -> Result<Vec<Value>, StoreError>;
    fn insert(&mut self, resource: Resource, rows: Vec<Value>) -> Result<(), StoreError>;
    fn update(&mut self, resource: Resource, id: &str, patch: Value) -> Result<(), StoreError>;
}

fn merge_patch(resource: Resource, rows: &mut [Value], id: &str, patch: Value) -> Result<(), StoreError> {
    let Value::Object(fields) = patch else {
        return Err(StoreError::Rejected {
            resource: resource.name(),
            reason: "patch must be an object".into(),
        });
    };
    let row = rows
        .iter_mut()
        .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| StoreError::Rejected {
            resource: resource.name(),
            reason: format!("no row with id {id}"),
        })?;
    for (k, v) in fields {
        row.insert(k, v);
    }
    Ok(())
}

fn check_rows(resource: Resource, rows: &[Value]) -> Result<(), StoreError> {
    for row in rows {
        if row.get("id").and_then(Value::as_str).is_none() {
            return Err(StoreError::Rejected {
                resource: resource.name(),
                reason: "row is missing a string id".into(),
            });
        }
    }
    Ok(())
}

/// File-backed store: `<dir>/<resource>.json`, each a JSON array of rows.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(JsonStore { dir })
    }

    fn path(&self, resource: Resource) -> PathBuf {
        self.dir.join(format!("{}.json", resource.name()))
    }

    fn read(&self, resource: Resource) -> Result<Vec<Value>, StoreError> {
        let path = self.path(resource);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut buf = String::new();
        File::open(&path)?.read_to_string(&mut buf)?;
        if buf.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&buf)?)
    }

    /// Atomic-ish write via temp + rename.
    fn write(&self, resource: Resource, rows: &[Value]) -> Result<(), StoreError> {
        let path = self.path(resource);
        write_atomic(&path, &serde_json::to_string_pretty(rows)?)
    }
}

pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp)?;
    f.write_all(data.as_bytes())?;
    f.flush()?;
    fs::rename(tmp, path)?;
    Ok(())
}

impl RecordStore for JsonStore {
    fn select_all(&self, resource: Resource) -> Result<Vec<Value>, StoreError> {
        self.read(resource)
    }

    fn insert(&mut self, resource: Resource, rows: Vec<Value>) -> Result<(), StoreError> {
        check_rows(resource, &rows)?;
        let mut existing = self.read(resource)?;
        existing.extend(rows);
        self.write(resource, &existing)
    }

    fn update(&mut self, resource: Resource, id: &str, patch: Value) -> Result<(), StoreError> {
        let mut rows = self.read(resource)?;
        merge_patch(resource, &mut rows, id, patch)?;
        self.write(resource, &rows)
    }
}

/// In-process store. Writes fail while `available` is false.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: HashMap<Resource, Vec<Value>>,
    pub available: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore {
            tables: HashMap::new(),
            available: true,
        }
    }
}

impl MemoryStore {
    pub fn rows(&self, resource: Resource) -> &[Value] {
        self.tables.get(&resource).map(Vec::as_slice).unwrap_or(&[])
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".into()))
        }
    }
}

impl RecordStore for MemoryStore {
    fn select_all(&self, resource: Resource) -> Result<Vec<Value>, StoreError> {
        self.check_available()?;
        Ok(self.rows(resource).to_vec())
    }

    fn insert(&mut self, resource: Resource, rows: Vec<Value>) -> Result<(), StoreError> {
        self.check_available()?;
        check_rows(resource, &rows)?;
        self.tables.entry(resource).or_default().extend(rows);
        Ok(())
    }

    fn update(&mut self, resource: Resource, id: &str, patch: Value) -> Result<(), StoreError> {
        self.check_available()?;
        let rows = self.tables.entry(resource).or_default();
        merge_patch(resource, rows, id, patch)
    }
}

/// Build a patch object from key/value pairs.
pub fn patch<I, K>(fields: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect::<Map<_, _>>())
}
