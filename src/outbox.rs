//! Write-behind queue between the in-memory repository and the record store.
//!
//! Mutations enqueue store operations and return immediately. `flush` delivers
//! them in order, retrying each with exponential backoff; operations that still
//! fail land in the failure channel instead of being dropped, and are persisted
//! with the queue so the next run retries them.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::db::{write_atomic, RecordStore, Resource};
use crate::error::{Result, StoreError};

/// A single pending write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreOp {
    Insert { resource: Resource, rows: Vec<Value> },
    Update { resource: Resource, id: String, patch: Value },
}

impl StoreOp {
    pub fn resource(&self) -> Resource {
        match self {
            StoreOp::Insert { resource, .. } | StoreOp::Update { resource, .. } => *resource,
        }
    }

    fn apply(&self, store: &mut dyn RecordStore) -> Result<(), StoreError> {
        match self {
            StoreOp::Insert { resource, rows } => store.insert(*resource, rows.clone()),
            StoreOp::Update { resource, id, patch } => store.update(*resource, id, patch.clone()),
        }
    }
}

/// An operation that exhausted its retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedOp {
    pub op: StoreOp,
    pub attempts: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OutboxFile {
    #[serde(default)]
    pending: Vec<StoreOp>,
    #[serde(default)]
    failed: Vec<FailedOp>,
}

#[derive(Debug, Default)]
pub struct Outbox {
    pending: VecDeque<StoreOp>,
    failed: Vec<FailedOp>,
    policy: RetryPolicy,
}

impl Outbox {
    pub fn new(policy: RetryPolicy) -> Self {
        Outbox {
            pending: VecDeque::new(),
            failed: Vec::new(),
            policy,
        }
    }

    /// Restore a saved queue. Previously failed operations are queued again, ahead of the rest.
    pub fn load(path: &Path, policy: RetryPolicy) -> Result<Self> {
        let mut outbox = Outbox::new(policy);
        if !path.exists() {
            return Ok(outbox);
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        let saved: OutboxFile = serde_json::from_str(&buf)?;
        // Failed ops are older than anything still pending.
        outbox.pending.extend(saved.failed.into_iter().map(|f| f.op));
        outbox.pending.extend(saved.pending);
        if !outbox.pending.is_empty() {
            debug!(count = outbox.pending.len(), "restored undelivered store operations");
        }
        Ok(outbox)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = OutboxFile {
            pending: self.pending.iter().cloned().collect(),
            failed: self.failed.clone(),
        };
        write_atomic(path, &serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn enqueue(&mut self, op: StoreOp) {
        self.pending.push_back(op);
    }

    pub fn insert(&mut self, resource: Resource, rows: Vec<Value>) {
        self.enqueue(StoreOp::Insert { resource, rows });
    }

    pub fn update(&mut self, resource: Resource, id: impl ToString, patch: Value) {
        self.enqueue(StoreOp::Update {
            resource,
            id: id.to_string(),
            patch,
        });
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn failures(&self) -> &[FailedOp] {
        &self.failed
    }

    pub fn take_failures(&mut self) -> Vec<FailedOp> {
        std::mem::take(&mut self.failed)
    }

    /// Deliver every pending operation in FIFO order. Never returns an error.
    pub fn flush(&mut self, store: &mut dyn RecordStore) -> FlushReport {
        let mut report = FlushReport::default();
        while let Some(op) = self.pending.pop_front() {
            let mut attempt = 0;
            loop {
                attempt += 1;
                match op.apply(store) {
                    Ok(()) => {
                        debug!(resource = %op.resource(), attempt, "store write delivered");
                        report.delivered += 1;
                        break;
                    }
                    Err(e) if attempt < self.policy.max_attempts => {
                        let delay = self.policy.delay(attempt - 1);
                        debug!(resource = %op.resource(), attempt, error = %e, ?delay, "store write failed, retrying");
                        if !delay.is_zero() {
                            thread::sleep(delay);
                        }
                    }
                    Err(e) => {
                        warn!(resource = %op.resource(), attempts = attempt, error = %e, "store write abandoned");
                        self.failed.push(FailedOp {
                            op,
                            attempts: attempt,
                            error: e.to_string(),
                            failed_at: Utc::now(),
                        });
                        report.failed += 1;
                        break;
                    }
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use serde_json::json;

    fn no_wait() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        }
    }

    /// Fails the first `failures` calls, then delegates to a memory store.
    struct Flaky {
        failures: u32,
        calls: u32,
        inner: MemoryStore,
    }

    impl RecordStore for Flaky {
        fn select_all(&self, resource: Resource) -> Result<Vec<Value>, StoreError> {
            self.inner.select_all(resource)
        }

        fn insert(&mut self, resource: Resource, rows: Vec<Value>) -> Result<(), StoreError> {
            self.calls += 1;
            if self.calls <= self.failures {
                return Err(StoreError::Unavailable("timeout".into()));
            }
            self.inner.insert(resource, rows)
        }

        fn update(&mut self, resource: Resource, id: &str, patch: Value) -> Result<(), StoreError> {
            self.inner.update(resource, id, patch)
        }
    }

    #[test]
    fn test_flush_delivers_in_order() {
        let mut outbox = Outbox::new(no_wait());
        outbox.insert(Resource::Tasks, vec![json!({"id": "t-1", "status": "Backlog"})]);
        outbox.update(Resource::Tasks, "t-1", json!({"status": "Done"}));
        let mut store = MemoryStore::default();
        let report = outbox.flush(&mut store);
        assert_eq!(report, FlushReport { delivered: 2, failed: 0 });
        assert_eq!(store.rows(Resource::Tasks)[0]["status"], "Done");
        assert_eq!(outbox.pending_len(), 0);
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let mut outbox = Outbox::new(no_wait());
        outbox.insert(Resource::Comments, vec![json!({"id": "c-1"})]);
        let mut store = Flaky { failures: 2, calls: 0, inner: MemoryStore::default() };
        let report = outbox.flush(&mut store);
        assert_eq!(report.delivered, 1);
        assert_eq!(store.calls, 3);
        assert!(outbox.failures().is_empty());
    }

    #[test]
    fn test_exhausted_ops_go_to_failure_channel() {
        let mut outbox = Outbox::new(no_wait());
        outbox.insert(Resource::ReviewNotes, vec![json!({"id": "n-1"})]);
        outbox.update(Resource::Projects, "p-1", json!({"blocked": true}));
        let mut store = MemoryStore::default();
        store.available = false;
        let report = outbox.flush(&mut store);
        assert_eq!(report, FlushReport { delivered: 0, failed: 2 });
        let failures = outbox.take_failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].attempts, 3);
        assert!(failures[0].error.contains("unavailable"));
        assert!(outbox.failures().is_empty());
    }

    #[test]
    fn test_saved_failures_are_requeued_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outbox.json");
        let mut outbox = Outbox::new(no_wait());
        outbox.insert(Resource::Tasks, vec![json!({"id": "t-9"})]);
        let mut offline = MemoryStore::default();
        offline.available = false;
        outbox.flush(&mut offline);
        outbox.update(Resource::Tasks, "t-9", json!({"status": "Ready"}));
        outbox.save(&path).unwrap();

        let mut restored = Outbox::load(&path, no_wait()).unwrap();
        assert_eq!(restored.pending_len(), 2);
        let mut store = MemoryStore::default();
        assert_eq!(restored.flush(&mut store).delivered, 2);
        assert_eq!(store.rows(Resource::Tasks)[0]["status"], "Ready");
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy { max_attempts: 4, backoff: Duration::from_millis(10) };
        assert_eq!(policy.delay(0), Duration::from_millis(10));
        assert_eq!(policy.delay(2), Duration::from_millis(40));
    }
}
