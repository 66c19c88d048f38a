//! Shared fixtures for collector integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tracklog_core::{CollectorConfig, Entry, Error, Result, SnapshotStore, Transport};

/// One recorded submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub identity: String,
    pub batch: Vec<Entry>,
}

/// Transport that records every batch and answers immediately
///
/// Optionally gated: each `send` waits for a permit from [`release`](Self::release).
pub struct MockTransport {
    fail: AtomicBool,
    gate: Option<Semaphore>,
    submissions: Mutex<Vec<Submission>>,
}

impl MockTransport {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::build(false, None))
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::build(true, None))
    }

    /// Holds every submission until released
    pub fn gated(fail: bool) -> Arc<Self> {
        Arc::new(Self::build(fail, Some(Semaphore::new(0))))
    }

    fn build(fail: bool, gate: Option<Semaphore>) -> Self {
        Self {
            fail: AtomicBool::new(fail),
            gate,
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Let `n` held submissions complete
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, identity: &str, batch: &[Entry]) -> Result<()> {
        self.submissions.lock().unwrap().push(Submission {
            identity: identity.to_string(),
            batch: batch.to_vec(),
        });

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .expect("gate closed")
                .forget();
        }

        if self.fail.load(Ordering::SeqCst) {
            Err(Error::Transport("mock network down".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Config with the snapshot inside `dir`
pub fn config_in(dir: &TempDir) -> CollectorConfig {
    CollectorConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    }
}

pub fn snapshot_in(dir: &TempDir) -> SnapshotStore {
    SnapshotStore::new(dir.path().join("events.log"))
}

/// The `n` parameter of each entry, `None` for entries without one
pub fn numbers(entries: &[Entry]) -> Vec<Option<i64>> {
    entries
        .iter()
        .map(|e| e.parameters.get("n").and_then(|v| v.as_i64()))
        .collect()
}
