//! Test-only helpers for building drafts and services.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use snafu::IntoError;
use tempfile::TempDir;

use crate::error::{Result, WriteSnapshotSnafu};
use crate::io::snapshot::{JsonFileStore, MemoryStore, SnapshotStore};
use crate::model::PollDraft;
use crate::service::{PollService, ServicePolicy};
use crate::store::Snapshot;

/// Draft with no explicit title.
pub fn draft(id: &str, question: &str, options: &[&str]) -> PollDraft {
    PollDraft {
        id: id.to_string(),
        title: None,
        question: question.to_string(),
        options: options.iter().map(|option| option.to_string()).collect(),
    }
}

/// Service backed by `polls_data.json` inside a fresh temp directory.
///
/// Keep the returned `TempDir` alive for as long as the service is used.
pub fn temp_service(policy: ServicePolicy) -> Result<(TempDir, PollService)> {
    let temp = tempfile::tempdir().map_err(|source| {
        WriteSnapshotSnafu {
            path: std::env::temp_dir(),
        }
        .into_error(source)
    })?;
    let store = JsonFileStore::new(temp.path().join("polls_data.json"));
    let service = PollService::open(Box::new(store), policy)?;
    Ok((temp, service))
}

/// In-memory store whose saves can be made to fail on demand.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail: Arc<AtomicBool>,
}

/// Handle that toggles failures on a [`FailingStore`] after it has been
/// moved into a service.
#[derive(Debug, Clone)]
pub struct FailSwitch {
    fail: Arc<AtomicBool>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn switch(&self) -> FailSwitch {
        FailSwitch {
            fail: Arc::clone(&self.fail),
        }
    }
}

impl FailSwitch {
    pub fn fail_saves(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl SnapshotStore for FailingStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        self.inner.load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(WriteSnapshotSnafu {
                path: "memory",
            }
            .into_error(std::io::Error::other("injected save failure")));
        }
        self.inner.save(snapshot)
    }
}
