//! Persistence gateway: the whole state as one JSON document.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use snafu::ResultExt;
use tracing::debug;

use crate::error::{
    EncodeSnapshotSnafu, ParseSnapshotSnafu, ReadSnapshotSnafu, Result, WriteSnapshotSnafu,
};
use crate::store::Snapshot;

/// Durable storage for the full snapshot.
///
/// `save` replaces whatever was stored before; there is no partial update.
pub trait SnapshotStore: Send + Sync {
    /// Read the stored snapshot, or `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<Snapshot>>;

    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Snapshot stored as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for JsonFileStore {
    /// A missing file is an empty store. A file that exists but does not
    /// parse is an error: the caller must not start over it and overwrite it.
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no snapshot on disk");
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).context(ReadSnapshotSnafu {
            path: self.path.clone(),
        })?;
        let snapshot: Snapshot = serde_json::from_str(&contents).context(ParseSnapshotSnafu {
            path: self.path.clone(),
        })?;
        debug!(
            path = %self.path.display(),
            polls = snapshot.polls.len(),
            responses = snapshot.responses.total(),
            "snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    /// Atomically write the snapshot (temp file + rename).
    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let mut buf = serde_json::to_string_pretty(snapshot).context(EncodeSnapshotSnafu)?;
        buf.push('\n');
        write_atomic(&self.path, &buf)?;
        debug!(path = %self.path.display(), polls = snapshot.polls.len(), "snapshot written");
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context(WriteSnapshotSnafu {
            path: parent.to_path_buf(),
        })?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents).context(WriteSnapshotSnafu {
        path: tmp_path.clone(),
    })?;
    fs::rename(&tmp_path, path).context(WriteSnapshotSnafu {
        path: path.to_path_buf(),
    })?;
    Ok(())
}

/// Snapshot kept in process memory; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        *self.snapshot.lock() = Some(snapshot.clone());
        Ok(())
    }
}
