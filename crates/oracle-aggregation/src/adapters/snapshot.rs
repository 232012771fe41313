//! Snapshot persistence
//!
//! Snapshots are bincode-encoded. The file store writes to a temp file and
//! renames it over the target so a crash never leaves a torn snapshot.

use crate::error::{OracleError, OracleResult};
use crate::ports::{OracleEventSink, SnapshotStore, TimeSource};
use crate::service::OracleService;
use crate::state::OracleSnapshot;
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

fn storage_error(e: impl std::fmt::Display) -> OracleError {
    OracleError::StorageError {
        reason: e.to_string(),
    }
}

/// Keeps the latest snapshot in memory
#[derive(Default)]
pub struct InMemorySnapshotStore {
    latest: Mutex<Option<OracleSnapshot>>,
    saves: Mutex<u64>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> u64 {
        *self.saves.lock()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn save(&self, snapshot: &OracleSnapshot) -> OracleResult<()> {
        *self.latest.lock() = Some(snapshot.clone());
        *self.saves.lock() += 1;
        Ok(())
    }

    fn load(&self) -> OracleResult<Option<OracleSnapshot>> {
        Ok(self.latest.lock().clone())
    }
}

/// Single-file snapshot store
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, snapshot: &OracleSnapshot) -> OracleResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(storage_error)?;
        }

        let bytes = bincode::serialize(snapshot).map_err(storage_error)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(storage_error)?;
        file.write_all(&bytes).map_err(storage_error)?;
        file.sync_all().map_err(storage_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(storage_error)?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }

    fn load(&self) -> OracleResult<Option<OracleSnapshot>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(e)),
        };
        bincode::deserialize(&bytes).map(Some).map_err(storage_error)
    }
}

/// Persist a snapshot every `period` until the task is aborted
pub fn spawn_snapshot_task<T, E, S>(
    service: Arc<OracleService<T, E>>,
    store: Arc<S>,
    period: Duration,
) -> JoinHandle<()>
where
    T: TimeSource + 'static,
    E: OracleEventSink + 'static,
    S: SnapshotStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let snapshot = service.snapshot();
            if let Err(e) = store.save(&snapshot) {
                error!(error = %e, "Periodic snapshot failed");
            }
        }
    })
}
