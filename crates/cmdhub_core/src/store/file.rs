//! Filesystem-backed snapshot slot with atomic replacement.

use super::{Snapshot, SnapshotStore, StoreError, StoreResult};
use log::{error, info};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

/// Fixed key (file name) of the snapshot slot inside the store directory.
pub const SNAPSHOT_SLOT_KEY: &str = "command-hub.sqlite";

/// Stores the snapshot as `<dir>/command-hub.sqlite`.
///
/// Writes land in a sibling temp file that is fsynced and then renamed over
/// the slot, so a crash mid-save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_SLOT_KEY)
    }

    fn write_atomically(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let slot = self.slot_path();
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            action: "create snapshot directory",
            path: self.dir.clone(),
            source,
        })?;

        let io_error = |action: &'static str| {
            let path = slot.clone();
            move |source: std::io::Error| StoreError::Io {
                action,
                path,
                source,
            }
        };

        let mut staged = NamedTempFile::new_in(&self.dir).map_err(io_error("stage snapshot"))?;
        staged
            .write_all(snapshot.as_bytes())
            .map_err(io_error("write snapshot"))?;
        staged
            .as_file()
            .sync_all()
            .map_err(io_error("sync snapshot"))?;
        staged
            .persist(&slot)
            .map_err(|err| err.error)
            .map_err(io_error("replace snapshot"))?;
        Ok(())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> StoreResult<Option<Snapshot>> {
        let slot = self.slot_path();
        match fs::read(&slot) {
            Ok(bytes) => {
                info!(
                    "event=snapshot_load module=store status=ok bytes={}",
                    bytes.len()
                );
                Ok(Some(Snapshot::from_bytes(bytes)))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("event=snapshot_load module=store status=empty");
                Ok(None)
            }
            Err(source) => {
                error!(
                    "event=snapshot_load module=store status=error error={}",
                    source
                );
                Err(StoreError::Io {
                    action: "read snapshot",
                    path: slot,
                    source,
                })
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let started_at = Instant::now();
        match self.write_atomically(snapshot) {
            Ok(()) => {
                info!(
                    "event=snapshot_save module=store status=ok bytes={} duration_ms={}",
                    snapshot.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=snapshot_save module=store status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}
