//! Durable snapshot slot.
//!
//! # Responsibility
//! - Hold exactly one serialized image of the whole dataset under a fixed key.
//! - Report every write failure to the caller.
//!
//! # Invariants
//! - `load` returning `None` means "first run", not an error.
//! - A successful `save` is durable before it returns.

mod file;
mod memory;

pub use file::{FileSnapshotStore, SNAPSHOT_SLOT_KEY};
pub use memory::MemorySnapshotStore;

use crate::db::snapshot::SnapshotError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque serialized dataset: the complete SQLite database image.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot").field("len", &self.0.len()).finish()
    }
}

/// Errors from reading or writing the durable slot.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem failure on the slot path.
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    /// The live dataset could not be serialized.
    Encode(SnapshotError),
    /// The slot refused the operation.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io {
                action,
                path,
                source,
            } => write!(f, "failed to {action} `{}`: {source}", path.display()),
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::Unavailable(message) => write!(f, "snapshot store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

/// Durable key-value slot holding the dataset snapshot.
///
/// Both calls are synchronous; the caller must not issue the next mutation
/// before `save` has returned.
pub trait SnapshotStore {
    /// Reads the stored snapshot, if any.
    fn load(&self) -> StoreResult<Option<Snapshot>>;
    /// Replaces the stored snapshot.
    fn save(&self, snapshot: &Snapshot) -> StoreResult<()>;
}
