//! Conversion between a live connection and snapshot bytes.
//!
//! # Responsibility
//! - Serialize the in-memory database into a standard SQLite file image.
//! - Restore a file image into a fresh in-memory connection.
//!
//! # Invariants
//! - `decode` never touches an existing connection; failures leave callers
//!   with their current dataset.
//! - Decoded connections pass `PRAGMA quick_check`.
//! - Decoded connections are not migrated; see `prepare_connection`.

use crate::store::Snapshot;
use rusqlite::backup::Backup;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::time::Duration;

/// Every SQLite database file starts with this header string.
pub const SQLITE_HEADER_MAGIC: &[u8; 16] = b"SQLite format 3\0";

const SCRATCH_FILE_NAME: &str = "snapshot.sqlite";

/// Pages copied per backup step; rusqlite requires a positive count.
const BACKUP_PAGES_PER_STEP: std::os::raw::c_int = 256;

/// Errors from encoding or decoding snapshot bytes.
#[derive(Debug)]
pub enum SnapshotError {
    /// Bytes do not start with the SQLite header.
    InvalidHeader,
    /// SQLite rejected the image or the integrity check failed.
    Corrupt(String),
    /// Scratch file handling failed.
    Io(std::io::Error),
    /// Backup API failure.
    Sqlite(rusqlite::Error),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHeader => write!(f, "snapshot is not an SQLite database image"),
            Self::Corrupt(message) => write!(f, "snapshot is corrupt: {message}"),
            Self::Io(err) => write!(f, "snapshot scratch file error: {err}"),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            Self::InvalidHeader | Self::Corrupt(_) => None,
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for SnapshotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Serializes the `main` database of `conn` into snapshot bytes.
pub fn encode(conn: &Connection) -> Result<Snapshot, SnapshotError> {
    let scratch = tempfile::tempdir()?;
    let path = scratch.path().join(SCRATCH_FILE_NAME);

    let mut target = Connection::open(&path)?;
    {
        let backup = Backup::new(conn, &mut target)?;
        backup.run_to_completion(BACKUP_PAGES_PER_STEP, Duration::ZERO, None)?;
    }
    target.close().map_err(|(_, err)| err)?;

    let bytes = fs::read(&path)?;
    Ok(Snapshot::from_bytes(bytes))
}

/// Restores snapshot bytes into a new in-memory connection.
///
/// # Errors
/// - `InvalidHeader` when the bytes are not an SQLite image.
/// - `Corrupt` when SQLite refuses the image or `quick_check` fails.
pub fn decode(snapshot: &Snapshot) -> Result<Connection, SnapshotError> {
    if !snapshot.as_bytes().starts_with(SQLITE_HEADER_MAGIC) {
        return Err(SnapshotError::InvalidHeader);
    }

    let scratch = tempfile::tempdir()?;
    let path = scratch.path().join(SCRATCH_FILE_NAME);
    fs::write(&path, snapshot.as_bytes())?;

    let source = Connection::open(&path)?;
    let mut conn = Connection::open_in_memory()?;
    {
        let backup = Backup::new(&source, &mut conn)?;
        backup
            .run_to_completion(BACKUP_PAGES_PER_STEP, Duration::ZERO, None)
            .map_err(|err| SnapshotError::Corrupt(err.to_string()))?;
    }
    drop(source);

    let status: String = conn
        .query_row("PRAGMA quick_check;", [], |row| row.get(0))
        .map_err(|err| SnapshotError::Corrupt(err.to_string()))?;
    if status != "ok" {
        return Err(SnapshotError::Corrupt(status));
    }

    Ok(conn)
}
