//! Service-level error taxonomy.

use crate::db::snapshot::SnapshotError;
use crate::db::DbError;
use crate::exchange::ExchangeError;
use crate::model::entry::EntryId;
use crate::model::group::GroupId;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HubResult<T> = Result<T, HubError>;

/// Errors returned by [`crate::Hub`] operations.
#[derive(Debug)]
pub enum HubError {
    /// Caller input was rejected before any mutation.
    Validation(ValidationError),
    /// Target group does not exist.
    GroupNotFound(GroupId),
    /// Target entry does not exist.
    EntryNotFound(EntryId),
    /// Snapshot slot load/save failed.
    Io(StoreError),
    /// Snapshot bytes or exchange document could not be decoded.
    Format(String),
    /// Schema migration failed and was rolled back.
    Migration(DbError),
    /// Other storage failure.
    Repo(RepoError),
}

impl Display for HubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid input: {err}"),
            Self::GroupNotFound(id) => write!(f, "group not found: {id}"),
            Self::EntryNotFound(id) => write!(f, "entry not found: {id}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Format(message) => write!(f, "format error: {message}"),
            Self::Migration(err) => write!(f, "migration failed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HubError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Migration(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::GroupNotFound(_) | Self::EntryNotFound(_) | Self::Format(_) => None,
        }
    }
}

impl From<ValidationError> for HubError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for HubError {
    fn from(value: StoreError) -> Self {
        Self::Io(value)
    }
}

impl From<SnapshotError> for HubError {
    fn from(value: SnapshotError) -> Self {
        Self::Format(value.to_string())
    }
}

impl From<ExchangeError> for HubError {
    fn from(value: ExchangeError) -> Self {
        Self::Format(value.to_string())
    }
}

impl From<DbError> for HubError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::Repo(RepoError::Db(DbError::Sqlite(err))),
            other => Self::Migration(other),
        }
    }
}

impl From<RepoError> for HubError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::GroupNotFound(id) => Self::GroupNotFound(id),
            RepoError::EntryNotFound(id) => Self::EntryNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Db(err) => Self::from(err),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for HubError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}
