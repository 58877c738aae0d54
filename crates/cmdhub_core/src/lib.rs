//! Core domain logic for Command Hub.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod exchange;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod view;

pub use db::snapshot::SnapshotError;
pub use db::{open_db_in_memory, schema_version, DbError, DbResult};
pub use exchange::{
    ExchangeDocument, ExchangeError, ExchangeInput, ImportMode, ItemRecord, TabHeader,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entry::{Entry, EntryId, EntryPatch, NewEntry};
pub use model::group::{Group, GroupId, GroupKind};
pub use model::validation::ValidationError;
pub use model::MoveDirection;
pub use repo::entry_repo::{EntryRepository, SqliteEntryRepository};
pub use repo::group_repo::{GroupRepository, SqliteGroupRepository};
pub use repo::{RepoError, RepoResult};
pub use service::error::{HubError, HubResult};
pub use service::hub::{database_export_file_name, Activation, Hub, SEED_GROUP_NAMES};
pub use store::{
    FileSnapshotStore, MemorySnapshotStore, Snapshot, SnapshotStore, StoreError, StoreResult,
};
pub use view::{EntryView, GroupSelection, SortMode, ViewContext};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
