//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//! - Adopt unversioned legacy databases at their baseline version.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - All pending steps share one transaction; a failed step leaves the
//!   database at its previous version with no partial drop.

mod link_kind;

use crate::db::{schema_version, table_exists, DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};
use std::time::Instant;

#[derive(Clone, Copy)]
enum MigrationStep {
    /// Plain DDL applied with `execute_batch`.
    Sql(&'static str),
    /// Table rebuild that needs row-level access.
    Rebuild(fn(&Transaction<'_>) -> rusqlite::Result<()>),
}

#[derive(Clone, Copy)]
struct Migration {
    version: u32,
    step: MigrationStep,
}

/// Version assigned to databases written before `user_version` was tracked.
pub const LEGACY_BASELINE_VERSION: u32 = 1;

/// First version whose `tabs.type` accepts `link`.
pub const LINK_KIND_VERSION: u32 = 2;

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        step: MigrationStep::Sql(include_str!("0001_init.sql")),
    },
    Migration {
        version: LINK_KIND_VERSION,
        step: MigrationStep::Rebuild(link_kind::rebuild_with_link_kind),
    },
    Migration {
        version: 3,
        step: MigrationStep::Sql(include_str!("0003_item_order_index.sql")),
    },
    Migration {
        version: 4,
        step: MigrationStep::Sql(include_str!("0004_unique_item_order.sql")),
    },
];

/// Outcome of one `apply_migrations` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version stored in the database before this call.
    pub stored_version: u32,
    /// Version the migration chain started from (after legacy adoption).
    pub from_version: u32,
    /// Version stored after this call.
    pub to_version: u32,
}

impl MigrationReport {
    /// Whether the call rewrote anything.
    pub fn changed(&self) -> bool {
        self.stored_version != self.to_version
    }
}

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is newer than this binary.
/// - `Migration` when a step fails; nothing is committed in that case.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let stored_version = schema_version(conn)?;
    let latest = latest_version();

    let from_version = if stored_version == 0 && table_exists(conn, "tabs")? {
        info!(
            "event=schema_baseline module=db status=ok stored_version=0 adopted_version={}",
            LEGACY_BASELINE_VERSION
        );
        LEGACY_BASELINE_VERSION
    } else {
        stored_version
    };

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    if stored_version == latest {
        return Ok(MigrationReport {
            stored_version,
            from_version,
            to_version: latest,
        });
    }

    let started_at = Instant::now();
    info!(
        "event=schema_migrate module=db status=start from_version={} to_version={}",
        from_version, latest
    );

    match run_pending(conn, from_version) {
        Ok(()) => {
            info!(
                "event=schema_migrate module=db status=ok from_version={} to_version={} duration_ms={}",
                from_version,
                latest,
                started_at.elapsed().as_millis()
            );
            Ok(MigrationReport {
                stored_version,
                from_version,
                to_version: latest,
            })
        }
        Err(err) => {
            error!(
                "event=schema_migrate module=db status=error from_version={} to_version={} duration_ms={} error={}",
                from_version,
                latest,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn run_pending(conn: &mut Connection, from_version: u32) -> DbResult<()> {
    let tx = conn
        .transaction()
        .map_err(|source| DbError::Migration {
            version: from_version + 1,
            source,
        })?;
    for migration in MIGRATIONS {
        if migration.version <= from_version {
            continue;
        }

        let applied = match migration.step {
            MigrationStep::Sql(sql) => tx.execute_batch(sql),
            MigrationStep::Rebuild(rebuild) => rebuild(&tx),
        };
        applied
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| DbError::Migration {
                version: migration.version,
                source,
            })?;
    }
    tx.commit().map_err(|source| DbError::Migration {
        version: latest_version(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, MIGRATIONS};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn versions_are_strictly_increasing() {
        let versions: Vec<u32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(latest_version(), *versions.last().unwrap());
    }

    #[test]
    fn failure_to_open_the_migration_transaction_is_a_migration_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("BEGIN;").unwrap();

        match apply_migrations(&mut conn).unwrap_err() {
            DbError::Migration { version, .. } => assert_eq!(version, 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
