//! Hub service: the single entry point for callers.
//!
//! # Responsibility
//! - Own the live connection and the durable snapshot slot.
//! - Validate input, mutate through repositories, then persist.
//!
//! # Invariants
//! - Validation runs before the first SQL mutation.
//! - Every successful mutation is saved before the method returns.
//! - No-op moves do not save.
//! - Database import/reset replaces the live connection only after the new
//!   dataset has been decoded, migrated, checked and saved.

use super::error::{HubError, HubResult};
use crate::db::snapshot;
use crate::db::{open_db_in_memory, prepare_connection, schema_version};
use crate::exchange::{
    document_from_group, records_to_entries, ExchangeDocument, ExchangeInput, ImportMode,
};
use crate::model::entry::{Entry, EntryId, EntryPatch, NewEntry};
use crate::model::group::{Group, GroupId, GroupKind};
use crate::model::validation::{normalize_group_name, ValidationError};
use crate::model::MoveDirection;
use crate::repo::ensure_connection_ready;
use crate::repo::entry_repo::{EntryRepository, SqliteEntryRepository};
use crate::repo::group_repo::{GroupRepository, SqliteGroupRepository};
use crate::store::{Snapshot, SnapshotStore, StoreError};
use crate::view::{self, EntryView, GroupSelection, SortMode, ViewContext};
use chrono::NaiveDate;
use log::{error, info, warn};
use rusqlite::Connection;
use std::time::Instant;

/// Groups inserted on first run.
pub const SEED_GROUP_NAMES: [&str; 2] = ["Git 命令", "Claude 命令"];

/// Result of activating one sub-line of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub entry_id: EntryId,
    /// Kind of the owning group; decides copy versus open.
    pub kind: GroupKind,
    pub line: String,
    /// Use count after this activation.
    pub use_count: i64,
}

/// File name for a dated full-database export.
pub fn database_export_file_name(date: NaiveDate) -> String {
    format!("command-hub-{}.db", date.format("%Y-%m-%d"))
}

/// Content organizer over one snapshot slot.
pub struct Hub<S: SnapshotStore> {
    conn: Connection,
    store: S,
}

impl<S: SnapshotStore> Hub<S> {
    /// Loads the slot, migrating or seeding as needed.
    ///
    /// # Errors
    /// - `Io` when the slot cannot be read, or the initial save fails.
    /// - `Format` when stored bytes are not a readable database.
    /// - `Migration` when the stored schema is newer or a migration fails.
    pub fn open(store: S) -> HubResult<Self> {
        let started_at = Instant::now();
        let loaded = store.load()?;
        let source = if loaded.is_some() { "snapshot" } else { "seed" };

        let (conn, needs_save) = match loaded {
            None => {
                let conn = open_db_in_memory()?;
                seed_default_groups(&conn)?;
                (conn, true)
            }
            Some(snapshot) => {
                let mut conn = snapshot::decode(&snapshot)?;
                let report = prepare_connection(&mut conn)?;
                (conn, report.changed())
            }
        };
        ensure_connection_ready(&conn)?;

        let hub = Self { conn, store };
        if needs_save {
            hub.persist()?;
        }

        info!(
            "event=hub_open module=service status=ok source={} saved={} duration_ms={}",
            source,
            needs_save,
            started_at.elapsed().as_millis()
        );
        Ok(hub)
    }

    /// Backing snapshot slot.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Schema version of the live dataset.
    pub fn schema_version(&self) -> HubResult<u32> {
        Ok(schema_version(&self.conn)?)
    }

    pub fn create_group(&mut self, name: &str, kind: GroupKind) -> HubResult<Group> {
        let name = normalize_group_name(name)?;
        let group = self.groups().create_group(&name, kind)?;
        self.persist()?;
        Ok(group)
    }

    pub fn get_group(&self, id: GroupId) -> HubResult<Group> {
        self.groups()
            .get_group(id)?
            .ok_or(HubError::GroupNotFound(id))
    }

    pub fn list_groups(&self) -> HubResult<Vec<Group>> {
        Ok(self.groups().list_groups()?)
    }

    /// Renames and/or re-kinds a group; order is kept.
    pub fn update_group(&mut self, id: GroupId, name: &str, kind: GroupKind) -> HubResult<Group> {
        let name = normalize_group_name(name)?;
        self.groups().update_group(id, &name, kind)?;
        self.persist()?;
        self.get_group(id)
    }

    /// Deletes a group with all of its entries; returns the entry count removed.
    pub fn delete_group(&mut self, id: GroupId) -> HubResult<usize> {
        let removed = self.groups().delete_group(id)?;
        self.persist()?;
        Ok(removed)
    }

    /// Swaps a group with its neighbour; `false` (and no save) at the edges.
    pub fn move_group(&mut self, id: GroupId, direction: MoveDirection) -> HubResult<bool> {
        let moved = self.groups().move_group(id, direction)?;
        if moved {
            self.persist()?;
        }
        Ok(moved)
    }

    pub fn create_entry(&mut self, entry: NewEntry) -> HubResult<Entry> {
        let entry = entry.normalized()?;
        let created = self.entries().create_entry(&entry)?;
        self.persist()?;
        Ok(created)
    }

    pub fn get_entry(&self, id: EntryId) -> HubResult<Entry> {
        self.entries()
            .get_entry(id)?
            .ok_or(HubError::EntryNotFound(id))
    }

    /// Applies a partial update and returns the stored entry.
    pub fn update_entry(&mut self, id: EntryId, patch: EntryPatch) -> HubResult<Entry> {
        let patch = patch.normalized()?;
        self.entries().update_entry(id, &patch)?;
        self.persist()?;
        self.get_entry(id)
    }

    pub fn delete_entry(&mut self, id: EntryId) -> HubResult<()> {
        self.entries().delete_entry(id)?;
        self.persist()
    }

    /// Adds one to the entry's use count and returns the new value.
    pub fn increment_use_count(&mut self, id: EntryId) -> HubResult<i64> {
        let count = self.entries().increment_use_count(id)?;
        self.persist()?;
        Ok(count)
    }

    pub fn move_entry(&mut self, id: EntryId, direction: MoveDirection) -> HubResult<bool> {
        let moved = self.entries().move_entry(id, direction)?;
        if moved {
            self.persist()?;
        }
        Ok(moved)
    }

    /// Resolves sub-line `line_index` of a command or link entry and counts
    /// the use.
    pub fn activate(&mut self, id: EntryId, line_index: usize) -> HubResult<Activation> {
        let entry = self.get_entry(id)?;
        let group = self.get_group(entry.group_id)?;
        if !group.kind.has_activatable_lines() {
            return Err(ValidationError::NotActivatable(id).into());
        }

        let lines = entry.lines();
        let line = lines
            .get(line_index)
            .map(|line| line.to_string())
            .ok_or(ValidationError::LineOutOfRange {
                entry_id: id,
                index: line_index,
                available: lines.len(),
            })?;

        let use_count = self.increment_use_count(id)?;
        Ok(Activation {
            entry_id: id,
            kind: group.kind,
            line,
            use_count,
        })
    }

    /// Entries of one group in `sort` order.
    pub fn list_entries(&self, group_id: GroupId, sort: SortMode) -> HubResult<Vec<Entry>> {
        self.get_group(group_id)?;
        Ok(view::list_entries(&self.entries(), group_id, sort)?)
    }

    /// Every entry with its owning group; `None` sorts most-used first.
    pub fn list_all_entries(&self, sort: Option<SortMode>) -> HubResult<Vec<(Entry, Group)>> {
        Ok(view::list_all_entries(&self.entries(), sort)?)
    }

    /// Renders the caller's current view.
    pub fn view(&self, context: &ViewContext) -> HubResult<EntryView> {
        match context.selection {
            GroupSelection::All => Ok(EntryView::All {
                entries: self.list_all_entries(context.sort)?,
            }),
            GroupSelection::Group(id) => {
                let group = self.get_group(id)?;
                let entries = view::list_entries(&self.entries(), id, context.effective_sort())?;
                Ok(EntryView::Group { group, entries })
            }
        }
    }

    /// Exports one group as a portable document.
    pub fn export_group(&self, selection: GroupSelection) -> HubResult<ExchangeDocument> {
        let group_id = selection.require_group("export")?;
        let group = self.get_group(group_id)?;
        let entries = view::list_entries(&self.entries(), group_id, SortMode::OrderAsc)?;
        Ok(document_from_group(&group, &entries))
    }

    /// Pretty-printed JSON form of [`Hub::export_group`].
    pub fn export_group_json(&self, selection: GroupSelection) -> HubResult<String> {
        let document = self.export_group(selection)?;
        serde_json::to_string_pretty(&document).map_err(|err| HubError::Format(err.to_string()))
    }

    /// Imports a document into one group and returns how many entries were
    /// inserted.
    ///
    /// The document's `tab` header is informational; the target is always
    /// `selection`.
    pub fn import_group(
        &mut self,
        selection: GroupSelection,
        text: &str,
        mode: ImportMode,
    ) -> HubResult<usize> {
        let group_id = selection.require_group("import")?;
        self.get_group(group_id)?;

        let document = ExchangeInput::parse(text)?.into_document();
        let entries = records_to_entries(group_id, document.items)?;
        let inserted = self
            .entries()
            .insert_batch(group_id, &entries, mode.clears_existing())?;
        self.persist()?;

        info!(
            "event=group_import module=service status=ok group_id={} mode={:?} count={}",
            group_id, mode, inserted
        );
        Ok(inserted)
    }

    /// Raw image of the live dataset.
    pub fn export_database(&self) -> HubResult<Snapshot> {
        Ok(snapshot::encode(&self.conn).map_err(StoreError::Encode)?)
    }

    /// Replaces the live dataset with an imported database image.
    pub fn import_database(&mut self, snapshot: &Snapshot) -> HubResult<()> {
        self.replace_dataset(snapshot, "db_import")
    }

    /// Replaces the live dataset with a seed image; callers confirm first.
    pub fn reset_from_seed(&mut self, seed: &Snapshot) -> HubResult<()> {
        self.replace_dataset(seed, "db_reset")
    }

    fn replace_dataset(&mut self, snapshot: &Snapshot, event: &str) -> HubResult<()> {
        let started_at = Instant::now();
        let result = self.prepare_replacement(snapshot);
        match result {
            Ok(conn) => {
                self.conn = conn;
                info!(
                    "event={} module=service status=ok bytes={} duration_ms={}",
                    event,
                    snapshot.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event={} module=service status=error bytes={} duration_ms={} error={}",
                    event,
                    snapshot.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn prepare_replacement(&self, snapshot: &Snapshot) -> HubResult<Connection> {
        let mut conn = snapshot::decode(snapshot)?;
        prepare_connection(&mut conn)?;
        ensure_connection_ready(&conn)?;

        let migrated = snapshot::encode(&conn).map_err(StoreError::Encode)?;
        self.store.save(&migrated)?;
        Ok(conn)
    }

    fn groups(&self) -> SqliteGroupRepository<'_> {
        SqliteGroupRepository::new(&self.conn)
    }

    fn entries(&self) -> SqliteEntryRepository<'_> {
        SqliteEntryRepository::new(&self.conn)
    }

    fn persist(&self) -> HubResult<()> {
        let snapshot = snapshot::encode(&self.conn).map_err(|err| {
            error!(
                "event=snapshot_encode module=service status=error error={}",
                err
            );
            StoreError::Encode(err)
        })?;
        self.store.save(&snapshot)?;
        Ok(())
    }
}

fn seed_default_groups(conn: &Connection) -> HubResult<()> {
    let groups = SqliteGroupRepository::new(conn);
    for name in SEED_GROUP_NAMES {
        groups.create_group(name, GroupKind::Command)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(database_export_file_name(date), "command-hub-2026-03-07.db");
    }
}
