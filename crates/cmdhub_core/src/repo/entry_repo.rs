//! Entry ("item") repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, partial update, counters and reordering over `items`.
//! - Serve the base-ordered sequences that views sort on top of.
//!
//! # Invariants
//! - Per-group listing is deterministic: `sort_order ASC, id ASC`.
//! - Aggregate listing follows tab order, then item order, then id.
//! - New entries take `MAX(sort_order) + 1` within their group unless an
//!   explicit order is supplied.
//! - `sort_order` is unique within a group; explicit orders that collide are
//!   rejected before any write.

use super::ordering::{swap_with_neighbor, OrderedRow};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::entry::{Entry, EntryId, EntryPatch, NewEntry};
use crate::model::group::{Group, GroupId, GroupKind};
use crate::model::validation::ValidationError;
use crate::model::MoveDirection;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    tab_id,
    title,
    content,
    COALESCE(description, '') AS description,
    COALESCE(copy_count, 0) AS copy_count,
    sort_order
FROM items";

/// Repository interface for entry operations.
pub trait EntryRepository {
    /// Creates one entry; the owning group must exist.
    fn create_entry(&self, entry: &NewEntry) -> RepoResult<Entry>;
    /// Loads one entry by id.
    fn get_entry(&self, id: EntryId) -> RepoResult<Option<Entry>>;
    /// Lists entries of one group in base order.
    fn list_entries(&self, group_id: GroupId) -> RepoResult<Vec<Entry>>;
    /// Lists every entry with its owning group in base order.
    fn list_all_entries(&self) -> RepoResult<Vec<(Entry, Group)>>;
    /// Overwrites the fields supplied in `patch`.
    fn update_entry(&self, id: EntryId, patch: &EntryPatch) -> RepoResult<()>;
    /// Deletes one entry.
    fn delete_entry(&self, id: EntryId) -> RepoResult<()>;
    /// Adds one to the use counter and returns the new value.
    fn increment_use_count(&self, id: EntryId) -> RepoResult<i64>;
    /// Swaps order with the adjacent entry of the same group.
    fn move_entry(&self, id: EntryId, direction: MoveDirection) -> RepoResult<bool>;
    /// Inserts `entries` after the group's current maximum order, optionally
    /// clearing the group first. Runs in one transaction.
    fn insert_batch(
        &self,
        group_id: GroupId,
        entries: &[NewEntry],
        clear_existing: bool,
    ) -> RepoResult<usize>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Wraps a connection that is known to be migrated.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates repository after checking schema version and required tables.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn create_entry(&self, entry: &NewEntry) -> RepoResult<Entry> {
        ensure_group_exists(self.conn, entry.group_id)?;
        let order = match entry.order {
            Some(order) => {
                ensure_order_free(self.conn, entry.group_id, order, None)?;
                order
            }
            None => next_entry_order(self.conn, entry.group_id)?,
        };
        insert_entry(self.conn, entry, order)
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<Entry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }
        Ok(None)
    }

    fn list_entries(&self, group_id: GroupId) -> RepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE tab_id = ?1
             ORDER BY sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([group_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn list_all_entries(&self) -> RepoResult<Vec<(Entry, Group)>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                i.id AS id,
                i.tab_id AS tab_id,
                i.title AS title,
                i.content AS content,
                COALESCE(i.description, '') AS description,
                COALESCE(i.copy_count, 0) AS copy_count,
                i.sort_order AS sort_order,
                t.name AS tab_name,
                t.type AS tab_type,
                t.sort_order AS tab_sort_order
             FROM items i
             INNER JOIN tabs t ON t.id = i.tab_id
             ORDER BY t.sort_order ASC, t.id ASC, i.sort_order ASC, i.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tagged = Vec::new();
        while let Some(row) = rows.next()? {
            let entry = parse_entry_row(row)?;
            let kind_text: String = row.get("tab_type")?;
            let kind = GroupKind::parse(&kind_text).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid tab type `{kind_text}` in tabs.type"))
            })?;
            let group = Group {
                id: entry.group_id,
                name: row.get("tab_name")?,
                kind,
                order: row.get("tab_sort_order")?,
            };
            tagged.push((entry, group));
        }
        Ok(tagged)
    }

    fn update_entry(&self, id: EntryId, patch: &EntryPatch) -> RepoResult<()> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = &patch.title {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(body) = &patch.body {
            assignments.push("content = ?");
            bind_values.push(Value::Text(body.clone()));
        }
        if let Some(note) = &patch.note {
            assignments.push("description = ?");
            bind_values.push(Value::Text(note.clone()));
        }
        if let Some(order) = patch.order {
            let group_id: Option<GroupId> = self
                .conn
                .query_row("SELECT tab_id FROM items WHERE id = ?1;", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            let group_id = group_id.ok_or(RepoError::EntryNotFound(id))?;
            ensure_order_free(self.conn, group_id, order, Some(id))?;
            assignments.push("sort_order = ?");
            bind_values.push(Value::Integer(order));
        }
        if let Some(use_count) = patch.use_count {
            assignments.push("copy_count = ?");
            bind_values.push(Value::Integer(use_count));
        }

        if assignments.is_empty() {
            return match self.get_entry(id)? {
                Some(_) => Ok(()),
                None => Err(RepoError::EntryNotFound(id)),
            };
        }

        let sql = format!("UPDATE items SET {} WHERE id = ?;", assignments.join(", "));
        bind_values.push(Value::Integer(id));
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::EntryNotFound(id));
        }
        Ok(())
    }

    fn delete_entry(&self, id: EntryId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM items WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::EntryNotFound(id));
        }
        Ok(())
    }

    fn increment_use_count(&self, id: EntryId) -> RepoResult<i64> {
        let count: Option<i64> = self
            .conn
            .query_row(
                "UPDATE items
                 SET copy_count = COALESCE(copy_count, 0) + 1
                 WHERE id = ?1
                 RETURNING copy_count;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        count.ok_or(RepoError::EntryNotFound(id))
    }

    fn move_entry(&self, id: EntryId, direction: MoveDirection) -> RepoResult<bool> {
        let group_id: Option<GroupId> = self
            .conn
            .query_row("SELECT tab_id FROM items WHERE id = ?1;", [id], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(group_id) = group_id else {
            return Ok(false);
        };

        let mut stmt = self.conn.prepare(
            "SELECT id, sort_order
             FROM items
             WHERE tab_id = ?1
             ORDER BY sort_order ASC, id ASC;",
        )?;
        let sequence = stmt
            .query_map([group_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<OrderedRow>, _>>()?;
        swap_with_neighbor(self.conn, "items", &sequence, id, direction)
    }

    fn insert_batch(
        &self,
        group_id: GroupId,
        entries: &[NewEntry],
        clear_existing: bool,
    ) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_group_exists(&tx, group_id)?;

        if clear_existing {
            tx.execute("DELETE FROM items WHERE tab_id = ?1;", [group_id])?;
        }

        let mut order = next_entry_order(&tx, group_id)?;
        for entry in entries {
            let entry = NewEntry {
                group_id,
                ..entry.clone()
            };
            insert_entry(&tx, &entry, order)?;
            order += 1;
        }

        tx.commit()?;
        Ok(entries.len())
    }
}

fn insert_entry(conn: &Connection, entry: &NewEntry, order: i64) -> RepoResult<Entry> {
    conn.execute(
        "INSERT INTO items (
            tab_id,
            title,
            content,
            description,
            copy_count,
            sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            entry.group_id,
            entry.title.as_str(),
            entry.body.as_str(),
            entry.note.as_str(),
            entry.use_count,
            order,
        ],
    )?;

    Ok(Entry {
        id: conn.last_insert_rowid(),
        group_id: entry.group_id,
        title: entry.title.clone(),
        body: entry.body.clone(),
        note: entry.note.clone(),
        use_count: entry.use_count,
        order,
    })
}

fn next_entry_order(conn: &Connection, group_id: GroupId) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), 0) + 1
         FROM items
         WHERE tab_id = ?1;",
        [group_id],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn ensure_order_free(
    conn: &Connection,
    group_id: GroupId,
    order: i64,
    except: Option<EntryId>,
) -> RepoResult<()> {
    let taken: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM items
            WHERE tab_id = ?1 AND sort_order = ?2 AND id IS NOT ?3
        );",
        params![group_id, order, except],
        |row| row.get(0),
    )?;
    if taken != 0 {
        return Err(ValidationError::OrderTaken { group_id, order }.into());
    }
    Ok(())
}

fn ensure_group_exists(conn: &Connection, group_id: GroupId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tabs WHERE id = ?1);",
        [group_id],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(RepoError::GroupNotFound(group_id));
    }
    Ok(())
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let use_count: i64 = row.get("copy_count")?;
    if use_count < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative copy_count `{use_count}` in items.copy_count"
        )));
    }

    Ok(Entry {
        id: row.get("id")?,
        group_id: row.get("tab_id")?,
        title: row.get("title")?,
        body: row.get("content")?,
        note: row.get("description")?,
        use_count,
        order: row.get("sort_order")?,
    })
}
