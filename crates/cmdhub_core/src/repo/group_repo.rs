//! Group ("tab") repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and adjacent-swap reordering over the `tabs` table.
//!
//! # Invariants
//! - Listing is deterministic: `sort_order ASC, id ASC`.
//! - New groups take `MAX(sort_order) + 1`, so orders stay distinct.
//! - Deleting a group removes its items through the foreign-key cascade.

use super::ordering::{swap_with_neighbor, OrderedRow};
use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::group::{Group, GroupId, GroupKind};
use crate::model::MoveDirection;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const GROUP_SELECT_SQL: &str = "SELECT
    id,
    name,
    type,
    sort_order
FROM tabs";

/// Repository interface for group operations.
pub trait GroupRepository {
    /// Creates one group at the end of the display sequence.
    fn create_group(&self, name: &str, kind: GroupKind) -> RepoResult<Group>;
    /// Loads one group by id.
    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>>;
    /// Lists every group in display order.
    fn list_groups(&self) -> RepoResult<Vec<Group>>;
    /// Updates name and kind; order is untouched.
    fn update_group(&self, id: GroupId, name: &str, kind: GroupKind) -> RepoResult<()>;
    /// Deletes one group and returns how many entries the cascade removed.
    fn delete_group(&self, id: GroupId) -> RepoResult<usize>;
    /// Swaps order with the adjacent group; `false` when nothing moved.
    fn move_group(&self, id: GroupId, direction: MoveDirection) -> RepoResult<bool>;
}

/// SQLite-backed group repository.
pub struct SqliteGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupRepository<'conn> {
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

impl GroupRepository for SqliteGroupRepository<'_> {
    fn create_group(&self, name: &str, kind: GroupKind) -> RepoResult<Group> {
        let order: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM tabs;",
            [],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO tabs (name, type, sort_order) VALUES (?1, ?2, ?3);",
            params![name, kind.as_str(), order],
        )?;

        Ok(Group {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            kind,
            order,
        })
    }

    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GROUP_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_group_row(row)?));
        }
        Ok(None)
    }

    fn list_groups(&self) -> RepoResult<Vec<Group>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GROUP_SELECT_SQL} ORDER BY sort_order ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            groups.push(parse_group_row(row)?);
        }
        Ok(groups)
    }

    fn update_group(&self, id: GroupId, name: &str, kind: GroupKind) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tabs SET name = ?2, type = ?3 WHERE id = ?1;",
            params![id, name, kind.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::GroupNotFound(id));
        }
        Ok(())
    }

    fn delete_group(&self, id: GroupId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let entry_count: i64 =
            tx.query_row("SELECT COUNT(*) FROM items WHERE tab_id = ?1;", [id], |row| {
                row.get(0)
            })?;

        let changed = tx.execute("DELETE FROM tabs WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::GroupNotFound(id));
        }

        let remaining: i64 =
            tx.query_row("SELECT COUNT(*) FROM items WHERE tab_id = ?1;", [id], |row| {
                row.get(0)
            })?;
        if remaining != 0 {
            return Err(RepoError::InvalidData(format!(
                "cascade left {remaining} item(s) behind for tab {id}; are foreign keys enabled?"
            )));
        }

        tx.commit()?;
        Ok(entry_count as usize)
    }

    fn move_group(&self, id: GroupId, direction: MoveDirection) -> RepoResult<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, sort_order FROM tabs ORDER BY sort_order ASC, id ASC;")?;
        let sequence = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<OrderedRow>, _>>()?;
        swap_with_neighbor(self.conn, "tabs", &sequence, id, direction)
    }
}

fn parse_group_row(row: &Row<'_>) -> RepoResult<Group> {
    let kind_text: String = row.get("type")?;
    let kind = GroupKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid tab type `{kind_text}` in tabs.type"))
    })?;

    Ok(Group {
        id: row.get("id")?,
        name: row.get("name")?,
        kind,
        order: row.get("sort_order")?,
    })
}
