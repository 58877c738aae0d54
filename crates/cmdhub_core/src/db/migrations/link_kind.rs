//! Rebuild step that widens `tabs.type` to accept `link`.
//!
//! SQLite cannot alter a CHECK constraint in place, so both tables are dumped
//! into memory, dropped, recreated and reloaded with their original ids. The
//! caller owns the surrounding transaction.

use crate::db::table_exists;
use log::{info, warn};
use rusqlite::{params, Transaction};
use std::collections::HashSet;

const CREATE_TABS_SQL: &str = "CREATE TABLE tabs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL CHECK(type IN ('command', 'note', 'link')),
    sort_order INTEGER NOT NULL DEFAULT 0
);";

const CREATE_ITEMS_SQL: &str = "CREATE TABLE items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tab_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    description TEXT DEFAULT '',
    copy_count INTEGER DEFAULT 0,
    sort_order INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (tab_id) REFERENCES tabs(id) ON DELETE CASCADE
);";

struct TabRow {
    id: i64,
    name: String,
    kind: String,
    sort_order: i64,
}

struct ItemRow {
    id: i64,
    tab_id: i64,
    title: String,
    content: String,
    description: Option<String>,
    copy_count: Option<i64>,
    sort_order: i64,
}

pub(super) fn rebuild_with_link_kind(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    let tabs = capture_tabs(tx)?;
    let items = capture_items(tx)?;
    let sequences = capture_sequences(tx)?;

    tx.execute_batch("DROP TABLE items; DROP TABLE tabs;")?;
    tx.execute_batch(CREATE_TABS_SQL)?;
    tx.execute_batch(CREATE_ITEMS_SQL)?;

    let tab_ids: HashSet<i64> = tabs.iter().map(|tab| tab.id).collect();
    for tab in &tabs {
        tx.execute(
            "INSERT INTO tabs (id, name, type, sort_order) VALUES (?1, ?2, ?3, ?4);",
            params![tab.id, tab.name, tab.kind, tab.sort_order],
        )?;
    }

    let mut orphaned = 0usize;
    for item in &items {
        // Legacy writers ran without foreign keys, so dangling rows can exist.
        if !tab_ids.contains(&item.tab_id) {
            orphaned += 1;
            continue;
        }
        tx.execute(
            "INSERT INTO items (
                id,
                tab_id,
                title,
                content,
                description,
                copy_count,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                item.id,
                item.tab_id,
                item.title,
                item.content,
                item.description,
                item.copy_count,
                item.sort_order,
            ],
        )?;
    }
    if orphaned > 0 {
        warn!(
            "event=schema_rebuild module=db status=warn dropped_orphan_items={}",
            orphaned
        );
    }

    restore_sequences(tx, &sequences)?;

    info!(
        "event=schema_rebuild module=db status=ok tabs={} items={}",
        tabs.len(),
        items.len() - orphaned
    );
    Ok(())
}

fn capture_tabs(tx: &Transaction<'_>) -> rusqlite::Result<Vec<TabRow>> {
    let mut stmt = tx.prepare("SELECT id, name, type, sort_order FROM tabs ORDER BY id;")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TabRow {
                id: row.get(0)?,
                name: row.get(1)?,
                kind: row.get(2)?,
                sort_order: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn capture_items(tx: &Transaction<'_>) -> rusqlite::Result<Vec<ItemRow>> {
    let mut stmt = tx.prepare(
        "SELECT id, tab_id, title, content, description, copy_count, sort_order
         FROM items
         ORDER BY id;",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ItemRow {
                id: row.get(0)?,
                tab_id: row.get(1)?,
                title: row.get(2)?,
                content: row.get(3)?,
                description: row.get(4)?,
                copy_count: row.get(5)?,
                sort_order: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// AUTOINCREMENT high-water marks, so ids of deleted rows are never reissued.
fn capture_sequences(tx: &Transaction<'_>) -> rusqlite::Result<Vec<(String, i64)>> {
    if !table_exists(tx, "sqlite_sequence")? {
        return Ok(Vec::new());
    }
    let mut stmt =
        tx.prepare("SELECT name, seq FROM sqlite_sequence WHERE name IN ('tabs', 'items');")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn restore_sequences(tx: &Transaction<'_>, sequences: &[(String, i64)]) -> rusqlite::Result<()> {
    for (name, seq) in sequences {
        tx.execute("DELETE FROM sqlite_sequence WHERE name = ?1;", [name])?;
        tx.execute(
            "INSERT INTO sqlite_sequence (name, seq) VALUES (?1, ?2);",
            params![name, seq],
        )?;
    }
    Ok(())
}
