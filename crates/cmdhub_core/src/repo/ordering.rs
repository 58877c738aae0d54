//! Shared adjacent-swap reordering for tabs and items.

use super::RepoResult;
use crate::model::MoveDirection;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// One row of an ordered sequence: `(id, sort_order)`.
pub(super) type OrderedRow = (i64, i64);

/// Swaps `sort_order` of `id` with its neighbor in `sequence`.
///
/// `sequence` must already be in display order. Returns `false` without
/// writing when `id` is absent or already at the boundary. Exactly two rows
/// change otherwise.
pub(super) fn swap_with_neighbor(
    conn: &Connection,
    table: &'static str,
    sequence: &[OrderedRow],
    id: i64,
    direction: MoveDirection,
) -> RepoResult<bool> {
    let Some(index) = sequence.iter().position(|(row_id, _)| *row_id == id) else {
        return Ok(false);
    };
    let Some(neighbor_index) = direction.neighbor_index(index, sequence.len()) else {
        return Ok(false);
    };

    let (current_id, current_order) = sequence[index];
    let (neighbor_id, neighbor_order) = sequence[neighbor_index];

    // Orders may be unique-indexed, so park the moving row below every
    // existing order before the neighbor takes its slot.
    let park_sql = format!(
        "UPDATE {table} SET sort_order = (SELECT MIN(sort_order) - 1 FROM {table}) WHERE id = ?1;"
    );
    let sql = format!("UPDATE {table} SET sort_order = ?2 WHERE id = ?1;");
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute(&park_sql, params![current_id])?;
    tx.execute(&sql, params![neighbor_id, current_order])?;
    tx.execute(&sql, params![current_id, neighbor_order])?;
    tx.commit()?;
    Ok(true)
}
