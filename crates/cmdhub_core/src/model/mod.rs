//! Domain model for tabs ("groups") and their items ("entries").
//!
//! # Responsibility
//! - Define the records shared by repositories, views and the exchange codec.
//! - Own input normalization rules applied before any write.
//!
//! # Invariants
//! - Group `order` is distinct across all groups.
//! - Entry `order` is meaningful only within its owning group.
//! - Deletion is permanent; there are no tombstones.

pub mod entry;
pub mod group;
pub mod validation;

/// Direction for adjacent-swap reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Swap with the previous row in display order.
    Up,
    /// Swap with the next row in display order.
    Down,
}

impl MoveDirection {
    /// Index of the neighbor to swap with, or `None` at the sequence boundary.
    pub fn neighbor_index(self, index: usize, len: usize) -> Option<usize> {
        match self {
            Self::Up => index.checked_sub(1),
            Self::Down => (index + 1 < len).then_some(index + 1),
        }
    }
}
