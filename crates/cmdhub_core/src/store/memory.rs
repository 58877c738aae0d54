//! In-process snapshot slot for tests and embedding.

use super::{Snapshot, SnapshotStore, StoreError, StoreResult};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Slot {
    snapshot: Option<Snapshot>,
    saves: usize,
    fail_saves: bool,
}

/// Shared in-memory slot.
///
/// Clones share one slot, which lets a test "restart" a hub against the same
/// durable state.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Rc<RefCell<Slot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot that already holds `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::default();
        store.slot.borrow_mut().snapshot = Some(snapshot);
        store
    }

    /// Current slot content.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.slot.borrow().snapshot.clone()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.slot.borrow().saves
    }

    /// Makes every following `save` fail until switched back.
    pub fn set_fail_saves(&self, fail: bool) {
        self.slot.borrow_mut().fail_saves = fail;
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> StoreResult<Option<Snapshot>> {
        Ok(self.slot.borrow().snapshot.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let mut slot = self.slot.borrow_mut();
        if slot.fail_saves {
            return Err(StoreError::Unavailable("writes are disabled".to_string()));
        }
        slot.snapshot = Some(snapshot.clone());
        slot.saves += 1;
        Ok(())
    }
}
