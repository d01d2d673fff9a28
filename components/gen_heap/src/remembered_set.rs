//! Remembered set tracking cross-generation reference slots.
//!
//! When an older-generation object stores a reference to a younger-generation
//! object, the mutator's write barrier records the slot's address here. A
//! young-only collection then treats these slots as additional roots instead
//! of scanning the whole old generation.
//!
//! The set is written from mutator barriers and read at safepoints, so it is
//! the one structure in this layer with its own lock.

use parking_lot::Mutex;
use std::collections::BTreeSet;

use heap_types::{Address, MemRegion};

/// Recorded reference slots in older generations that point into younger
/// ones.
#[derive(Debug, Default)]
pub struct RememberedSet {
    /// Slot addresses, ordered so iteration is deterministic
    slots: Mutex<BTreeSet<Address>>,
}

impl RememberedSet {
    /// Creates an empty remembered set.
    pub fn new() -> Self {
        RememberedSet {
            slots: Mutex::new(BTreeSet::new()),
        }
    }

    /// Records the reference slot at `slot`.
    pub fn record(&self, slot: Address) {
        self.slots.lock().insert(slot);
    }

    /// Forgets the reference slot at `slot`.
    pub fn forget(&self, slot: Address) {
        self.slots.lock().remove(&slot);
    }

    /// Returns true if `slot` is recorded.
    pub fn contains(&self, slot: Address) -> bool {
        self.slots.lock().contains(&slot)
    }

    /// Removes every recorded slot.
    ///
    /// Called after a young collection, once every recorded reference has
    /// been updated or its referent promoted.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Returns the number of recorded slots.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns true if no slots are recorded.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Applies `visitor` to every recorded slot that lies in `region`, in
    /// address order.
    ///
    /// `region` is an older generation's space; the visited slots are the
    /// references in that space known to point into a younger generation.
    pub fn younger_refs_in_space_iterate(
        &self,
        region: MemRegion,
        visitor: &mut dyn FnMut(Address),
    ) {
        // Snapshot under the lock; the visitor may want to re-record slots.
        let snapshot: Vec<Address> = self
            .slots
            .lock()
            .iter()
            .copied()
            .filter(|slot| region.contains(*slot))
            .collect();
        for slot in snapshot {
            visitor(slot);
        }
    }
}
