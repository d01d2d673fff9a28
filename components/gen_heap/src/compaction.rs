//! Compaction planning: destination cursor and forwarding table.
//!
//! Compaction runs in three strictly ordered passes over a generation:
//!
//! 1. Prepare: walk the chain of compactible spaces and assign every live
//!    object its post-compaction address, advancing one shared cursor that
//!    continues across space boundaries so spaces fill sequentially.
//! 2. Adjust: rewrite every live reference in every space to its referent's
//!    new address.
//! 3. Compact: physically move each live object to its assigned address.
//!
//! Pass 2 needs the old and new address of every live object at the same
//! time, so pass 1 records assignments in an explicit [`ForwardingTable`]
//! instead of mutating anything in place.

use std::collections::HashMap;

use heap_types::Address;

/// Old-address to new-address mapping for every object that compaction will
/// move, populated during the prepare pass and consulted by the adjust and
/// compact passes.
#[derive(Debug, Default)]
pub struct ForwardingTable {
    entries: HashMap<Address, Address>,
}

impl ForwardingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        ForwardingTable {
            entries: HashMap::new(),
        }
    }

    /// Records that the object at `old` will move to `new`.
    pub fn insert(&mut self, old: Address, new: Address) {
        self.entries.insert(old, new);
    }

    /// Returns the post-compaction address of the object at `old`, or `None`
    /// if the object is not being moved by this compaction.
    pub fn new_location(&self, old: Address) -> Option<Address> {
        self.entries.get(&old).copied()
    }

    /// Returns the number of forwarded objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no objects are forwarded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One destination extent in the compaction chain.
#[derive(Debug, Clone, Copy)]
pub struct CompactDest {
    /// Index of the space in the generation's owned-space list
    pub space_index: usize,
    /// Lowest address objects may be placed at in this space
    pub bottom: Address,
    /// Exclusive upper bound of this space's usable extent
    pub end: Address,
}

/// The moving destination cursor shared across a compaction chain.
///
/// Live objects are assigned addresses in chain order: the cursor starts at
/// the first chain space's bottom, and when the next object no longer fits
/// it advances to the following chain space rather than leaving a gap behind
/// in an earlier one.
#[derive(Debug)]
pub struct CompactPoint {
    dests: Vec<CompactDest>,
    /// Planned fill level per destination, finalized as the cursor passes
    tops: Vec<Address>,
    /// Index of the destination currently being filled
    cur: usize,
    /// Next free address in the current destination
    free: Address,
    forwarding: ForwardingTable,
}

impl CompactPoint {
    /// Creates a cursor over the given chain destinations, positioned at the
    /// first destination's bottom.
    ///
    /// # Panics
    ///
    /// Panics if `dests` is empty; a compaction chain always has at least
    /// one space.
    pub fn new(dests: Vec<CompactDest>) -> Self {
        assert!(!dests.is_empty(), "compaction chain has no spaces");
        let free = dests[0].bottom;
        let tops = dests.iter().map(|d| d.bottom).collect();
        CompactPoint {
            dests,
            tops,
            cur: 0,
            free,
            forwarding: ForwardingTable::new(),
        }
    }

    /// Assigns the live object at `old` of `size_words` its post-compaction
    /// address, records it in the forwarding table, and returns it.
    ///
    /// # Panics
    ///
    /// Panics if the object fits in no remaining destination. Total live
    /// data never exceeds the chain's capacity, so this indicates an
    /// internal inconsistency.
    pub fn forward(&mut self, old: Address, size_words: usize) -> Address {
        while self.free.offset_words(size_words) > self.dests[self.cur].end {
            self.tops[self.cur] = self.free;
            self.cur += 1;
            assert!(
                self.cur < self.dests.len(),
                "object of {} words fits in no remaining compaction space",
                size_words
            );
            self.free = self.dests[self.cur].bottom;
        }
        let new = self.free;
        self.free = self.free.offset_words(size_words);
        self.forwarding.insert(old, new);
        new
    }

    /// Returns the planned post-compaction fill level for `space_index`.
    ///
    /// Destinations the cursor has passed keep their recorded level, the
    /// current destination fills to the cursor, and destinations not yet
    /// reached stay empty at their bottom.
    pub fn planned_top(&self, space_index: usize) -> Option<Address> {
        let pos = self
            .dests
            .iter()
            .position(|d| d.space_index == space_index)?;
        if pos < self.cur {
            Some(self.tops[pos])
        } else if pos == self.cur {
            Some(self.free)
        } else {
            Some(self.dests[pos].bottom)
        }
    }

    /// Returns the forwarding table populated so far.
    pub fn forwarding(&self) -> &ForwardingTable {
        &self.forwarding
    }
}
