//! Spaces: contiguous sub-regions of a generation's committed memory.
//!
//! A generation never knows the concrete layout of its sub-regions; it holds
//! an ordered collection of [`Space`] handles and drives every algorithm
//! through this interface. Spaces that participate in compaction additionally
//! implement [`CompactibleSpace`] and are chained through successor links so
//! the compaction passes can skip non-compactible regions.
//!
//! [`ContiguousSpace`] is the default concrete variant: bump-pointer
//! allocated, fully parsable, and compactible.

use heap_types::{Address, MemRegion};
use log::trace;

use crate::compaction::{CompactPoint, ForwardingTable};
use crate::object;

/// A contiguous addressable sub-region of a generation.
///
/// The allocated prefix `[bottom, top)` is a sequence of parsable blocks;
/// `[top, end)` is a single free block. Sizes are in heap words.
pub trait Space {
    /// Returns the space's name for diagnostics.
    fn name(&self) -> &str;

    /// Returns the lowest address of the space.
    fn bottom(&self) -> Address;

    /// Returns the first address past the allocated prefix.
    fn top(&self) -> Address;

    /// Returns the exclusive upper bound of the space.
    fn end(&self) -> Address;

    /// Returns the space's reserved extent `[bottom, end)`.
    fn reserved(&self) -> MemRegion {
        MemRegion::new(self.bottom(), self.end())
    }

    /// Returns the space's capacity in words.
    fn capacity_words(&self) -> usize {
        self.end().word_diff(self.bottom())
    }

    /// Returns the allocated size in words.
    fn used_words(&self) -> usize {
        self.top().word_diff(self.bottom())
    }

    /// Returns the unallocated size in words.
    fn free_words(&self) -> usize {
        self.end().word_diff(self.top())
    }

    /// Returns the largest contiguous extent available for allocation, in
    /// words.
    fn contiguous_available(&self) -> usize;

    /// Returns true if `p` lies in the logically in-use part of the space.
    fn is_in(&self, p: Address) -> bool;

    /// Returns true if `p` lies anywhere in the space's reserved extent.
    fn is_in_reserved(&self, p: Address) -> bool {
        self.reserved().contains(p)
    }

    /// Attempts a non-blocking allocation of `word_size` words.
    ///
    /// Returns the start of the new block, or `None` if the space cannot
    /// satisfy the request. Never triggers a collection.
    fn allocate(&mut self, word_size: usize) -> Option<Address>;

    /// Returns the start of the block containing `p`, which must lie in the
    /// space's reserved extent.
    fn block_start(&self, p: Address) -> Address;

    /// Returns the size in words of the block starting at `p`.
    fn block_size(&self, p: Address) -> usize;

    /// Returns true if the block starting at `p` is an object rather than
    /// free space.
    fn block_is_obj(&self, p: Address) -> bool;

    /// Applies `visitor` to the start address of every object in the space,
    /// in address order.
    fn object_iterate(&self, visitor: &mut dyn FnMut(Address));

    /// Like [`Space::object_iterate`], but tolerates a trailing block that
    /// another phase is still publishing: a zero-size header terminates the
    /// walk instead of producing an invalid visit.
    fn safe_object_iterate(&self, visitor: &mut dyn FnMut(Address));

    /// Applies `visitor` to the referent held in every reference slot of
    /// every object, in address order.
    fn oop_iterate(&self, visitor: &mut dyn FnMut(Address)) {
        self.object_iterate(&mut |obj| {
            object::for_each_ref_slot(obj, |_, referent| visitor(referent));
        });
    }

    /// Rewrites every live reference in the space to its referent's
    /// post-compaction address.
    ///
    /// Runs over all spaces, compactible or not: a space that does not move
    /// may still hold references to objects that do.
    fn adjust_pointers(&mut self, forwarding: &ForwardingTable) {
        self.object_iterate(&mut |obj| {
            if !object::is_marked_at(obj) {
                return;
            }
            object::for_each_ref_slot(obj, |slot, referent| {
                if let Some(new) = forwarding.new_location(referent) {
                    object::set_ref_slot(obj, slot, new);
                }
            });
        });
    }

    /// Reclaims the entire space, invalidating every block in it.
    fn clear(&mut self);

    /// Returns this space's compaction capability, if it has one.
    fn as_compactible(&mut self) -> Option<&mut dyn CompactibleSpace> {
        None
    }

    /// Immutable access to this space's compaction capability.
    fn as_compactible_ref(&self) -> Option<&dyn CompactibleSpace> {
        None
    }
}

impl std::fmt::Debug for dyn Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Space({} {})", self.name(), self.reserved())
    }
}

/// A space that participates in sliding compaction.
///
/// Compactible spaces form a chain through [`next_compaction_space`]
/// successor links; the prepare and compact passes walk this chain rather
/// than the generation's full space enumeration.
///
/// [`next_compaction_space`]: CompactibleSpace::next_compaction_space
pub trait CompactibleSpace: Space {
    /// Returns the owned-space index of the next space in the compaction
    /// chain, or `None` at the end of the chain.
    fn next_compaction_space(&self) -> Option<usize>;

    /// Returns the fill level recorded by the prepare pass.
    fn compaction_top(&self) -> Address;

    /// Records the fill level this space will have after compaction.
    fn set_compaction_top(&mut self, top: Address);

    /// Prepare pass: assigns every marked object in this space its
    /// post-compaction address through the shared cursor.
    fn prepare_for_compaction(&mut self, cp: &mut CompactPoint);

    /// Compact pass: physically moves every marked object to the address
    /// assigned by the prepare pass, installs the recorded fill level as the
    /// new top, and clears marks.
    fn compact(&mut self, forwarding: &ForwardingTable);
}

/// Default concrete space: contiguous, bump-pointer allocated, compactible.
#[derive(Debug)]
pub struct ContiguousSpace {
    name: String,
    bottom: Address,
    end: Address,
    top: Address,
    compaction_top: Address,
    next_compaction_space: Option<usize>,
}

impl ContiguousSpace {
    /// Creates an empty space covering `region`.
    pub fn new(name: impl Into<String>, region: MemRegion) -> Self {
        let bottom = region.start();
        ContiguousSpace {
            name: name.into(),
            bottom,
            end: region.end(),
            top: bottom,
            compaction_top: bottom,
            next_compaction_space: None,
        }
    }

    /// Links this space to its successor in the compaction chain.
    pub fn set_next_compaction_space(&mut self, next: Option<usize>) {
        self.next_compaction_space = next;
    }

    /// Walks the parsable blocks in `[bottom, top)`.
    ///
    /// `stop_on_unparsable` terminates the walk at a zero-size header
    /// instead of treating it as an inconsistency.
    fn walk_blocks(&self, stop_on_unparsable: bool, visitor: &mut dyn FnMut(Address)) {
        let mut cur = self.bottom;
        while cur < self.top {
            let size = object::size_at(cur);
            if size == 0 {
                if stop_on_unparsable {
                    return;
                }
                panic!(
                    "zero-size block at {} in space {}: heap corruption",
                    cur,
                    self.name
                );
            }
            visitor(cur);
            cur = cur.offset_words(size);
        }
    }
}

impl Space for ContiguousSpace {
    fn name(&self) -> &str {
        &self.name
    }

    fn bottom(&self) -> Address {
        self.bottom
    }

    fn top(&self) -> Address {
        self.top
    }

    fn end(&self) -> Address {
        self.end
    }

    fn contiguous_available(&self) -> usize {
        self.free_words()
    }

    fn is_in(&self, p: Address) -> bool {
        self.bottom <= p && p < self.top
    }

    fn allocate(&mut self, word_size: usize) -> Option<Address> {
        if word_size == 0 {
            return None;
        }
        let new_top = self.top.offset_words(word_size);
        if new_top > self.end {
            return None;
        }
        let result = self.top;
        self.top = new_top;
        Some(result)
    }

    fn block_start(&self, p: Address) -> Address {
        debug_assert!(self.is_in_reserved(p));
        if p >= self.top {
            return self.top;
        }
        let mut cur = self.bottom;
        loop {
            let size = self.block_size(cur);
            let next = cur.offset_words(size);
            if p < next {
                return cur;
            }
            cur = next;
        }
    }

    fn block_size(&self, p: Address) -> usize {
        if p == self.top {
            return self.free_words();
        }
        debug_assert!(self.is_in(p));
        let size = object::size_at(p);
        assert!(
            size > 0,
            "zero-size block at {} in space {}: heap corruption",
            p,
            self.name
        );
        size
    }

    fn block_is_obj(&self, p: Address) -> bool {
        p < self.top
    }

    fn object_iterate(&self, visitor: &mut dyn FnMut(Address)) {
        self.walk_blocks(false, visitor);
    }

    fn safe_object_iterate(&self, visitor: &mut dyn FnMut(Address)) {
        self.walk_blocks(true, visitor);
    }

    fn clear(&mut self) {
        self.top = self.bottom;
        self.compaction_top = self.bottom;
    }

    fn as_compactible(&mut self) -> Option<&mut dyn CompactibleSpace> {
        Some(self)
    }

    fn as_compactible_ref(&self) -> Option<&dyn CompactibleSpace> {
        Some(self)
    }
}

impl CompactibleSpace for ContiguousSpace {
    fn next_compaction_space(&self) -> Option<usize> {
        self.next_compaction_space
    }

    fn compaction_top(&self) -> Address {
        self.compaction_top
    }

    fn set_compaction_top(&mut self, top: Address) {
        self.compaction_top = top;
    }

    fn prepare_for_compaction(&mut self, cp: &mut CompactPoint) {
        self.walk_blocks(false, &mut |obj| {
            if object::is_marked_at(obj) {
                let new = cp.forward(obj, object::size_at(obj));
                trace!("forwarding {} -> {} in {}", obj, new, self.name);
            }
        });
    }

    fn compact(&mut self, forwarding: &ForwardingTable) {
        let mut moved = 0usize;
        self.walk_blocks(false, &mut |obj| {
            if !object::is_marked_at(obj) {
                return;
            }
            let new = match forwarding.new_location(obj) {
                Some(new) => new,
                None => panic!(
                    "marked object at {} in space {} was never forwarded",
                    obj, self.name
                ),
            };
            let size = object::size_at(obj);
            if new != obj {
                object::copy_words(obj, new, size);
                moved += 1;
            }
            object::set_mark_at(new, false);
        });
        trace!("compacted space {}: moved {} objects", self.name, moved);
        self.top = self.compaction_top;
    }
}
