//! The generation abstraction: a reserved address range subdivided into
//! spaces, with generic algorithms over them.
//!
//! A generation owns a [`VirtualSpace`] for its backing memory and an ordered
//! collection of [`Space`] handles partitioning the committed range. Every
//! generic algorithm here (containment, block metadata, iteration, the
//! compaction passes) is a deterministic in-order fold over those handles;
//! concrete generation types may override with faster direct implementations,
//! but the observable contract is what this module defines.
//!
//! All operations run while the mutator is stopped at a safepoint owned by
//! the enclosing heap, so nothing here takes a lock.

use std::fmt;
use std::time::Duration;

use heap_types::{Address, HeapError, MemRegion, WORD_BYTES};
use log::{debug, info};

use crate::compaction::{CompactDest, CompactPoint, ForwardingTable};
use crate::heap::GenHeap;
use crate::object;
use crate::reference_processor::ReferenceProcessor;
use crate::remembered_set::RememberedSet;
use crate::space::{ContiguousSpace, Space};
use crate::stats::StatRecord;
use crate::virtual_space::VirtualSpace;

/// Age level of a generation. The model is strictly two-level: exactly one
/// young generation (non-terminal) and one old generation (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenLevel {
    /// Level 0: newly allocated objects
    Young,
    /// Level 1: objects that survived promotion
    Old,
}

impl GenLevel {
    /// Returns the numeric level: 0 for young, 1 for old.
    pub fn index(self) -> usize {
        match self {
            GenLevel::Young => 0,
            GenLevel::Old => 1,
        }
    }

    /// Returns true for the young generation.
    pub fn is_young(self) -> bool {
        matches!(self, GenLevel::Young)
    }
}

/// Construction parameters for one generation.
#[derive(Debug, Clone)]
pub struct GenerationSpec {
    /// Name used in diagnostics
    pub name: String,
    /// Age level
    pub level: GenLevel,
    /// Initially committed size in bytes
    pub initial_bytes: usize,
    /// Reserved maximum in bytes; fixes `max_capacity` for the generation's
    /// lifetime
    pub reserved_bytes: usize,
    /// Number of contiguous spaces the committed range is split into
    pub space_count: usize,
}

impl GenerationSpec {
    /// Creates a spec with a single space and equal initial and reserved
    /// sizes.
    pub fn new(name: impl Into<String>, level: GenLevel, bytes: usize) -> Self {
        GenerationSpec {
            name: name.into(),
            level,
            initial_bytes: bytes,
            reserved_bytes: bytes,
            space_count: 1,
        }
    }
}

/// A heap partition holding objects of one approximate age.
#[derive(Debug)]
pub struct Generation {
    name: String,
    level: GenLevel,
    /// Frozen at construction from the virtual space boundaries
    reserved: MemRegion,
    // Dropped before the virtual space that backs its span.
    ref_processor: Option<ReferenceProcessor>,
    spaces: Vec<Box<dyn Space>>,
    first_compaction_space: Option<usize>,
    stat_record: StatRecord,
    #[cfg(debug_assertions)]
    promotion_failure_forced: bool,
    virtual_space: VirtualSpace,
}

impl Generation {
    /// Commits backing memory per `spec` and carves the committed range into
    /// `spec.space_count` chained contiguous spaces.
    ///
    /// `reserved` is derived from the committed virtual memory's boundaries
    /// and frozen; heap bring-up treats any error here as fatal.
    pub fn new(spec: &GenerationSpec) -> Result<Self, HeapError> {
        let virtual_space = VirtualSpace::initialize(spec.reserved_bytes, spec.initial_bytes)?;
        let reserved = virtual_space.reserved_region();

        let committed = virtual_space.committed_region();
        let count = spec.space_count.max(1);
        let total_words = committed.word_size();
        let per_space = total_words / count;

        let mut spaces: Vec<Box<dyn Space>> = Vec::with_capacity(count);
        let mut cursor = committed.start();
        for i in 0..count {
            let words = if i == count - 1 {
                committed.end().word_diff(cursor)
            } else {
                per_space
            };
            let region = MemRegion::new(cursor, cursor.offset_words(words));
            let mut space = ContiguousSpace::new(format!("{} space {}", spec.name, i), region);
            space.set_next_compaction_space((i + 1 < count).then_some(i + 1));
            spaces.push(Box::new(space));
            cursor = region.end();
        }

        Ok(Generation {
            name: spec.name.clone(),
            level: spec.level,
            reserved,
            ref_processor: None,
            spaces,
            first_compaction_space: Some(0),
            stat_record: StatRecord::new(),
            #[cfg(debug_assertions)]
            promotion_failure_forced: false,
            virtual_space,
        })
    }

    /// Returns the generation's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the generation's age level.
    pub fn level(&self) -> GenLevel {
        self.level
    }

    /// Returns the reserved region, fixed at construction.
    pub fn reserved(&self) -> MemRegion {
        self.reserved
    }

    /// Returns the maximum capacity in bytes; equals the reserved region's
    /// size for the generation's entire lifetime.
    pub fn max_capacity(&self) -> usize {
        self.reserved.byte_size()
    }

    /// Returns the committed capacity in bytes, summed over owned spaces.
    pub fn capacity(&self) -> usize {
        self.spaces
            .iter()
            .map(|sp| sp.capacity_words() * WORD_BYTES)
            .sum()
    }

    /// Returns the allocated size in bytes, summed over owned spaces.
    pub fn used(&self) -> usize {
        self.spaces
            .iter()
            .map(|sp| sp.used_words() * WORD_BYTES)
            .sum()
    }

    /// Returns the unallocated size in bytes, summed over owned spaces.
    pub fn free(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Returns the largest single contiguous free extent in this generation,
    /// in words.
    pub fn contiguous_available(&self) -> usize {
        self.spaces
            .iter()
            .map(|sp| sp.contiguous_available())
            .max()
            .unwrap_or(0)
    }

    /// Returns the number of owned spaces.
    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    /// Returns the owned space at `index`.
    pub fn space_at(&self, index: usize) -> &dyn Space {
        self.spaces[index].as_ref()
    }

    /// Applies `visitor` to every owned space in enumeration order.
    pub fn space_iterate(&self, visitor: &mut dyn FnMut(&dyn Space)) {
        for sp in &self.spaces {
            visitor(sp.as_ref());
        }
    }

    /// Returns true if any owned space reports `p` as logically in use.
    pub fn is_in(&self, p: Address) -> bool {
        self.spaces.iter().any(|sp| sp.is_in(p))
    }

    /// Returns true if `p` lies in the generation's reserved region.
    pub fn is_in_reserved(&self, p: Address) -> bool {
        self.reserved.contains(p)
    }

    /// Returns the first owned space whose reserved extent contains `p`.
    pub fn space_containing(&self, p: Address) -> Option<&dyn Space> {
        self.spaces
            .iter()
            .find(|sp| sp.is_in_reserved(p))
            .map(|sp| sp.as_ref())
    }

    /// Returns the start of the block containing `p`, or `None` if `p` lies
    /// in no owned space's reserved extent.
    pub fn block_start(&self, p: Address) -> Option<Address> {
        self.space_containing(p).map(|sp| sp.block_start(p))
    }

    /// Returns the size in words of the block starting at `p`.
    ///
    /// # Panics
    ///
    /// Panics if `p` lies in no owned space, or if the space reports a
    /// zero-size block; a zero result signals heap corruption, not a valid
    /// empty block.
    pub fn block_size(&self, p: Address) -> usize {
        let sp = match self.space_containing(p) {
            Some(sp) => sp,
            None => panic!("block_size: {} is not in generation {}", p, self.name),
        };
        let size = sp.block_size(p);
        assert!(
            size > 0,
            "zero-size block at {} in generation {}: heap corruption",
            p,
            self.name
        );
        size
    }

    /// Returns true if the block containing `p` is a live object rather than
    /// free space.
    pub fn block_is_obj(&self, p: Address) -> bool {
        self.space_containing(p)
            .map(|sp| sp.block_is_obj(p))
            .unwrap_or(false)
    }

    /// Applies `visitor` to every reference in every owned space, in
    /// enumeration order.
    pub fn oop_iterate(&self, visitor: &mut dyn FnMut(Address)) {
        for sp in &self.spaces {
            sp.oop_iterate(visitor);
        }
    }

    /// Applies `visitor` to every object in every owned space, in
    /// enumeration order.
    pub fn object_iterate(&self, visitor: &mut dyn FnMut(Address)) {
        for sp in &self.spaces {
            sp.object_iterate(visitor);
        }
    }

    /// Like [`Generation::object_iterate`], but tolerates spaces in a
    /// transitional state, skipping blocks another phase is still publishing.
    pub fn safe_object_iterate(&self, visitor: &mut dyn FnMut(Address)) {
        for sp in &self.spaces {
            sp.safe_object_iterate(visitor);
        }
    }

    /// Applies `visitor` to every recorded reference slot in `space` that
    /// points into a younger generation, by delegating to the remembered set.
    pub fn younger_refs_in_space_iterate(
        &self,
        rem_set: &RememberedSet,
        space: &dyn Space,
        visitor: &mut dyn FnMut(Address),
    ) {
        rem_set.younger_refs_in_space_iterate(space.reserved(), visitor);
    }

    /// Attempts a non-blocking allocation of `word_size` words from the
    /// first owned space that can satisfy it. Never triggers a collection.
    pub fn allocate(&mut self, word_size: usize) -> Option<Address> {
        self.spaces.iter_mut().find_map(|sp| sp.allocate(word_size))
    }

    /// Relocates the object at `obj` into this generation.
    ///
    /// On allocation success the object's `size_words` words are copied,
    /// word aligned and non-overlapping, into the new location and its
    /// address returned. On failure the heap-level `on_failure` handler is
    /// consulted; a `None` result means promotion failed for this object,
    /// which the caller must treat as an outcome, not an error.
    pub fn promote(
        &mut self,
        obj: Address,
        size_words: usize,
        on_failure: &mut dyn FnMut(Address, usize) -> Option<Address>,
    ) -> Option<Address> {
        debug_assert_eq!(
            size_words,
            object::size_at(obj),
            "promote called with wrong object size"
        );

        #[cfg(debug_assertions)]
        if self.promotion_failure_forced {
            return None;
        }

        match self.allocate(size_words) {
            Some(new) => {
                object::copy_disjoint_words(obj, new, size_words);
                Some(new)
            }
            None => on_failure(obj, size_words),
        }
    }

    /// Contract for parallel-capable generations; this generation type does
    /// not support concurrent promotion from multiple collector threads.
    ///
    /// # Panics
    ///
    /// Always. Calling this on the base generation type is a misuse of an
    /// unimplemented capability, deliberately fatal so the omission cannot
    /// be ignored in testing.
    pub fn par_promote(
        &mut self,
        _thread_index: usize,
        _obj: Address,
        _mark: object::MarkWord,
        _size_words: usize,
    ) -> Option<Address> {
        // A general implementation could take a lock here. It must not.
        panic!(
            "par_promote: generation '{}' does not support parallel promotion",
            self.name
        );
    }

    /// Forces the next promotion attempts to fail, exercising the failure
    /// path deterministically. Debug builds only.
    #[cfg(debug_assertions)]
    pub fn force_promotion_failure(&mut self, force: bool) {
        self.promotion_failure_forced = force;
    }

    /// Returns the next older generation in the chain: the old generation
    /// for the young one, `None` for the old one.
    pub fn next_gen<'h>(&self, heap: &'h GenHeap) -> Option<&'h Generation> {
        match self.level {
            GenLevel::Young => Some(heap.old()),
            GenLevel::Old => None,
        }
    }

    /// Returns the largest single contiguous free extent, in words, in this
    /// or any older generation.
    ///
    /// This bounds the largest object promotable without a fragmentation
    /// failure anywhere downstream. Written as a generic chain walk; the
    /// chain has at most two generations.
    pub fn max_contiguous_available(&self, heap: &GenHeap) -> usize {
        let mut max = 0;
        let mut gen = Some(self);
        while let Some(g) = gen {
            max = max.max(g.contiguous_available());
            gen = g.next_gen(heap);
        }
        max
    }

    /// Returns true if an object of `word_size` words can be promoted
    /// somewhere in the chain without a fragmentation failure. Inclusive:
    /// exactly-fitting sizes are safe.
    pub fn promotion_attempt_is_safe(&self, heap: &GenHeap, word_size: usize) -> bool {
        let available = self.max_contiguous_available(heap);
        let res = available >= word_size;
        debug!(
            "generation {}: promo attempt is{} safe: available({}) {} max_promo({})",
            self.name,
            if res { "" } else { " not" },
            available,
            if res { ">=" } else { "<" },
            word_size
        );
        res
    }

    /// Returns the chain of compactible spaces as destination extents for a
    /// [`CompactPoint`], in chain order.
    pub fn compaction_dests(&self) -> Vec<CompactDest> {
        let mut dests = Vec::new();
        let mut next = self.first_compaction_space;
        while let Some(i) = next {
            let sp = self.spaces[i]
                .as_compactible_ref()
                .expect("compaction chain links a non-compactible space");
            dests.push(CompactDest {
                space_index: i,
                bottom: sp.bottom(),
                end: sp.end(),
            });
            next = sp.next_compaction_space();
        }
        dests
    }

    /// Compaction pass 1: walks the chain of compactible spaces via their
    /// successor links, assigning every marked object its post-compaction
    /// address through the shared cursor and recording each space's planned
    /// fill level.
    pub fn prepare_for_compaction(&mut self, cp: &mut CompactPoint) {
        let mut next = self.first_compaction_space;
        while let Some(i) = next {
            let sp = self.spaces[i]
                .as_compactible()
                .expect("compaction chain links a non-compactible space");
            sp.prepare_for_compaction(cp);
            next = sp.next_compaction_space();
        }

        let mut next = self.first_compaction_space;
        while let Some(i) = next {
            let sp = self.spaces[i]
                .as_compactible()
                .expect("compaction chain links a non-compactible space");
            if let Some(top) = cp.planned_top(i) {
                sp.set_compaction_top(top);
            }
            next = sp.next_compaction_space();
        }
    }

    /// Compaction pass 2: rewrites every live reference in ALL owned spaces,
    /// compactible or not, to its referent's post-compaction address.
    ///
    /// Must run after pass 1 has committed every target address and before
    /// pass 3 moves anything, since it needs old and new addresses at once.
    pub fn adjust_pointers(&mut self, forwarding: &ForwardingTable) {
        for sp in &mut self.spaces {
            sp.adjust_pointers(forwarding);
        }
    }

    /// Compaction pass 3: walks the compactible chain again and physically
    /// relocates each space's live objects to their assigned addresses.
    pub fn compact(&mut self, forwarding: &ForwardingTable) {
        let mut next = self.first_compaction_space;
        while let Some(i) = next {
            let sp = self.spaces[i]
                .as_compactible()
                .expect("compaction chain links a non-compactible space");
            sp.compact(forwarding);
            next = sp.next_compaction_space();
        }
    }

    /// Reclaims every owned space, invalidating all objects in the
    /// generation. Called after evacuation-style collections.
    pub fn clear(&mut self) {
        for sp in &mut self.spaces {
            sp.clear();
        }
    }

    /// Lazily constructs the reference processor, scoped to the reserved
    /// region. Single-threaded discovery; generation types needing
    /// multi-threaded discovery override this hook.
    ///
    /// # Panics
    ///
    /// Panics if called twice or if the reserved region is empty.
    pub fn ref_processor_init(&mut self) {
        assert!(
            self.ref_processor.is_none(),
            "a reference processor already exists"
        );
        assert!(!self.reserved.is_empty(), "empty generation?");
        self.ref_processor = Some(ReferenceProcessor::new(self.reserved));
    }

    /// Returns the reference processor, if initialized.
    pub fn ref_processor(&self) -> Option<&ReferenceProcessor> {
        self.ref_processor.as_ref()
    }

    /// Mutable access to the reference processor, if initialized.
    pub fn ref_processor_mut(&mut self) -> Option<&mut ReferenceProcessor> {
        self.ref_processor.as_mut()
    }

    /// Returns the accumulated collection statistics.
    pub fn stat_record(&self) -> &StatRecord {
        &self.stat_record
    }

    /// Folds one collection's elapsed time into the statistics.
    pub fn update_gc_stats(&mut self, elapsed: Duration) {
        self.stat_record.record_collection(elapsed);
    }

    /// Returns the accumulated-statistics summary line.
    pub fn summary_info(&self) -> String {
        self.stat_record.summary(self.level.index())
    }

    /// Logs the change in usage across a collection.
    pub fn print_heap_change(&self, prev_used: usize) {
        info!(
            " {}K->{}K({}K)",
            prev_used / 1024,
            self.used() / 1024,
            self.capacity() / 1024
        );
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            " {:<20} total {}K, used {}K [{:#x}, {:#x}, {:#x})",
            self.name,
            self.capacity() / 1024,
            self.used() / 1024,
            self.virtual_space.low_boundary(),
            self.virtual_space.high(),
            self.virtual_space.high_boundary()
        )
    }
}
