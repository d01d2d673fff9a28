//! Reserved and committed backing memory for a generation.
//!
//! A [`VirtualSpace`] owns one maximal allocation (the reserved range) and
//! tracks how much of it is currently committed. The committed prefix may
//! grow and shrink over the generation's lifetime, but the reserved range is
//! fixed at initialization and bounds the generation's maximum capacity.

use std::alloc::{alloc, dealloc, Layout};

use heap_types::{Address, HeapError, MemRegion, WORD_BYTES};

/// Fill pattern written over committed-but-unused memory in debug builds.
///
/// Reads of mangled memory show up as this recognizable word rather than
/// whatever the allocator left behind.
pub const MANGLE_WORD: u64 = 0xBAAD_BABE_BAAD_BABE;

/// Backing memory for one generation.
///
/// The reserved range `[low_boundary, high_boundary)` is allocated up front
/// and never moves. The committed range `[low, high)` is the prefix the
/// generation may actually use; it can be expanded toward the high boundary
/// and shrunk back, always in whole words.
#[derive(Debug)]
pub struct VirtualSpace {
    /// Base of the reserved allocation
    base: *mut u8,
    /// Size of the reserved allocation in bytes
    reserved_bytes: usize,
    /// Size of the committed prefix in bytes
    committed_bytes: usize,
}

// SAFETY: VirtualSpace exclusively owns the allocation behind `base`; the
// raw pointer is never shared outside the heap structures that own it.
unsafe impl Send for VirtualSpace {}

impl VirtualSpace {
    /// Reserves `reserved_bytes` of memory and commits the first
    /// `committed_bytes` of it.
    ///
    /// Both sizes must be word aligned and `committed_bytes` must not exceed
    /// `reserved_bytes`. In debug builds the committed region is mangled with
    /// [`MANGLE_WORD`] to expose uninitialized reads.
    ///
    /// # Panics
    ///
    /// Panics if the underlying allocator cannot satisfy the reservation.
    /// Generation setup happens once, before the mutator runs, and has no
    /// fallback for resource exhaustion.
    pub fn initialize(reserved_bytes: usize, committed_bytes: usize) -> Result<Self, HeapError> {
        if reserved_bytes == 0 {
            return Err(HeapError::ZeroReservation);
        }
        if reserved_bytes % WORD_BYTES != 0 {
            return Err(HeapError::UnalignedSize {
                requested: reserved_bytes,
            });
        }
        if committed_bytes % WORD_BYTES != 0 {
            return Err(HeapError::UnalignedSize {
                requested: committed_bytes,
            });
        }
        if committed_bytes > reserved_bytes {
            return Err(HeapError::CommitBeyondReserved {
                committed: committed_bytes,
                reserved: reserved_bytes,
            });
        }

        let layout = Layout::from_size_align(reserved_bytes, WORD_BYTES)
            .map_err(|_| HeapError::ZeroReservation)?;
        // SAFETY: layout has non-zero size and word alignment.
        let base = unsafe { alloc(layout) };
        if base.is_null() {
            panic!(
                "could not reserve {} bytes of backing memory for object heap",
                reserved_bytes
            );
        }

        let space = VirtualSpace {
            base,
            reserved_bytes,
            committed_bytes,
        };
        space.mangle_region(space.committed_region());
        Ok(space)
    }

    /// Returns the low end of the committed region.
    pub fn low(&self) -> Address {
        Address::new(self.base as usize)
    }

    /// Returns the high end of the committed region.
    pub fn high(&self) -> Address {
        self.low().offset_bytes(self.committed_bytes)
    }

    /// Returns the low end of the reserved range.
    pub fn low_boundary(&self) -> Address {
        self.low()
    }

    /// Returns the high end of the reserved range.
    pub fn high_boundary(&self) -> Address {
        self.low().offset_bytes(self.reserved_bytes)
    }

    /// Returns the committed region `[low, high)`.
    pub fn committed_region(&self) -> MemRegion {
        MemRegion::new(self.low(), self.high())
    }

    /// Returns the reserved region `[low_boundary, high_boundary)`.
    pub fn reserved_region(&self) -> MemRegion {
        MemRegion::new(self.low_boundary(), self.high_boundary())
    }

    /// Returns the committed size in bytes.
    pub fn committed_size(&self) -> usize {
        self.committed_bytes
    }

    /// Returns the reserved size in bytes.
    pub fn reserved_size(&self) -> usize {
        self.reserved_bytes
    }

    /// Returns the reserved-but-uncommitted size in bytes.
    pub fn uncommitted_size(&self) -> usize {
        self.reserved_bytes - self.committed_bytes
    }

    /// Grows the committed region by `bytes` toward the high boundary.
    ///
    /// The newly committed region is mangled in debug builds.
    pub fn expand_by(&mut self, bytes: usize) -> Result<(), HeapError> {
        if bytes % WORD_BYTES != 0 {
            return Err(HeapError::UnalignedSize { requested: bytes });
        }
        if self.committed_bytes + bytes > self.reserved_bytes {
            return Err(HeapError::ExpandBeyondReserved {
                requested: bytes,
                reserved: self.reserved_bytes,
            });
        }
        let old_high = self.high();
        self.committed_bytes += bytes;
        self.mangle_region(MemRegion::new(old_high, self.high()));
        Ok(())
    }

    /// Shrinks the committed region by `bytes`.
    pub fn shrink_by(&mut self, bytes: usize) -> Result<(), HeapError> {
        if bytes % WORD_BYTES != 0 {
            return Err(HeapError::UnalignedSize { requested: bytes });
        }
        if bytes > self.committed_bytes {
            return Err(HeapError::ShrinkBeyondCommitted {
                requested: bytes,
                committed: self.committed_bytes,
            });
        }
        self.committed_bytes -= bytes;
        Ok(())
    }

    /// Fills `region` with [`MANGLE_WORD`] in debug builds.
    ///
    /// `region` must lie within this virtual space's reserved range.
    pub fn mangle_region(&self, region: MemRegion) {
        debug_assert!(self.reserved_region().contains_region(&region));
        if cfg!(debug_assertions) {
            let mut cur = region.start();
            while cur < region.end() {
                // SAFETY: region lies within the reserved allocation owned by
                // this virtual space, and cur is word aligned within it.
                unsafe {
                    (cur.raw() as *mut u64).write(MANGLE_WORD);
                }
                cur = cur.offset_words(1);
            }
        }
    }
}

impl Drop for VirtualSpace {
    fn drop(&mut self) {
        if !self.base.is_null() {
            // Unwrap is safe: the identical layout was validated in initialize.
            let layout = Layout::from_size_align(self.reserved_bytes, WORD_BYTES)
                .expect("layout validated at initialization");
            // SAFETY: base was allocated in initialize with this exact layout
            // and is deallocated exactly once.
            unsafe {
                dealloc(self.base, layout);
            }
        }
    }
}
