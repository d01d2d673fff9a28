//! Heap addresses and memory regions.
//!
//! The heap layer deliberately manipulates memory layout rather than
//! language-level values, so it uses a dedicated address type instead of
//! ordinary references or raw pointers. Word-granular arithmetic lives here;
//! everything above this module talks in words, not bytes.

use std::fmt;

/// Size of a heap word in bytes.
///
/// All object and block sizes at the generation/space API are expressed in
/// words of this size.
pub const WORD_BYTES: usize = 8;

/// A byte address inside the heap.
///
/// `Address` is an opaque wrapper around a raw address. It supports only the
/// word-granular arithmetic the heap algorithms need, which keeps layout
/// manipulation from being confused with safe references elsewhere in the
/// system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(usize);

impl Address {
    /// Creates an address from a raw byte address.
    pub const fn new(raw: usize) -> Self {
        Address(raw)
    }

    /// Returns the raw byte address.
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Returns this address advanced by `n` bytes.
    pub const fn offset_bytes(self, n: usize) -> Address {
        Address(self.0 + n)
    }

    /// Returns this address advanced by `n` words.
    pub const fn offset_words(self, n: usize) -> Address {
        Address(self.0 + n * WORD_BYTES)
    }

    /// Returns the distance in bytes from `other` to `self`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `other` is above `self`.
    pub fn byte_diff(self, other: Address) -> usize {
        debug_assert!(other.0 <= self.0, "address underflow in byte_diff");
        self.0 - other.0
    }

    /// Returns the distance in whole words from `other` to `self`.
    pub fn word_diff(self, other: Address) -> usize {
        self.byte_diff(other) / WORD_BYTES
    }

    /// Returns true if this address is word aligned.
    pub const fn is_word_aligned(self) -> bool {
        self.0 % WORD_BYTES == 0
    }

    /// Returns the smaller of two addresses.
    pub fn min(self, other: Address) -> Address {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Returns the larger of two addresses.
    pub fn max(self, other: Address) -> Address {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A half-open region of heap memory `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRegion {
    start: Address,
    end: Address,
}

impl MemRegion {
    /// Creates a region spanning `[start, end)`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `end` is below `start`.
    pub fn new(start: Address, end: Address) -> Self {
        debug_assert!(start.raw() <= end.raw(), "inverted memory region");
        MemRegion { start, end }
    }

    /// Creates an empty region at address zero.
    pub const fn empty() -> Self {
        MemRegion {
            start: Address::new(0),
            end: Address::new(0),
        }
    }

    /// Returns the inclusive lower bound.
    pub const fn start(&self) -> Address {
        self.start
    }

    /// Returns the exclusive upper bound.
    pub const fn end(&self) -> Address {
        self.end
    }

    /// Returns the size of the region in bytes.
    pub fn byte_size(&self) -> usize {
        self.end.byte_diff(self.start)
    }

    /// Returns the size of the region in whole words.
    pub fn word_size(&self) -> usize {
        self.byte_size() / WORD_BYTES
    }

    /// Returns true if the region covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `addr` lies within `[start, end)`.
    pub fn contains(&self, addr: Address) -> bool {
        self.start <= addr && addr < self.end
    }

    /// Returns true if `other` lies entirely within this region.
    pub fn contains_region(&self, other: &MemRegion) -> bool {
        other.is_empty() || (self.start <= other.start && other.end <= self.end)
    }
}

impl fmt::Display for MemRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start.raw(), self.end.raw())
    }
}
