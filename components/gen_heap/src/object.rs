//! Object headers and raw object accessors.
//!
//! Every block in a space starts with a one-word [`ObjectHeader`] giving its
//! size, its reference-slot count, and its mark state. The payload follows
//! the header; the first `ref_count` payload words are reference slots
//! holding [`Address`] values, the rest is opaque object data.
//!
//! The accessors here read and write heap memory through raw addresses. They
//! require the address to point at a block inside a committed space region;
//! the space and generation layers uphold that by construction.

use std::ptr;

use heap_types::{Address, WORD_BYTES};

/// Header words at the front of every block.
pub const HEADER_WORDS: usize = 1;

/// The saved mark word passed alongside an object during parallel promotion.
pub type MarkWord = u64;

/// One-word header at the start of every block.
///
/// `size_words` includes the header itself. A header with `size_words == 0`
/// marks a block that is still being published and terminates safe walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ObjectHeader {
    /// Total block size in words, including the header
    pub size_words: u32,
    /// Number of reference slots at the front of the payload
    pub ref_count: u16,
    /// Mark state: non-zero means live for the current collection
    pub mark: u8,
    /// Reserved for alignment
    pub _pad: u8,
}

impl ObjectHeader {
    /// Creates an unmarked header for a block of `size_words` with
    /// `ref_count` leading reference slots.
    pub fn new(size_words: usize, ref_count: usize) -> Self {
        debug_assert!(size_words >= HEADER_WORDS + ref_count);
        ObjectHeader {
            size_words: size_words as u32,
            ref_count: ref_count as u16,
            mark: 0,
            _pad: 0,
        }
    }

    /// Returns true if the mark bit is set.
    pub fn is_marked(&self) -> bool {
        self.mark != 0
    }
}

/// Reads the header of the block starting at `addr`.
pub fn header_at(addr: Address) -> ObjectHeader {
    // SAFETY: addr points at a block header inside a committed space region;
    // the header is one aligned word.
    unsafe { (addr.raw() as *const ObjectHeader).read() }
}

/// Returns the size in words of the block starting at `addr`.
pub fn size_at(addr: Address) -> usize {
    header_at(addr).size_words as usize
}

/// Returns the number of reference slots of the object starting at `addr`.
pub fn ref_count_at(addr: Address) -> usize {
    header_at(addr).ref_count as usize
}

/// Returns true if the object starting at `addr` is marked live.
pub fn is_marked_at(addr: Address) -> bool {
    header_at(addr).is_marked()
}

/// Sets or clears the mark bit of the object starting at `addr`.
pub fn set_mark_at(addr: Address, marked: bool) {
    // SAFETY: addr points at a block header inside a committed space region.
    unsafe {
        let header = addr.raw() as *mut ObjectHeader;
        (*header).mark = u8::from(marked);
    }
}

/// Writes a fresh object at `addr`: header plus reference slots.
///
/// `size_words` includes the header. Payload words beyond the reference
/// slots are left untouched.
pub fn write_object(addr: Address, size_words: usize, refs: &[Address]) {
    debug_assert!(addr.is_word_aligned());
    debug_assert!(size_words >= HEADER_WORDS + refs.len());
    // SAFETY: addr points at the start of an allocated block of at least
    // size_words words inside a committed space region.
    unsafe {
        let header = addr.raw() as *mut ObjectHeader;
        header.write(ObjectHeader::new(size_words, refs.len()));
    }
    for (i, referent) in refs.iter().enumerate() {
        set_ref_slot(addr, i, *referent);
    }
}

/// Returns the address of reference slot `slot` of the object at `addr`.
fn ref_slot_addr(addr: Address, slot: usize) -> Address {
    addr.offset_words(HEADER_WORDS + slot)
}

/// Reads reference slot `slot` of the object starting at `addr`.
pub fn ref_slot(addr: Address, slot: usize) -> Address {
    debug_assert!(slot < ref_count_at(addr));
    // SAFETY: the slot lies within the object's payload, which lies within a
    // committed space region.
    unsafe { Address::new((ref_slot_addr(addr, slot).raw() as *const usize).read()) }
}

/// Writes reference slot `slot` of the object starting at `addr`.
pub fn set_ref_slot(addr: Address, slot: usize, referent: Address) {
    debug_assert!(slot < ref_count_at(addr));
    // SAFETY: the slot lies within the object's payload, which lies within a
    // committed space region.
    unsafe {
        (ref_slot_addr(addr, slot).raw() as *mut usize).write(referent.raw());
    }
}

/// Applies `visitor` to every reference slot of the object at `addr`,
/// passing the slot index and the referent it currently holds.
pub fn for_each_ref_slot(addr: Address, mut visitor: impl FnMut(usize, Address)) {
    for slot in 0..ref_count_at(addr) {
        visitor(slot, ref_slot(addr, slot));
    }
}

/// Copies `size_words` words from `from` to `to`.
///
/// The regions must not overlap; promotion always copies into freshly
/// allocated memory.
pub fn copy_disjoint_words(from: Address, to: Address, size_words: usize) {
    debug_assert!(from.is_word_aligned() && to.is_word_aligned());
    debug_assert!(
        to.raw() + size_words * WORD_BYTES <= from.raw()
            || from.raw() + size_words * WORD_BYTES <= to.raw(),
        "overlapping copy in copy_disjoint_words"
    );
    // SAFETY: both regions are word aligned, disjoint, and lie within
    // committed space regions owned by the heap.
    unsafe {
        ptr::copy_nonoverlapping(from.raw() as *const u64, to.raw() as *mut u64, size_words);
    }
}

/// Copies `size_words` words from `from` to `to`, allowing overlap.
///
/// Compaction slides objects toward lower addresses within a space, so the
/// source and destination of a move may overlap.
pub fn copy_words(from: Address, to: Address, size_words: usize) {
    debug_assert!(from.is_word_aligned() && to.is_word_aligned());
    // SAFETY: both regions are word aligned and lie within committed space
    // regions owned by the heap; overlap is handled by ptr::copy.
    unsafe {
        ptr::copy(from.raw() as *const u64, to.raw() as *mut u64, size_words);
    }
}
