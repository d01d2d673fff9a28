//! Generational heap - the generation abstraction and its collaborators
//!
//! This component provides:
//! - Generations (young + old) over reserved and committed virtual memory
//! - Generic containment, block-metadata and iteration algorithms over an
//!   ordered collection of heterogeneous spaces
//! - The promotion protocol with heap-level failure escalation
//! - The three-pass compaction protocol (prepare, adjust pointers, compact)
//! - Remembered-set and reference-processor collaborators
//!
//! Everything here runs while the mutator is stopped at a safepoint owned by
//! the enclosing heap; see individual modules for the exact contracts.

pub mod compaction;
pub mod generation;
pub mod heap;
pub mod object;
pub mod reference_processor;
pub mod remembered_set;
pub mod space;
pub mod stats;
pub mod virtual_space;

// Re-export main types
pub use compaction::{CompactDest, CompactPoint, ForwardingTable};
pub use generation::{GenLevel, Generation, GenerationSpec};
pub use heap::{GenHeap, GenHeapConfig};
pub use object::{MarkWord, ObjectHeader, HEADER_WORDS};
pub use reference_processor::ReferenceProcessor;
pub use remembered_set::RememberedSet;
pub use space::{CompactibleSpace, ContiguousSpace, Space};
pub use stats::StatRecord;
pub use virtual_space::{VirtualSpace, MANGLE_WORD};
