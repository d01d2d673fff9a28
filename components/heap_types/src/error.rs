//! Errors raised while setting up or resizing heap memory.
//!
//! Heap bring-up treats every variant here as fatal: generation setup happens
//! exactly once, before the mutator runs, and has no fallback. The variants
//! exist so callers can report precisely what went wrong before aborting.

use thiserror::Error;

/// An error raised while reserving, committing, or resizing heap memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    /// A zero-sized reservation was requested.
    #[error("cannot reserve a zero-sized heap region")]
    ZeroReservation,

    /// A size was not a whole number of heap words.
    #[error("size {requested} is not word aligned")]
    UnalignedSize {
        /// The offending size in bytes.
        requested: usize,
    },

    /// The initial committed size exceeds the reserved maximum.
    #[error("committed size {committed} exceeds reserved maximum {reserved}")]
    CommitBeyondReserved {
        /// Requested committed size in bytes.
        committed: usize,
        /// Reserved maximum in bytes.
        reserved: usize,
    },

    /// An expansion request would grow past the reserved maximum.
    #[error("expansion by {requested} bytes exceeds reserved maximum {reserved}")]
    ExpandBeyondReserved {
        /// Requested growth in bytes.
        requested: usize,
        /// Reserved maximum in bytes.
        reserved: usize,
    },

    /// A shrink request would drop below an empty committed region.
    #[error("shrink by {requested} bytes exceeds committed size {committed}")]
    ShrinkBeyondCommitted {
        /// Requested shrink in bytes.
        requested: usize,
        /// Committed size in bytes.
        committed: usize,
    },
}
