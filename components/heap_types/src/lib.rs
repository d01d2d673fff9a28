//! Foundational types for the generational heap.
//!
//! This crate provides the building blocks shared by every heap component,
//! including the raw addressing model and error types.
//!
//! # Overview
//!
//! - [`Address`] - A distinct heap address type, never conflated with references
//! - [`MemRegion`] - A half-open `[start, end)` region of heap memory
//! - [`HeapError`] - Errors raised while setting up or resizing heap memory
//! - [`WORD_BYTES`] - The heap word size; all object sizes are word-granular
//!
//! # Examples
//!
//! ```
//! use heap_types::{Address, MemRegion, WORD_BYTES};
//!
//! let start = Address::new(0x1000);
//! let region = MemRegion::new(start, start.offset_words(8));
//!
//! assert_eq!(region.byte_size(), 8 * WORD_BYTES);
//! assert!(region.contains(start.offset_words(7)));
//! assert!(!region.contains(start.offset_words(8)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod address;
mod error;

pub use address::{Address, MemRegion, WORD_BYTES};
pub use error::HeapError;
