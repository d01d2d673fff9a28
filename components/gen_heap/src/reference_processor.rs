//! Reference discovery scoped to one generation's reserved region.
//!
//! The base processor performs single-threaded discovery. Generation types
//! that need multi-threaded discovery construct a different variant through
//! their `ref_processor_init` override.

use heap_types::{Address, MemRegion};

/// Discovers reachability-sensitive references within a fixed span.
#[derive(Debug)]
pub struct ReferenceProcessor {
    /// The region this processor discovers references in
    span: MemRegion,
    /// Whether discovery may run on multiple threads
    mt_discovery: bool,
    /// References discovered since the last drain, in discovery order
    discovered: Vec<Address>,
}

impl ReferenceProcessor {
    /// Creates a single-threaded ("vanilla") processor for `span`.
    pub fn new(span: MemRegion) -> Self {
        ReferenceProcessor {
            span,
            mt_discovery: false,
            discovered: Vec::new(),
        }
    }

    /// Returns the span this processor covers.
    pub fn span(&self) -> MemRegion {
        self.span
    }

    /// Returns true if discovery may run on multiple threads.
    pub fn discovery_is_mt(&self) -> bool {
        self.mt_discovery
    }

    /// Offers `reference` for discovery. Returns true if it was accepted,
    /// false if it lies outside this processor's span.
    pub fn discover_reference(&mut self, reference: Address) -> bool {
        if !self.span.contains(reference) {
            return false;
        }
        self.discovered.push(reference);
        true
    }

    /// Returns the number of references discovered since the last drain.
    pub fn num_discovered(&self) -> usize {
        self.discovered.len()
    }

    /// Takes all discovered references, leaving the processor empty.
    pub fn drain_discovered(&mut self) -> Vec<Address> {
        std::mem::take(&mut self.discovered)
    }
}
