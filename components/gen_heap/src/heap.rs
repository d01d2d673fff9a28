//! The two-generation heap context.
//!
//! The generation layer never reaches for a process-wide singleton; anything
//! that needs heap-wide policy (old-generation lookup, the failed-promotion
//! handler, generation specs) receives a [`GenHeap`] explicitly. That keeps
//! each generation testable in isolation.

use std::fmt;

use heap_types::{Address, HeapError};
use log::debug;

use crate::generation::{GenLevel, Generation, GenerationSpec};
use crate::object;
use crate::remembered_set::RememberedSet;

/// Default young generation size (1MB)
const YOUNG_GEN_BYTES: usize = 1024 * 1024;
/// Default old generation size (4MB)
const OLD_GEN_BYTES: usize = 4 * 1024 * 1024;

/// Construction policy for the two-generation heap.
#[derive(Debug, Clone)]
pub struct GenHeapConfig {
    /// Spec for the young generation (level 0)
    pub young: GenerationSpec,
    /// Spec for the old generation (level 1)
    pub old: GenerationSpec,
}

impl Default for GenHeapConfig {
    fn default() -> Self {
        GenHeapConfig {
            young: GenerationSpec::new("young generation", GenLevel::Young, YOUNG_GEN_BYTES),
            old: GenerationSpec::new("old generation", GenLevel::Old, OLD_GEN_BYTES),
        }
    }
}

/// A generational heap: one young and one old generation plus the remembered
/// set tracking references between them.
///
/// Every operation here assumes the mutator is stopped at a safepoint owned
/// by the caller.
#[derive(Debug)]
pub struct GenHeap {
    young: Generation,
    old: Generation,
    rem_set: RememberedSet,
}

impl GenHeap {
    /// Builds both generations per `config`.
    ///
    /// Heap bring-up happens once, before the mutator runs; callers treat an
    /// error as fatal and abort startup.
    pub fn new(config: &GenHeapConfig) -> Result<Self, HeapError> {
        debug_assert!(config.young.level.is_young(), "young spec has wrong level");
        debug_assert!(!config.old.level.is_young(), "old spec has wrong level");
        Ok(GenHeap {
            young: Generation::new(&config.young)?,
            old: Generation::new(&config.old)?,
            rem_set: RememberedSet::new(),
        })
    }

    /// Returns the young generation.
    pub fn young(&self) -> &Generation {
        &self.young
    }

    /// Mutable access to the young generation.
    pub fn young_mut(&mut self) -> &mut Generation {
        &mut self.young
    }

    /// Returns the old generation.
    pub fn old(&self) -> &Generation {
        &self.old
    }

    /// Mutable access to the old generation.
    pub fn old_mut(&mut self) -> &mut Generation {
        &mut self.old
    }

    /// Returns the generation at `level`.
    pub fn generation(&self, level: GenLevel) -> &Generation {
        match level {
            GenLevel::Young => &self.young,
            GenLevel::Old => &self.old,
        }
    }

    /// Returns the remembered set shared by the generations.
    pub fn rem_set(&self) -> &RememberedSet {
        &self.rem_set
    }

    /// Promotes the object at `obj` into the generation at `level`, falling
    /// back to the heap-level failed-promotion handler when that generation
    /// cannot allocate.
    ///
    /// Returns the object's new address, or `None` if promotion failed
    /// everywhere.
    pub fn promote(
        &mut self,
        level: GenLevel,
        obj: Address,
        size_words: usize,
    ) -> Option<Address> {
        match level {
            GenLevel::Young => {
                let (young, old) = (&mut self.young, &mut self.old);
                young.promote(obj, size_words, &mut |o, s| {
                    debug!(
                        "promotion of {} words failed, retrying in {}",
                        s,
                        old.name()
                    );
                    promote_into(old, o, s)
                })
            }
            // The old generation is terminal: there is nowhere further to
            // escalate, so its handler reports outright failure.
            GenLevel::Old => self.old.promote(obj, size_words, &mut |_, _| None),
        }
    }

    /// Heap-level failed-promotion handler: finds space for `obj` in the old
    /// generation, or reports that promotion failed for this object.
    pub fn handle_failed_promotion(&mut self, obj: Address, size_words: usize) -> Option<Address> {
        promote_into(&mut self.old, obj, size_words)
    }

    /// Returns one summary line per generation plus the accumulated
    /// statistics of each.
    pub fn summary(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            self.young,
            self.young.summary_info(),
            self.old,
            self.old.summary_info()
        )
    }
}

impl fmt::Display for GenHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.young, self.old)
    }
}

/// Allocates and copies `obj` into `target`, without further escalation.
fn promote_into(target: &mut Generation, obj: Address, size_words: usize) -> Option<Address> {
    let new = target.allocate(size_words)?;
    object::copy_disjoint_words(obj, new, size_words);
    Some(new)
}
