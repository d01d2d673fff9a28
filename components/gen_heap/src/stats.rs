//! Accumulated collection statistics for a generation.

use std::time::Duration;

/// Collection time and invocation count accumulated by one generation.
///
/// Mutated only by the owning generation, during or immediately after a
/// collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatRecord {
    /// Total time spent collecting this generation
    pub accumulated_time: Duration,
    /// Number of collections of this generation
    pub invocations: u32,
}

impl StatRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        StatRecord::default()
    }

    /// Folds one collection's elapsed time into the record.
    pub fn record_collection(&mut self, elapsed: Duration) {
        self.accumulated_time += elapsed;
        self.invocations += 1;
    }

    /// Returns the mean collection time, or zero before any collection.
    pub fn average_time(&self) -> Duration {
        if self.invocations == 0 {
            Duration::ZERO
        } else {
            self.accumulated_time / self.invocations
        }
    }

    /// Formats the accumulated statistics for generation `level` as a
    /// human-readable summary line. The format is diagnostic output and free
    /// to change.
    pub fn summary(&self, level: usize) -> String {
        format!(
            "[Accumulated GC generation {} time {:.7} secs, {} GC's, avg GC time {:.7}]",
            level,
            self.accumulated_time.as_secs_f64(),
            self.invocations,
            self.average_time().as_secs_f64()
        )
    }
}
