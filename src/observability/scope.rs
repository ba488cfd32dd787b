//! Workload scope for begin/complete logging
//!
//! - Logs `WORKLOAD_BEGIN` on creation
//! - Logs `WORKLOAD_COMPLETE` when completed
//! - Logs `WORKLOAD_DIVERGENCE` when failed
//! - Warns on drop if neither happened

use std::cell::Cell;
use std::time::Instant;

use super::events::Event;
use super::logger::Logger;

/// Scope around one workload run
///
/// ```ignore
/// let scope = WorkloadScope::new("bench", "avl");
/// // ... run ...
/// scope.complete(&[("keys", "50000")]);
/// ```
pub struct WorkloadScope<'a> {
    workload: &'a str,
    index: &'a str,
    completed: Cell<bool>,
}

impl<'a> WorkloadScope<'a> {
    pub fn new(workload: &'a str, index: &'a str) -> Self {
        Logger::log(
            Event::WorkloadBegin.severity(),
            Event::WorkloadBegin.as_str(),
            &[("index", index), ("workload", workload)],
        );

        Self {
            workload,
            index,
            completed: Cell::new(false),
        }
    }

    /// Mark the workload as finished, attaching result fields
    pub fn complete(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        let mut fields = vec![("index", self.index), ("workload", self.workload)];
        fields.extend(extra_fields.iter().copied());
        Logger::log(
            Event::WorkloadComplete.severity(),
            Event::WorkloadComplete.as_str(),
            &fields,
        );
    }

    /// Mark the workload as failed
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        Logger::log(
            Event::WorkloadDivergence.severity(),
            Event::WorkloadDivergence.as_str(),
            &[("index", self.index), ("reason", reason), ("workload", self.workload)],
        );
    }
}

impl Drop for WorkloadScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            Logger::warn(
                "WORKLOAD_INCOMPLETE",
                &[("reason", "scope dropped without completion"), ("workload", self.workload)],
            );
        }
    }
}

/// Wall-clock timer for workload phases
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed seconds as a float
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
