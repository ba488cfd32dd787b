//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Per-index operation counters
//! - Workload begin/complete tracing
//!
//! # Principles
//!
//! 1. Observability is read-only: no index decision depends on it
//! 2. No background threads
//! 3. TRACE events cost one atomic load when disabled

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{IndexMetrics, MetricsSnapshot};
pub use scope::{Timer, WorkloadScope};

#[cfg(test)]
pub(crate) use logger::capture_lines;

/// Log a typed event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
