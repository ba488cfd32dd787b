//! Observable index events
//!
//! Events are explicit and typed. Each carries a fixed severity.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Probing configuration loaded from file
    ConfigLoaded,
    /// Probing configuration rejected by validation
    ConfigRejected,

    // Probing index
    /// Table doubled and rebuilt from active entries
    IndexResize,
    /// Lookup or delete gave up after exhausting the probe budget
    IndexProbeCutoff,

    // Workloads
    /// Workload driver started
    WorkloadBegin,
    /// Workload driver finished
    WorkloadComplete,
    /// Workload found a divergence from the reference model
    WorkloadDivergence,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "INDEX_CONFIG_LOADED",
            Event::ConfigRejected => "INDEX_CONFIG_REJECTED",
            Event::IndexResize => "INDEX_RESIZE",
            Event::IndexProbeCutoff => "INDEX_PROBE_CUTOFF",
            Event::WorkloadBegin => "WORKLOAD_BEGIN",
            Event::WorkloadComplete => "WORKLOAD_COMPLETE",
            Event::WorkloadDivergence => "WORKLOAD_DIVERGENCE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::IndexResize => Severity::Trace,
            Event::ConfigRejected | Event::IndexProbeCutoff => Severity::Warn,
            Event::WorkloadDivergence => Severity::Error,
            Event::ConfigLoaded | Event::WorkloadBegin | Event::WorkloadComplete => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
