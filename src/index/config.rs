//! Probing index configuration
//!
//! Construction parameters only. Nothing here changes after the index is built.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{IndexError, IndexResult};
use crate::observability::{log_event_with_fields, Event};

/// Default slot count for a fresh table
pub const DEFAULT_INITIAL_CAPACITY: usize = 8;

/// Default growth threshold (active entries / capacity)
pub const DEFAULT_LOAD_FACTOR_THRESHOLD: f64 = 0.7;

/// Configuration for [`ProbingIndex`](super::ProbingIndex).
///
/// Loaded from JSON, e.g. `{"initial_capacity": 64, "load_factor_threshold": 0.5}`.
/// Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbingConfig {
    /// Number of slots allocated up front (must be > 0)
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Load factor at which the table doubles, exclusive range (0, 1)
    #[serde(default = "default_load_factor_threshold")]
    pub load_factor_threshold: f64,
}

fn default_initial_capacity() -> usize {
    DEFAULT_INITIAL_CAPACITY
}
fn default_load_factor_threshold() -> f64 {
    DEFAULT_LOAD_FACTOR_THRESHOLD
}

impl Default for ProbingConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor_threshold: DEFAULT_LOAD_FACTOR_THRESHOLD,
        }
    }
}

impl ProbingConfig {
    /// Create a validated configuration
    pub fn new(initial_capacity: usize, load_factor_threshold: f64) -> IndexResult<Self> {
        let config = Self {
            initial_capacity,
            load_factor_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> IndexResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            IndexError::ConfigLoadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: ProbingConfig = serde_json::from_str(&content)
            .map_err(|e| IndexError::ConfigLoadFailed(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("initial_capacity", &config.initial_capacity.to_string()),
                ("load_factor_threshold", &config.load_factor_threshold.to_string()),
            ],
        );

        Ok(config)
    }

    /// Check parameter ranges.
    ///
    /// A threshold of 1 or more would let the table fill completely, at which
    /// point an insert probe can never terminate.
    pub fn validate(&self) -> IndexResult<()> {
        if self.initial_capacity == 0 {
            return Err(reject("initial_capacity must be > 0".to_string()));
        }

        let t = self.load_factor_threshold;
        if !(t > 0.0 && t < 1.0) {
            return Err(reject(format!(
                "load_factor_threshold must be in (0, 1), got {}",
                t
            )));
        }

        Ok(())
    }
}

fn reject(reason: String) -> IndexError {
    log_event_with_fields(Event::ConfigRejected, &[("reason", &reason)]);
    IndexError::InvalidConfig(reason)
}
