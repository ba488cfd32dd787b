//! Index error types
//!
//! Error codes:
//! - INDEX_INVALID_CONFIG (construction rejected)
//! - INDEX_CONFIG_LOAD_FAILED (config file unreadable or malformed)
//! - INDEX_INVARIANT_VIOLATED (FATAL, structure is corrupt)
//!
//! Absent keys are never errors. Lookups and deletes report them through
//! `Option` / `bool` results.

use thiserror::Error;

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Construction parameters out of range
    InvalidConfig,
    /// Configuration file could not be read or parsed
    ConfigLoadFailed,
    /// A structural invariant does not hold
    InvariantViolated,
}

impl IndexErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::InvalidConfig => "INDEX_INVALID_CONFIG",
            IndexErrorCode::ConfigLoadFailed => "INDEX_CONFIG_LOAD_FAILED",
            IndexErrorCode::InvariantViolated => "INDEX_INVARIANT_VIOLATED",
        }
    }

    /// Whether the owning process should stop using the structure
    pub fn is_fatal(&self) -> bool {
        matches!(self, IndexErrorCode::InvariantViolated)
    }
}

impl std::fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("INDEX_INVALID_CONFIG: {0}")]
    InvalidConfig(String),

    #[error("INDEX_CONFIG_LOAD_FAILED: {0}")]
    ConfigLoadFailed(String),

    #[error("INDEX_INVARIANT_VIOLATED: {0}")]
    InvariantViolated(String),
}

impl IndexError {
    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
        match self {
            IndexError::InvalidConfig(_) => IndexErrorCode::InvalidConfig,
            IndexError::ConfigLoadFailed(_) => IndexErrorCode::ConfigLoadFailed,
            IndexError::InvariantViolated(_) => IndexErrorCode::InvariantViolated,
        }
    }

    /// Returns the human-readable message
    pub fn message(&self) -> &str {
        match self {
            IndexError::InvalidConfig(m)
            | IndexError::ConfigLoadFailed(m)
            | IndexError::InvariantViolated(m) => m,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.code().is_fatal()
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
