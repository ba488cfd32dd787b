//! In-memory key-value indexes for catalog workloads
//!
//! Two independent structures, neither aware of the other:
//!
//! - [`AvlTree`]: ordered, O(log n) insert/search/delete, comparison-only keys
//! - [`ProbingIndex`]: unordered, expected O(1) insert/get/delete, hashed keys
//!
//! # Invariants
//!
//! - Lookups and deletes of absent keys are ordinary outcomes, never errors
//! - Both structures are single-owner and perform no synchronization
//! - Backing storage is owned exclusively by the structure holding it

mod avl;
mod config;
mod errors;
mod probing;

pub use avl::AvlTree;
pub use config::{ProbingConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR_THRESHOLD};
pub use errors::{IndexError, IndexErrorCode, IndexResult};
pub use probing::ProbingIndex;
