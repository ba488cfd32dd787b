//! catalog-index - balanced and open-addressing indexes for catalog workloads
//!
//! - `index`: the AVL tree and the quadratic-probing hash table
//! - `observability`: structured logs and per-index counters
//! - `cli`: bench and stress drivers behind the `catalog-index` binary

pub mod cli;
pub mod index;
pub mod observability;
