//! CLI argument definitions using clap
//!
//! Commands:
//! - catalog-index bench --index <avl|probing|both> --keys <n>
//! - catalog-index stress --index <avl|probing|both> --keys <n> --ops <m>

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// catalog-index - drive the AVL and probing indexes with synthetic workloads
#[derive(Parser, Debug)]
#[command(name = "catalog-index")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit TRACE events (resizes) as well
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Which index a workload targets
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Avl,
    Probing,
    Both,
}

impl IndexKind {
    pub fn includes_avl(&self) -> bool {
        matches!(self, IndexKind::Avl | IndexKind::Both)
    }

    pub fn includes_probing(&self) -> bool {
        matches!(self, IndexKind::Probing | IndexKind::Both)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Time bulk inserts followed by a lookup of every key
    Bench {
        #[arg(long, value_enum, default_value_t = IndexKind::Both)]
        index: IndexKind,

        /// Number of distinct keys
        #[arg(long, default_value_t = 50_000)]
        keys: usize,

        /// JSON file with probing index settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Insert keys in shuffled rather than ascending order
        #[arg(long)]
        shuffle: bool,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Random insert/update/delete/lookup mix checked against a reference map
    Stress {
        #[arg(long, value_enum, default_value_t = IndexKind::Both)]
        index: IndexKind,

        /// Size of the key space operations draw from
        #[arg(long, default_value_t = 10_000)]
        keys: usize,

        /// Number of operations
        #[arg(long, default_value_t = 100_000)]
        ops: usize,

        /// JSON file with probing index settings
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
