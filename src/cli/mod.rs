//! CLI module for catalog-index
//!
//! Provides workload drivers for:
//! - bench: bulk insert then lookup timings
//! - stress: randomized operations checked against a reference map

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, IndexKind};
pub use commands::{bench, run_command, run_command_to, stress, write_response};
pub use errors::{CliError, CliErrorCode, CliResult};

use crate::observability::{Logger, Severity};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    if cli.verbose {
        Logger::set_min_severity(Severity::Trace);
    }
    run_command(cli.command)
}
