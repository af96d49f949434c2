use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and validate an orchestration document.
    Validate {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Walk one case through an orchestration and print the rendered
    /// response.
    Run {
        path: PathBuf,
        /// File with the inbound request body; empty body when absent.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Initial process variables.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set_vars: Vec<String>,
        /// Soft per-case deadline in milliseconds.
        #[arg(long)]
        deadline_ms: Option<u64>,
        /// Emit walk events as JSON lines on stdout.
        #[arg(long)]
        events: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
}
