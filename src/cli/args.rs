//! CLI argument definitions and parsing structures

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::{Stage, Trigger};

/// serviceloop - six-stage service loop orchestrator
#[derive(Parser, Debug)]
#[command(name = "serviceloop")]
#[command(about = "Drive monitor → analyze → decide → execute → verify → optimize runs")]
#[command(long_about = r#"
serviceloop drives a fixed six-stage pipeline against a simulated GPU
inference cluster, records per-stage results and keeps run statistics.

EXAMPLES:
  # Execute one run
  serviceloop run

  # Execute a run triggered by an alert, failing at the execute stage
  serviceloop run --trigger alert --fail-stage execute

  # Let the auto trigger start three runs, one every 2 seconds
  serviceloop watch --runs 3 --interval-secs 2

  # Show the effective configuration and where each value came from
  serviceloop config

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .serviceloop/config.toml
  Use --config or SERVICELOOP_CONFIG to name an explicit config file

STAGES:
  Monitor → Analyze → Decide → Execute → Verify → Optimize
  A stage failure stops the run; an abort takes effect at the next stage boundary
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Stage timeout in seconds (default: 120, range: 1-3600)
    #[arg(long, global = true)]
    pub stage_timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one run with the simulated cluster executor
    ///
    /// Exits 0 when the run completes, 3 when a stage fails.
    Run {
        /// What started the run: manual, auto or alert
        #[arg(long, default_value = "manual")]
        trigger: Trigger,

        /// Make the simulated work fail at this stage
        #[arg(long)]
        fail_stage: Option<Stage>,

        /// Simulated work time per stage, in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,

        /// Print the finished run as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enable auto mode and wait for a number of auto-triggered runs
    Watch {
        /// Number of runs to wait for
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        runs: u32,

        /// Seconds between auto triggers (overrides auto_interval_secs)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Print the final statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the stages in execution order
    Stages {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration with value sources
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Operation name used in error reports.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Run { .. } => "run",
            Self::Watch { .. } => "watch",
            Self::Stages { .. } => "stages",
            Self::Config { .. } => "config",
        }
    }
}

/// Build the clap command, for completions and documentation tooling.
#[must_use]
pub fn build_cli() -> clap::Command {
    Cli::command()
}
