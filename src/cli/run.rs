//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments and initialises logging
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::logging::{LogFormat, init_tracing};
use crate::{CliArgs, Config, ConfigError, ExitCode, LoopError, UserFriendlyError};

/// Main CLI execution function.
///
/// Handles ALL output including errors and returns `Result<(), ExitCode>`:
/// - On success: `Ok(())`
/// - On failure, or when a run ends in error or abort: `Err(ExitCode)`
///
/// main.rs only calls `std::process::exit(code.as_i32())` on error.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(LogFormat::from_flags(cli.verbose, cli.log_json)) {
        eprintln!("✗ Failed to initialise logging: {e}");
        return Err(ExitCode::INTERNAL);
    }

    let auto_interval_secs = match &cli.command {
        Commands::Watch { interval_secs, .. } => *interval_secs,
        _ => None,
    };
    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        stage_timeout_secs: cli.stage_timeout,
        auto_interval_secs,
        ..CliArgs::default()
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => return Err(report_error(&err, "config")),
    };
    tracing::debug!(
        config_path = ?config.config_path,
        stage_timeout_secs = config.loop_config.stage_timeout_secs,
        "Configuration loaded"
    );

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = cli.command.operation();

    let result = rt.block_on(async {
        match cli.command {
            Commands::Run {
                trigger,
                fail_stage,
                delay_ms,
                json,
            } => commands::execute_run_command(trigger, fail_stage, delay_ms, json, &config).await,
            Commands::Watch { runs, json, .. } => {
                commands::execute_watch_command(runs, json, &config).await
            }
            Commands::Stages { json } => commands::execute_stages_command(json),
            Commands::Config { json } => commands::execute_config_command(json, &config),
        }
    });

    match result {
        Ok(code) if code == ExitCode::SUCCESS => Ok(()),
        Ok(code) => Err(code),
        Err(err) => Err(report_error(&err, operation)),
    }
}

/// Print a user-facing report for `error` and pick the exit code.
fn report_error(error: &anyhow::Error, operation: &str) -> ExitCode {
    if let Some(err) = error.downcast_ref::<LoopError>() {
        print_report(err, operation);
        return err.to_exit_code();
    }
    if let Some(err) = error.downcast_ref::<ConfigError>() {
        print_report(err, operation);
        return ExitCode::CLI_ARGS;
    }

    eprintln!("✗ Unexpected error during {operation}: {error:#}");
    eprintln!("\n  Run with --verbose for more detailed output");
    ExitCode::INTERNAL
}

fn print_report(error: &dyn UserFriendlyError, operation: &str) {
    eprintln!("✗ {} error during {operation}", error.category());
    eprintln!("  {}", error.user_message());
    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        eprintln!("\n  Suggestions:");
        for (i, suggestion) in suggestions.iter().enumerate() {
            eprintln!("    {}. {}", i + 1, suggestion);
        }
    }
}
