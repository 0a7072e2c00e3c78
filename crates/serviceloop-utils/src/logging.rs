//! Logging and observability infrastructure for serviceloop
//!
//! Structured `tracing` output with a compact default format, a verbose
//! format that adds targets and span timings, and a JSON format for log
//! shippers. Helpers below keep the field names used for runs and stages
//! consistent across crates.

use std::io::IsTerminal;
use tracing::{Level, debug, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::types::{RunStatus, Stage, Trigger};

/// Output style for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, minimal.
    #[default]
    Compact,
    /// Adds targets and span close events with timings.
    Verbose,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    #[must_use]
    pub const fn from_flags(verbose: bool, json: bool) -> Self {
        if json {
            Self::Json
        } else if verbose {
            Self::Verbose
        } else {
            Self::Compact
        }
    }
}

/// Check if colored output should be used.
///
/// Returns true only if stderr is a terminal and `NO_COLOR` is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides the built-in filter. Logs go to stderr so command
/// output on stdout stays machine-readable.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| match format {
            LogFormat::Verbose => EnvFilter::try_new("serviceloop=debug,info"),
            LogFormat::Compact | LogFormat::Json => EnvFilter::try_new("serviceloop=info,warn"),
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_current_span(true)
                        .with_span_list(false),
                )
                .try_init()?;
        }
        LogFormat::Verbose => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(use_color())
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_span_events(FmtSpan::CLOSE)
                        .compact(),
                )
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(use_color())
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_line_number(false)
                        .with_file(false)
                        .compact(),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Span covering one loop run.
pub fn run_span(run_id: &str, trigger: Trigger) -> tracing::Span {
    span!(
        Level::INFO,
        "loop_run",
        run_id = %run_id,
        trigger = %trigger,
    )
}

/// Span covering one stage's unit of work.
pub fn stage_span(run_id: &str, stage: Stage) -> tracing::Span {
    span!(
        Level::INFO,
        "stage_execution",
        run_id = %run_id,
        stage = %stage,
        index = stage.index(),
    )
}

pub fn log_run_started(run_id: &str, trigger: Trigger) {
    info!(run_id = %run_id, trigger = %trigger, "Loop run started");
}

pub fn log_stage_start(run_id: &str, stage: Stage) {
    debug!(run_id = %run_id, stage = %stage, "Starting stage");
}

pub fn log_stage_complete(run_id: &str, stage: Stage, duration_ms: u64) {
    info!(
        run_id = %run_id,
        stage = %stage,
        duration_ms = duration_ms,
        "Stage completed"
    );
}

pub fn log_stage_error(run_id: &str, stage: Stage, error: &str, duration_ms: u64) {
    error!(
        run_id = %run_id,
        stage = %stage,
        duration_ms = duration_ms,
        error = %error,
        "Stage failed"
    );
}

pub fn log_run_finished(run_id: &str, status: RunStatus, duration_ms: u64) {
    match status {
        RunStatus::Error => error!(
            run_id = %run_id,
            status = %status,
            duration_ms = duration_ms,
            "Loop run finished"
        ),
        _ => info!(
            run_id = %run_id,
            status = %status,
            duration_ms = duration_ms,
            "Loop run finished"
        ),
    }
}
