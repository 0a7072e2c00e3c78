//! serviceloop - six-stage service loop orchestrator
//!
//! Drives runs through a fixed pipeline of work stages
//! (monitor → analyze → decide → execute → verify → optimize), tracks
//! per-stage results, supports cooperative cancellation at stage boundaries
//! and keeps an in-memory history of finished runs with aggregate statistics.
//!
//! serviceloop can be used in two ways:
//! - **CLI**: the `serviceloop` binary runs the loop against a simulated
//!   GPU inference cluster
//! - **Library**: embed [`ServiceLoop`] and supply your own
//!   [`StageWorkExecutor`]
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Execute one run and print the stage table
//! serviceloop run
//!
//! # Make the execute stage fail and emit JSON
//! serviceloop run --fail-stage execute --json
//!
//! # Let the auto trigger drive three runs, one per second
//! serviceloop watch --runs 3 --interval-secs 1
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust
//! use std::sync::Arc;
//! use serviceloop::{FnExecutor, RunStatus, ServiceLoop, Stage, StageOutput, Trigger};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let executor = FnExecutor::new(|stage: Stage| async move {
//!     Ok::<_, anyhow::Error>(StageOutput::new(format!("{} finished", stage.label())))
//! });
//! let service = ServiceLoop::new(Arc::new(executor));
//!
//! let run = service.run(Trigger::Manual).await.unwrap();
//! assert_eq!(run.overall_status, RunStatus::Completed);
//! assert_eq!(service.history()[0].id, run.id);
//! # });
//! ```
//!
//! # Configuration
//!
//! [`Config::discover`] merges CLI overrides, `.serviceloop/config.toml` and
//! built-in defaults, in that order of precedence.

pub mod cli;
mod service;
mod simulated;

pub use service::ServiceLoop;
pub use simulated::SimulatedExecutor;

/// The six stages of a run, in execution order.
pub use serviceloop_utils::types::Stage;

pub use serviceloop_utils::types::{ConfigSource, RunStatus, StageStatus, Trigger};

/// Library-level error type.
///
/// Stage failures are recorded on the run as data; `LoopError` covers
/// configuration and runtime failures around it.
pub use serviceloop_utils::error::{
    ConfigError, ErrorCategory, LoopError, StageError, UserFriendlyError,
};

/// Exit codes for the `serviceloop` binary.
pub use serviceloop_utils::exit_codes::ExitCode;

pub use serviceloop_config::{CliArgs, Config, LoopConfig};

pub use serviceloop_stage_api::{FnExecutor, StageOutput, StageWorkExecutor};

pub use serviceloop_history::{HistoryStore, InvariantViolation, LoopRun, StageResult, Stats};

pub use serviceloop_orchestrator::{
    AutoTrigger, LoopEvent, LoopOrchestrator, OrchestratorOptions, StageTimeout,
};

#[doc(hidden)]
pub use serviceloop_utils::logging;
