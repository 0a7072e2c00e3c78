//! CLI command implementations.
//!
//! Each handler returns the exit code for its outcome; `run.rs` turns errors
//! into user-facing reports.

mod config;
mod json_emit;
mod loop_run;
mod render;
mod stages;
mod watch;

pub use config::execute_config_command;
pub use loop_run::execute_run_command;
pub use stages::execute_stages_command;
pub use watch::execute_watch_command;
