//! Configuration for the serviceloop orchestrator.
//!
//! Precedence is CLI flags > config file > built-in defaults. The config file
//! is `.serviceloop/config.toml`, discovered by searching upward from the
//! working directory, or named explicitly via `--config` / `SERVICELOOP_CONFIG`.

mod config;

pub use config::{
    CONFIG_DIR, CONFIG_ENV_VAR, CONFIG_FILE, CliArgs, Config, LoopConfig, LoopSection,
};
