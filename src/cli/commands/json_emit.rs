//! JSON emit functions for CLI output

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{LoopRun, Stats};

/// Emit a finished run as pretty-printed JSON.
pub fn emit_run_json(run: &LoopRun) -> Result<String> {
    emit_json(run).context("Failed to emit run JSON")
}

/// Emit run statistics as pretty-printed JSON.
pub fn emit_stats_json(stats: &Stats) -> Result<String> {
    emit_json(stats).context("Failed to emit stats JSON")
}

pub fn emit_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
