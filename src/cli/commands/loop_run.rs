//! Run command implementation
//!
//! Handles `serviceloop run`: one run against the simulated executor.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};

use super::json_emit::emit_run_json;
use super::render::render_run;
use crate::{Config, ExitCode, ServiceLoop, SimulatedExecutor, Stage, Trigger};

/// Execute one run and print it. The exit code follows the run status.
pub async fn execute_run_command(
    trigger: Trigger,
    fail_stage: Option<Stage>,
    delay_ms: u64,
    json: bool,
    config: &Config,
) -> Result<ExitCode> {
    let executor = SimulatedExecutor::new()
        .with_delay(Duration::from_millis(delay_ms))
        .failing_at(fail_stage);
    let service = ServiceLoop::from_config(Arc::new(executor), config);

    let run = service
        .run(trigger)
        .await
        .ok_or_else(|| anyhow!("Failed to execute run: the loop is already running"))?;

    if json {
        println!("{}", emit_run_json(&run)?);
    } else {
        print!("{}", render_run(&run));
    }

    Ok(ExitCode::for_run_status(run.overall_status))
}
