//! Watch command implementation
//!
//! Handles `serviceloop watch`: auto mode drives runs until enough finish.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::json_emit::emit_stats_json;
use super::render::{render_run_line, render_stats};
use crate::{Config, ExitCode, LoopEvent, ServiceLoop, SimulatedExecutor};

/// Enable auto mode, wait for `runs` finished runs, then print statistics.
pub async fn execute_watch_command(runs: u32, json: bool, config: &Config) -> Result<ExitCode> {
    let service = ServiceLoop::from_config(Arc::new(SimulatedExecutor::new()), config);
    let mut events = service.subscribe();

    info!(
        runs,
        interval_secs = config.loop_config.auto_interval_secs,
        "Watching auto-triggered runs"
    );
    service.set_auto_mode(true);

    let mut finished = 0;
    while finished < runs {
        match events.recv().await {
            Ok(LoopEvent::RunFinished { run }) => {
                finished += 1;
                if !json {
                    println!("{}", render_run_line(&run));
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                finished = finished_after_lag(finished, service.stats().total_runs);
                warn!(
                    skipped,
                    finished, "Event receiver lagged; recounted finished runs from history"
                );
            }
            Err(RecvError::Closed) => break,
        }
    }

    service.set_auto_mode(false);
    service.wait_idle().await;

    let stats = service.stats();
    if json {
        println!("{}", emit_stats_json(&stats)?);
    } else {
        println!("{}", render_stats(&stats));
    }
    Ok(ExitCode::SUCCESS)
}

/// Finished-run count after the event stream dropped events.
///
/// History holds every run filed since the service was built, so it is the
/// authority; the event count is kept when a history limit makes it smaller.
fn finished_after_lag(counted: u32, total_runs: usize) -> u32 {
    counted.max(u32::try_from(total_runs).unwrap_or(u32::MAX))
}
