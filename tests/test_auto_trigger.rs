//! Auto mode tests through the `ServiceLoop` façade
//!
//! Time is paused so intervals elapse instantly and deterministically.

use std::time::Duration;

use serviceloop::{LoopConfig, RunStatus, Stage, Trigger};

#[allow(clippy::duplicate_mod)]
#[path = "test_support/mod.rs"]
mod test_support;

use test_support::{ScriptedExecutor, service_with, service_with_config};

const INTERVAL: Duration = Duration::from_secs(300);

#[tokio::test(start_paused = true)]
async fn test_auto_mode_toggle() {
    let service = service_with(&ScriptedExecutor::ok());
    assert!(!service.auto_mode());
    service.set_auto_mode(true);
    assert!(service.auto_mode());
    service.set_auto_mode(false);
    assert!(!service.auto_mode());
}

#[tokio::test(start_paused = true)]
async fn test_auto_mode_starts_runs_on_cadence() {
    let service = service_with(&ScriptedExecutor::ok());
    service.set_auto_mode(true);

    // Nothing fires before the first full interval
    tokio::time::sleep(INTERVAL - Duration::from_secs(1)).await;
    assert!(service.history().is_empty());

    tokio::time::sleep(INTERVAL * 2 + Duration::from_secs(30)).await;
    service.wait_idle().await;
    let history = service.history();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|r| r.trigger == Trigger::Auto));
    assert!(history.iter().all(|r| r.overall_status == RunStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn test_auto_interval_comes_from_config() {
    let config = LoopConfig {
        auto_interval_secs: 10,
        auto_mode: true,
        ..LoopConfig::default()
    };
    let service = service_with_config(&ScriptedExecutor::ok(), &config);
    assert!(service.auto_mode());

    tokio::time::sleep(Duration::from_secs(25)).await;
    service.wait_idle().await;
    assert_eq!(service.history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_while_running_are_skipped_not_queued() {
    let executor = ScriptedExecutor::gated_at(Stage::Execute);
    let config = LoopConfig {
        stage_timeout_secs: 3600,
        ..LoopConfig::default()
    };
    let service = service_with_config(&executor, &config);

    assert!(service.start(Trigger::Manual));
    executor.wait_entered().await;
    service.set_auto_mode(true);

    // Several intervals pass while the manual run is parked
    tokio::time::sleep(INTERVAL * 4 + INTERVAL / 2).await;
    assert!(service.history().is_empty());
    assert_eq!(service.current_run().unwrap().trigger, Trigger::Manual);

    service.set_auto_mode(false);
    executor.release();
    service.wait_idle().await;

    // No backlog of deferred runs follows
    tokio::time::sleep(INTERVAL * 3).await;
    let history = service.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].trigger, Trigger::Manual);
}

#[tokio::test(start_paused = true)]
async fn test_disabling_mid_run_does_not_abort() {
    let executor = ScriptedExecutor::gated_at(Stage::Verify);
    let service = service_with(&executor);
    service.set_auto_mode(true);

    executor.wait_entered().await;
    assert!(service.is_running());
    service.set_auto_mode(false);
    assert!(service.is_running());

    executor.release();
    service.wait_idle().await;
    let history = service.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].trigger, Trigger::Auto);
    assert_eq!(history[0].overall_status, RunStatus::Completed);

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(service.history().len(), 1);
}
