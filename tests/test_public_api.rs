//! Public API boundary validation tests
//!
//! Uses ONLY the crate root re-exports; no internal module paths.

use std::sync::Arc;

use serviceloop::{
    AutoTrigger, CliArgs, Config, ConfigSource, ErrorCategory, ExitCode, FnExecutor, HistoryStore,
    LoopConfig, LoopError, LoopEvent, LoopOrchestrator, LoopRun, OrchestratorOptions, RunStatus,
    ServiceLoop, SimulatedExecutor, Stage, StageError, StageOutput, StageStatus,
    StageWorkExecutor, Stats, Trigger, UserFriendlyError,
};

#[test]
fn test_public_api_types_accessible() {
    let _: fn(&CliArgs) -> Result<Config, anyhow::Error> = Config::discover;
    let _: fn(Arc<dyn StageWorkExecutor>) -> ServiceLoop = ServiceLoop::new;

    assert_eq!(Stage::ALL.len(), 6);
    assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
    assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
    assert_eq!(ExitCode::RUN_FAILED.as_i32(), 3);
    assert_eq!(ExitCode::RUN_ABORTED.as_i32(), 4);
    assert_eq!(ConfigSource::Cli.to_string(), "cli");
    assert_eq!(Stats::default().total_runs, 0);
    assert_eq!(StageStatus::default(), StageStatus::Idle);
    assert_eq!(Trigger::default(), Trigger::Manual);
}

#[test]
fn test_stage_descriptor_table() {
    for (index, stage) in Stage::ALL.into_iter().enumerate() {
        assert_eq!(stage.index(), index);
        assert_eq!(Stage::from_index(index), Some(stage));
        assert!(!stage.label().is_empty());
        assert!(!stage.description().is_empty());
        assert_eq!(stage.to_string().parse::<Stage>().unwrap(), stage);
    }
    assert_eq!(Stage::from_index(6), None);
    assert_eq!(Stage::Optimize.next(), None);
    assert_eq!(Stage::Monitor.next(), Some(Stage::Analyze));
}

#[test]
fn test_variant_names_match_serde_names() {
    use strum::VariantNames;

    for name in Stage::VARIANTS {
        let stage: Stage = name.parse().unwrap();
        assert_eq!(serde_json::to_value(stage).unwrap(), *name);
    }
    for name in Trigger::VARIANTS {
        let trigger: Trigger = name.parse().unwrap();
        assert_eq!(serde_json::to_value(trigger).unwrap(), *name);
    }
    for name in StageStatus::VARIANTS {
        let value = serde_json::Value::String((*name).to_string());
        let status: StageStatus = serde_json::from_value(value).unwrap();
        assert_eq!(status.as_str(), *name);
    }
    assert_eq!(RunStatus::VARIANTS, ["running", "completed", "error", "aborted"]);
}

#[test]
fn test_error_reporting_surface() {
    let err = LoopError::from(StageError::TimedOut {
        stage: "verify".to_string(),
        timeout_seconds: 120,
    });
    assert_eq!(err.category(), ErrorCategory::StageExecution);
    assert_eq!(err.to_exit_code(), ExitCode::RUN_FAILED);
    assert!(!err.suggestions().is_empty());
    assert!(err.user_message().contains("120 seconds"));
}

#[tokio::test]
async fn test_orchestrator_usable_without_facade() {
    let history = Arc::new(HistoryStore::with_limit(Some(10)));
    let orchestrator = LoopOrchestrator::new(
        Arc::new(SimulatedExecutor::new()),
        Arc::clone(&history),
        OrchestratorOptions::from_config(&LoopConfig::default()),
    );
    let auto = AutoTrigger::new(orchestrator.clone(), LoopConfig::default().auto_interval());
    assert!(!auto.is_enabled());

    let mut events = orchestrator.subscribe();
    let run: LoopRun = orchestrator.run(Trigger::Alert).await.unwrap();
    assert_eq!(run.overall_status, RunStatus::Completed);
    assert_eq!(history.len(), 1);
    assert!(matches!(events.recv().await, Ok(LoopEvent::RunStarted { .. })));
}

#[tokio::test]
async fn test_run_json_shape() {
    let executor = FnExecutor::new(|stage: Stage| async move {
        Ok::<_, anyhow::Error>(
            StageOutput::new(format!("{stage} ok"))
                .with_detail("line")
                .with_metric("score", 1.5),
        )
    });
    let service = ServiceLoop::new(Arc::new(executor));
    let run = service.run(Trigger::Manual).await.unwrap();

    let value = serde_json::to_value(&run).unwrap();
    assert_eq!(value["overallStatus"], "completed");
    assert_eq!(value["trigger"], "manual");
    assert!(value["startedAt"].is_string());
    assert!(value["completedAt"].is_string());
    let stages = value["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 6);
    assert_eq!(stages[0]["stage"], "monitor");
    assert_eq!(stages[0]["status"], "completed");
    assert_eq!(stages[0]["summary"], "monitor ok");
    assert_eq!(stages[0]["details"][0], "line");
    assert_eq!(stages[0]["metrics"]["score"], 1.5);
    assert!(stages[0]["duration"].is_u64());

    let round_trip: LoopRun = serde_json::from_value(value).unwrap();
    assert_eq!(round_trip, run);

    let stats = serde_json::to_value(service.stats()).unwrap();
    assert_eq!(stats["totalRuns"], 1);
    assert_eq!(stats["successRuns"], 1);
    assert_eq!(stats["abortedRuns"], 0);
    assert!(stats["avgDuration"].is_u64());
}
