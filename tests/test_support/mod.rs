//! Shared executors for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use serviceloop::{LoopConfig, LoopRun, ServiceLoop, Stage, StageOutput, StageWorkExecutor};
use tokio::sync::Notify;

/// Executor that succeeds with `summary = "ok"` for every stage, optionally
/// failing at one stage and parking inside another until released.
pub(crate) struct ScriptedExecutor {
    fail_stage: Option<Stage>,
    gate_stage: Option<Stage>,
    entered: Notify,
    release: Notify,
}

impl ScriptedExecutor {
    pub(crate) fn ok() -> Arc<Self> {
        Arc::new(Self::build(None, None))
    }

    pub(crate) fn failing_at(stage: Stage) -> Arc<Self> {
        Arc::new(Self::build(Some(stage), None))
    }

    pub(crate) fn gated_at(stage: Stage) -> Arc<Self> {
        Arc::new(Self::build(None, Some(stage)))
    }

    fn build(fail_stage: Option<Stage>, gate_stage: Option<Stage>) -> Self {
        Self {
            fail_stage,
            gate_stage,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Resolves once the gated stage has started executing.
    pub(crate) async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated stage finish.
    pub(crate) fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl StageWorkExecutor for ScriptedExecutor {
    async fn execute(&self, stage: Stage) -> Result<StageOutput> {
        if self.gate_stage == Some(stage) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.fail_stage == Some(stage) {
            bail!("{stage} failed in test");
        }
        Ok(StageOutput::new("ok"))
    }
}

pub(crate) fn service_with(executor: &Arc<ScriptedExecutor>) -> ServiceLoop {
    ServiceLoop::new(Arc::clone(executor) as Arc<dyn StageWorkExecutor>)
}

pub(crate) fn service_with_config(
    executor: &Arc<ScriptedExecutor>,
    config: &LoopConfig,
) -> ServiceLoop {
    ServiceLoop::with_config(Arc::clone(executor) as Arc<dyn StageWorkExecutor>, config)
}

/// Assert the timestamp rules every stage result must satisfy.
pub(crate) fn assert_stage_timestamps(run: &LoopRun) {
    use serviceloop::StageStatus;

    for result in &run.stages {
        if result.status != StageStatus::Idle && result.status != StageStatus::Skipped {
            assert!(result.started_at.is_some(), "{} has no start time", result.stage);
        }
        if matches!(result.status, StageStatus::Completed | StageStatus::Error) {
            let started = result.started_at.unwrap();
            let completed = result.completed_at.unwrap();
            let expected = u64::try_from((completed - started).num_milliseconds()).unwrap();
            assert_eq!(result.duration_ms, Some(expected), "{} duration", result.stage);
        }
    }
}
