//! Façade combining the orchestrator, its history and the auto trigger.

use std::sync::Arc;

use tokio::sync::broadcast;

use serviceloop_config::{Config, LoopConfig};
use serviceloop_history::{HistoryStore, LoopRun, Stats};
use serviceloop_orchestrator::{AutoTrigger, LoopEvent, LoopOrchestrator, OrchestratorOptions};
use serviceloop_stage_api::StageWorkExecutor;
use serviceloop_utils::types::Trigger;

/// The primary public API for embedding the service loop.
///
/// Owns one [`LoopOrchestrator`], the [`HistoryStore`] it files runs into and
/// an [`AutoTrigger`]. Construct one per composing component; there is no
/// global instance.
///
/// # Construction
///
/// - [`ServiceLoop::new`]: built-in defaults
/// - [`ServiceLoop::with_config`]: explicit [`LoopConfig`]
/// - [`ServiceLoop::from_config`]: a discovered [`Config`]
///
/// When `auto_mode` is set in the configuration the auto trigger is armed at
/// construction, provided a Tokio runtime is available.
///
/// # Misuse
///
/// `start` while a run is active and `abort` while idle are absorbed and
/// reported through the returned `bool`; neither is an error.
pub struct ServiceLoop {
    orchestrator: LoopOrchestrator,
    auto: AutoTrigger,
}

impl ServiceLoop {
    #[must_use]
    pub fn new(executor: Arc<dyn StageWorkExecutor>) -> Self {
        Self::with_config(executor, &LoopConfig::default())
    }

    #[must_use]
    pub fn with_config(executor: Arc<dyn StageWorkExecutor>, config: &LoopConfig) -> Self {
        let history = Arc::new(HistoryStore::with_limit(config.history_limit));
        let orchestrator =
            LoopOrchestrator::new(executor, history, OrchestratorOptions::from_config(config));
        let auto = AutoTrigger::new(orchestrator.clone(), config.auto_interval());

        if config.auto_mode {
            auto.set_enabled(true);
        }

        Self { orchestrator, auto }
    }

    #[must_use]
    pub fn from_config(executor: Arc<dyn StageWorkExecutor>, config: &Config) -> Self {
        Self::with_config(executor, &config.loop_config)
    }

    /// Start a run in the background. Returns `false` if a run is already
    /// active or no Tokio runtime is available to drive it.
    pub fn start(&self, trigger: Trigger) -> bool {
        self.orchestrator.start(trigger).is_some()
    }

    /// Start a run and wait for it to finish; `None` if a run is already
    /// active.
    pub async fn run(&self, trigger: Trigger) -> Option<LoopRun> {
        self.orchestrator.run(trigger).await
    }

    /// Request cancellation at the next stage boundary. Returns `false` when
    /// idle.
    pub fn abort(&self) -> bool {
        self.orchestrator.abort()
    }

    #[must_use]
    pub fn current_run(&self) -> Option<LoopRun> {
        self.orchestrator.current_run()
    }

    #[must_use]
    pub fn history(&self) -> Vec<LoopRun> {
        self.orchestrator.history()
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        self.orchestrator.stats()
    }

    pub fn clear_history(&self) {
        self.orchestrator.clear_history();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.orchestrator.is_running()
    }

    #[must_use]
    pub fn current_stage_index(&self) -> Option<usize> {
        self.orchestrator.current_stage_index()
    }

    #[must_use]
    pub fn auto_mode(&self) -> bool {
        self.auto.is_enabled()
    }

    /// Arm or disarm the auto trigger. Disarming never aborts an in-flight
    /// run. Enabling outside a Tokio runtime leaves auto mode off.
    pub fn set_auto_mode(&self, enabled: bool) {
        self.auto.set_enabled(enabled);
    }

    pub async fn wait_idle(&self) {
        self.orchestrator.wait_idle().await;
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        self.orchestrator.subscribe()
    }

    #[must_use]
    pub fn orchestrator(&self) -> &LoopOrchestrator {
        &self.orchestrator
    }
}
