//! Run lifecycle: claim, stage sequencing, cooperative abort and finalization.
//!
//! Lifecycle of one run:
//!
//! ```text
//! start ─► claim ─► [begin stage ─► execute (timeout) ─► settle]×N ─► finalize
//!            │                                              │
//!            └─ no-op when a run is active                  ├─ error: stop, later stages stay idle
//!                                                           └─ abort flag set: later stages skipped
//! ```
//!
//! Every mutation of the active run happens under the state lock, and the
//! matching [`LoopEvent`] is sent before the lock is released.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, debug, info, warn};

use serviceloop_config::LoopConfig;
use serviceloop_history::{HistoryStore, LoopRun, Stats};
use serviceloop_stage_api::{StageOutput, StageWorkExecutor};
use serviceloop_utils::error::StageError;
use serviceloop_utils::logging::{
    log_run_finished, log_run_started, log_stage_complete, log_stage_error, log_stage_start,
    run_span, stage_span,
};
use serviceloop_utils::types::{Stage, Trigger};

use crate::events::LoopEvent;
use crate::timeout::StageTimeout;

/// Runtime options for a [`LoopOrchestrator`].
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorOptions {
    pub stage_timeout: StageTimeout,
    /// Broadcast buffer per subscriber before it starts lagging
    pub event_capacity: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            stage_timeout: StageTimeout::default(),
            event_capacity: LoopConfig::default().event_capacity,
        }
    }
}

impl OrchestratorOptions {
    #[must_use]
    pub fn from_config(config: &LoopConfig) -> Self {
        Self {
            stage_timeout: StageTimeout::from_config(config),
            event_capacity: config.event_capacity,
        }
    }
}

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_run_id(now: DateTime<Utc>) -> String {
    let seq = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("loop-{}-{seq}", now.timestamp_millis())
}

/// Mutable orchestrator state, guarded by `Inner::state`.
#[derive(Default)]
struct RunSlot {
    /// Active run, or the last finished one until the next start
    current_run: Option<LoopRun>,
    current_stage_index: Option<usize>,
    is_running: bool,
    /// Cancellation flag scoped to the active run
    cancel: Option<Arc<AtomicBool>>,
}

struct Inner {
    executor: Arc<dyn StageWorkExecutor>,
    history: Arc<HistoryStore>,
    stage_timeout: StageTimeout,
    state: Mutex<RunSlot>,
    events: broadcast::Sender<LoopEvent>,
    running: watch::Sender<bool>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, RunSlot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: LoopEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

/// Identity of the run a driver task is responsible for.
struct ActiveRun {
    run_id: String,
    trigger: Trigger,
    cancel: Arc<AtomicBool>,
}

enum Flow {
    Continue,
    Stop,
}

/// Drives loop runs through the six stages, one run at a time.
///
/// Cloning is cheap; clones share the same state, history and event stream.
///
/// # Threading
///
/// Single writer: at most one run is active per orchestrator. `start` while a
/// run is active is a no-op, as is `abort` while idle.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use serviceloop_history::HistoryStore;
/// use serviceloop_orchestrator::{LoopOrchestrator, OrchestratorOptions};
/// use serviceloop_stage_api::{FnExecutor, Stage, StageOutput};
/// use serviceloop_utils::types::{RunStatus, Trigger};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let executor = FnExecutor::new(|stage: Stage| async move {
///     Ok::<_, anyhow::Error>(StageOutput::new(format!("{stage} done")))
/// });
/// let orchestrator = LoopOrchestrator::new(
///     Arc::new(executor),
///     Arc::new(HistoryStore::new()),
///     OrchestratorOptions::default(),
/// );
///
/// let run = orchestrator.run(Trigger::Manual).await.unwrap();
/// assert_eq!(run.overall_status, RunStatus::Completed);
/// assert_eq!(orchestrator.stats().success_runs, 1);
/// # });
/// ```
#[derive(Clone)]
pub struct LoopOrchestrator {
    inner: Arc<Inner>,
}

impl LoopOrchestrator {
    #[must_use]
    pub fn new(
        executor: Arc<dyn StageWorkExecutor>,
        history: Arc<HistoryStore>,
        options: OrchestratorOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        let (running, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                executor,
                history,
                stage_timeout: options.stage_timeout,
                state: Mutex::new(RunSlot::default()),
                events,
                running,
            }),
        }
    }

    /// Start a run in the background.
    ///
    /// Returns `None` without side effects when a run is already active.
    /// Otherwise the run is allocated, stage 0 is marked running and the
    /// driver task is spawned; its handle resolves to the finished run.
    ///
    /// Outside a Tokio runtime nothing can drive the run, so the call is
    /// refused with a warning and `None`.
    pub fn start(&self, trigger: Trigger) -> Option<JoinHandle<LoopRun>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(trigger = %trigger, "Start ignored: no async runtime is active");
            return None;
        };
        let active = self.claim(trigger)?;
        let this = self.clone();
        Some(runtime.spawn(this.drive(active)))
    }

    /// Start a run and wait for it to finish.
    ///
    /// Returns `None` when a run is already active. Dropping the returned
    /// future does not cancel the run.
    pub async fn run(&self, trigger: Trigger) -> Option<LoopRun> {
        let handle = self.start(trigger)?;
        match handle.await {
            Ok(run) => Some(run),
            Err(err) => {
                warn!(error = %err, "Loop driver task ended abnormally");
                None
            }
        }
    }

    /// Request cancellation of the active run.
    ///
    /// Takes effect at the next stage boundary; an in-flight stage is never
    /// interrupted. Returns `false` (and does nothing) when no run is active.
    pub fn abort(&self) -> bool {
        let state = self.inner.lock_state();
        match (&state.cancel, state.is_running) {
            (Some(flag), true) => {
                flag.store(true, Ordering::SeqCst);
                info!(
                    stage_index = ?state.current_stage_index,
                    "Abort requested; takes effect at the next stage boundary"
                );
                true
            }
            _ => {
                debug!("Abort ignored: no active run");
                false
            }
        }
    }

    /// Snapshot of the active run, or of the last finished run.
    #[must_use]
    pub fn current_run(&self) -> Option<LoopRun> {
        self.inner.lock_state().current_run.clone()
    }

    /// Index of the running stage; `None` when no run is active.
    #[must_use]
    pub fn current_stage_index(&self) -> Option<usize> {
        self.inner.lock_state().current_stage_index
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.lock_state().is_running
    }

    /// Finished runs, most recent first.
    #[must_use]
    pub fn history(&self) -> Vec<LoopRun> {
        self.inner.history.runs()
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        self.inner.history.stats()
    }

    /// Empty the history. An in-flight run is unaffected and will still be
    /// filed when it finishes.
    pub fn clear_history(&self) {
        self.inner.history.clear();
        self.inner.publish(LoopEvent::HistoryCleared);
        debug!("History cleared");
    }

    #[must_use]
    pub fn history_store(&self) -> &Arc<HistoryStore> {
        &self.inner.history
    }

    #[must_use]
    pub fn stage_timeout(&self) -> StageTimeout {
        self.inner.stage_timeout
    }

    /// Subscribe to loop events from this point on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        self.inner.events.subscribe()
    }

    /// Resolve once no run is active.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.running.subscribe();
        // Only fails once the sender is dropped, and `Inner` owns it
        let _ = rx.wait_for(|running| !*running).await;
    }

    fn claim(&self, trigger: Trigger) -> Option<ActiveRun> {
        let mut guard = self.inner.lock_state();
        let state = &mut *guard;
        if state.is_running {
            debug!(trigger = %trigger, "Start ignored: a run is already active");
            return None;
        }

        let now = Utc::now();
        let run_id = next_run_id(now);
        let mut run = LoopRun::new(run_id.clone(), trigger, now);
        run.begin_stage(Stage::Monitor, now);

        let cancel = Arc::new(AtomicBool::new(false));
        state.is_running = true;
        state.current_stage_index = Some(Stage::Monitor.index());
        state.cancel = Some(Arc::clone(&cancel));

        self.inner.publish(LoopEvent::RunStarted { run: run.clone() });
        self.inner.publish(LoopEvent::StageStarted {
            run_id: run_id.clone(),
            index: Stage::Monitor.index(),
            stage: Stage::Monitor,
        });
        state.current_run = Some(run);
        self.inner.running.send_replace(true);

        log_run_started(&run_id, trigger);
        Some(ActiveRun {
            run_id,
            trigger,
            cancel,
        })
    }

    async fn drive(self, active: ActiveRun) -> LoopRun {
        let span = run_span(&active.run_id, active.trigger);
        async move {
            for stage in Stage::ALL {
                if stage != Stage::Monitor {
                    self.begin_stage(&active, stage);
                }
                log_stage_start(&active.run_id, stage);

                let outcome = self
                    .execute_stage(stage)
                    .instrument(stage_span(&active.run_id, stage))
                    .await;

                if let Flow::Stop = self.settle_stage(&active, stage, outcome) {
                    break;
                }
            }
            self.finalize(&active)
        }
        .instrument(span)
        .await
    }

    fn begin_stage(&self, active: &ActiveRun, stage: Stage) {
        let now = Utc::now();
        let mut guard = self.inner.lock_state();
        let state = &mut *guard;
        if let Some(run) = state.current_run.as_mut() {
            run.begin_stage(stage, now);
        }
        state.current_stage_index = Some(stage.index());
        self.inner.publish(LoopEvent::StageStarted {
            run_id: active.run_id.clone(),
            index: stage.index(),
            stage,
        });
    }

    /// Run the executor for `stage` in its own task, bounded by the stage
    /// timeout. Executor errors, timeouts and panics all become `StageError`.
    async fn execute_stage(&self, stage: Stage) -> Result<StageOutput, StageError> {
        let executor = Arc::clone(&self.inner.executor);
        let timeout = self.inner.stage_timeout;

        let mut task = tokio::spawn(async move { executor.execute(stage).await }.in_current_span());

        match tokio::time::timeout(timeout.duration, &mut task).await {
            Ok(Ok(Ok(output))) => Ok(output),
            Ok(Ok(Err(err))) => Err(StageError::Failed {
                stage: stage.to_string(),
                reason: format!("{err:#}"),
            }),
            Ok(Err(join_err)) => Err(join_failure(stage, join_err)),
            Err(_elapsed) => {
                task.abort();
                Err(StageError::TimedOut {
                    stage: stage.to_string(),
                    timeout_seconds: timeout.as_secs(),
                })
            }
        }
    }

    fn settle_stage(
        &self,
        active: &ActiveRun,
        stage: Stage,
        outcome: Result<StageOutput, StageError>,
    ) -> Flow {
        let now = Utc::now();
        let mut guard = self.inner.lock_state();
        let Some(run) = guard.current_run.as_mut() else {
            return Flow::Stop;
        };

        let flow = match outcome {
            Ok(output) => {
                run.complete_stage(stage, now, output);
                let duration_ms = run.stage(stage).duration_ms.unwrap_or(0);
                log_stage_complete(&active.run_id, stage, duration_ms);

                // The flag is checked after every stage, the last one included
                if active.cancel.load(Ordering::SeqCst) {
                    run.abort_after(stage);
                    info!(run_id = %active.run_id, stage = %stage, "Run aborted at stage boundary");
                    Flow::Stop
                } else if stage.next().is_none() {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            }
            Err(err) => {
                run.fail_stage(stage, now, err.to_string());
                let duration_ms = run.stage(stage).duration_ms.unwrap_or(0);
                log_stage_error(&active.run_id, stage, &err.to_string(), duration_ms);
                Flow::Stop
            }
        };

        let result = run.stage(stage).clone();
        self.inner.publish(LoopEvent::StageFinished {
            run_id: active.run_id.clone(),
            index: stage.index(),
            result,
        });
        flow
    }

    fn finalize(&self, active: &ActiveRun) -> LoopRun {
        let now = Utc::now();
        let mut guard = self.inner.lock_state();
        let state = &mut *guard;

        let finished = if let Some(run) = state.current_run.as_mut() {
            run.finish(now);
            run.clone()
        } else {
            warn!(run_id = %active.run_id, "Active run record missing at finalization");
            let mut run = LoopRun::new(active.run_id.clone(), active.trigger, now);
            run.finish(now);
            run
        };

        state.is_running = false;
        state.current_stage_index = None;
        state.cancel = None;

        self.inner.history.append_run(finished.clone());
        self.inner.publish(LoopEvent::RunFinished {
            run: finished.clone(),
        });
        self.inner.running.send_replace(false);

        log_run_finished(
            &finished.id,
            finished.overall_status,
            finished.duration_ms().unwrap_or(0),
        );
        finished
    }
}

fn join_failure(stage: Stage, err: JoinError) -> StageError {
    if err.is_panic() {
        StageError::Panicked {
            stage: stage.to_string(),
            message: panic_message(err.into_panic().as_ref()),
        }
    } else {
        StageError::Failed {
            stage: stage.to_string(),
            reason: "stage task was cancelled".to_string(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
