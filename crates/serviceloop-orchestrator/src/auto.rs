use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use serviceloop_utils::types::Trigger;

use crate::orchestrator::LoopOrchestrator;

/// Periodically starts runs with [`Trigger::Auto`].
///
/// While enabled, a ticker task calls [`LoopOrchestrator::start`] once per
/// interval; a tick that lands while a run is active is skipped. Disabling
/// cancels future ticks only; a run already in flight is left to finish.
pub struct AutoTrigger {
    orchestrator: LoopOrchestrator,
    interval: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl AutoTrigger {
    const MIN_INTERVAL: Duration = Duration::from_millis(1);

    #[must_use]
    pub fn new(orchestrator: LoopOrchestrator, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval: interval.max(Self::MIN_INTERVAL),
            ticker: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    fn guard(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.guard().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Enable or disable periodic runs. Idempotent.
    ///
    /// Enabling outside a Tokio runtime is refused with a warning and leaves
    /// the trigger disabled.
    pub fn set_enabled(&self, enabled: bool) {
        let mut ticker = self.guard();
        match (enabled, ticker.take()) {
            (true, Some(handle)) if !handle.is_finished() => {
                *ticker = Some(handle);
            }
            (true, _) => match Handle::try_current() {
                Ok(runtime) => {
                    info!(interval_secs = self.interval.as_secs(), "Auto mode enabled");
                    *ticker = Some(self.arm(&runtime));
                }
                Err(_) => warn!("Auto mode not enabled: no async runtime is active"),
            },
            (false, Some(handle)) => {
                handle.abort();
                info!("Auto mode disabled");
            }
            (false, None) => {}
        }
    }

    fn arm(&self, runtime: &Handle) -> JoinHandle<()> {
        let orchestrator = self.orchestrator.clone();
        let period = self.interval;
        runtime.spawn(async move {
            // First tick one full period from now, not immediately
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                if orchestrator.start(Trigger::Auto).is_some() {
                    debug!("Auto trigger started a run");
                } else {
                    debug!("Auto tick skipped: a run is already active");
                }
            }
        })
    }
}

impl Drop for AutoTrigger {
    fn drop(&mut self) {
        if let Some(handle) = self.guard().take() {
            handle.abort();
        }
    }
}
