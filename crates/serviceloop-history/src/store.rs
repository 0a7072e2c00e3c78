//! Append-only store of finished runs.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::run::LoopRun;
use crate::stats::Stats;

/// Finished runs, most recent first.
///
/// Appends and clears are serialized by an internal mutex so one store can
/// be shared by several orchestrators. With a retention cap the oldest runs
/// are evicted once the cap is exceeded; without one every run is kept.
#[derive(Debug, Default)]
pub struct HistoryStore {
    runs: Mutex<VecDeque<LoopRun>>,
    limit: Option<usize>,
}

impl HistoryStore {
    /// Store that retains every run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that keeps at most `limit` runs (`None` retains all).
    #[must_use]
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            runs: Mutex::new(VecDeque::new()),
            limit: limit.map(|n| n.max(1)),
        }
    }

    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn guard(&self) -> MutexGuard<'_, VecDeque<LoopRun>> {
        // A panic while holding the lock cannot leave the deque half-updated
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a finished run at the front. No deduplication.
    pub fn append_run(&self, run: LoopRun) {
        let mut runs = self.guard();
        runs.push_front(run);
        if let Some(limit) = self.limit {
            runs.truncate(limit);
        }
    }

    /// Remove every run.
    pub fn clear(&self) {
        self.guard().clear();
    }

    /// Snapshot of all runs, most recent first.
    #[must_use]
    pub fn runs(&self) -> Vec<LoopRun> {
        self.guard().iter().cloned().collect()
    }

    #[must_use]
    pub fn latest(&self) -> Option<LoopRun> {
        self.guard().front().cloned()
    }

    /// Look up a run by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<LoopRun> {
        self.guard().iter().find(|run| run.id == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Statistics recomputed from the current contents.
    #[must_use]
    pub fn stats(&self) -> Stats {
        Stats::from_runs(self.guard().iter())
    }
}
