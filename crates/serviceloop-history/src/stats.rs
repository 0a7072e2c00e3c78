use serde::{Deserialize, Serialize};
use serviceloop_utils::types::RunStatus;

use crate::run::LoopRun;

/// Aggregate statistics over finished runs.
///
/// Always recomputed from the full history rather than maintained
/// incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_runs: usize,
    pub success_runs: usize,
    pub error_runs: usize,
    pub aborted_runs: usize,
    /// Mean wall time of completed runs, rounded to the nearest millisecond
    #[serde(rename = "avgDuration")]
    pub avg_duration_ms: u64,
}

impl Stats {
    /// Compute statistics over `runs`.
    ///
    /// Only runs whose status is `Completed` (and which carry a completion
    /// time) contribute to the average duration.
    pub fn from_runs<'a, I>(runs: I) -> Self
    where
        I: IntoIterator<Item = &'a LoopRun>,
    {
        let mut stats = Self::default();
        let mut completed_total_ms: u128 = 0;
        let mut completed_count: u128 = 0;

        for run in runs {
            stats.total_runs += 1;
            match run.overall_status {
                RunStatus::Completed => {
                    stats.success_runs += 1;
                    if let Some(ms) = run.duration_ms() {
                        completed_total_ms += u128::from(ms);
                        completed_count += 1;
                    }
                }
                RunStatus::Error => stats.error_runs += 1,
                RunStatus::Aborted => stats.aborted_runs += 1,
                RunStatus::Running => {}
            }
        }

        if completed_count > 0 {
            let avg = (completed_total_ms + completed_count / 2) / completed_count;
            stats.avg_duration_ms = u64::try_from(avg).unwrap_or(u64::MAX);
        }
        stats
    }

    /// Fraction of runs that completed, in `0.0..=1.0`.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.success_runs as f64 / self.total_runs as f64
        }
    }
}
