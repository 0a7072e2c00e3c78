//! Per-stage results and the run record.
//!
//! All state transitions of a run live here so the orchestrator only decides
//! *when* a transition happens, never *how* the record changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use serviceloop_stage_api::StageOutput;
use serviceloop_utils::types::{RunStatus, STAGE_COUNT, Stage, StageStatus, Trigger};

/// Milliseconds between two instants, clamped at zero.
#[must_use]
pub fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_milliseconds()).unwrap_or(0)
}

/// Outcome of one stage within one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResult {
    pub stage: Stage,
    pub status: StageStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// `completed_at - started_at` in milliseconds
    #[serde(rename = "duration")]
    pub duration_ms: Option<u64>,
    pub summary: String,
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, f64>>,
}

impl StageResult {
    /// Placeholder for a stage that has not been reached.
    #[must_use]
    pub fn idle(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Idle,
            started_at: None,
            completed_at: None,
            duration_ms: None,
            summary: String::new(),
            details: Vec::new(),
            metrics: None,
        }
    }

    fn settle(&mut self, at: DateTime<Utc>) {
        let started = *self.started_at.get_or_insert(at);
        self.completed_at = Some(at);
        self.duration_ms = Some(elapsed_ms(started, at));
    }
}

/// Violated structural invariant of a [`LoopRun`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("stage slot {index} holds {found}")]
    StageOrder { index: usize, found: Stage },

    #[error("{stage} is {status} but has no start time")]
    MissingStart { stage: Stage, status: StageStatus },

    #[error("{stage} settled without completion time or duration")]
    MissingCompletion { stage: Stage },

    #[error("{stage} duration {recorded}ms does not match timestamps ({expected}ms)")]
    DurationMismatch {
        stage: Stage,
        recorded: u64,
        expected: u64,
    },

    #[error("{count} stages are running at once")]
    MultipleRunning { count: usize },

    #[error("finished run has no completion time")]
    UnfinishedRun,
}

/// Record of one loop execution.
///
/// Created by the orchestrator when a run starts and copied by value into
/// history when the run finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopRun {
    pub id: String,
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub overall_status: RunStatus,
    /// Exactly one entry per stage, in stage order
    pub stages: [StageResult; STAGE_COUNT],
}

impl LoopRun {
    /// Fresh run with every stage idle.
    #[must_use]
    pub fn new(id: impl Into<String>, trigger: Trigger, started_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            trigger,
            started_at,
            completed_at: None,
            overall_status: RunStatus::Running,
            stages: Stage::ALL.map(StageResult::idle),
        }
    }

    #[must_use]
    pub fn stage(&self, stage: Stage) -> &StageResult {
        &self.stages[stage.index()]
    }

    fn stage_mut(&mut self, stage: Stage) -> &mut StageResult {
        &mut self.stages[stage.index()]
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.overall_status.is_finished()
    }

    /// Wall time of the run in milliseconds, once finished.
    #[must_use]
    pub fn duration_ms(&self) -> Option<u64> {
        self.completed_at
            .map(|done| elapsed_ms(self.started_at, done))
    }

    /// The stage currently marked running, if any.
    #[must_use]
    pub fn running_stage(&self) -> Option<Stage> {
        self.stages
            .iter()
            .find(|r| r.status == StageStatus::Running)
            .map(|r| r.stage)
    }

    /// Mark `stage` running as of `at`.
    pub fn begin_stage(&mut self, stage: Stage, at: DateTime<Utc>) {
        let result = self.stage_mut(stage);
        result.status = StageStatus::Running;
        result.started_at = Some(at);
        result.completed_at = None;
        result.duration_ms = None;
    }

    /// Record a successful stage.
    pub fn complete_stage(&mut self, stage: Stage, at: DateTime<Utc>, output: StageOutput) {
        let result = self.stage_mut(stage);
        result.settle(at);
        result.status = StageStatus::Completed;
        result.summary = output.summary;
        result.details = output.details;
        result.metrics = output.metrics;
    }

    /// Record a failed stage; the run as a whole becomes `Error`.
    pub fn fail_stage(&mut self, stage: Stage, at: DateTime<Utc>, message: impl Into<String>) {
        let result = self.stage_mut(stage);
        result.settle(at);
        result.status = StageStatus::Error;
        result.summary = message.into();
        self.overall_status = RunStatus::Error;
    }

    /// Abort after `last_stage`: every later stage becomes `Skipped`.
    pub fn abort_after(&mut self, last_stage: Stage) {
        for result in &mut self.stages[last_stage.index() + 1..] {
            result.status = StageStatus::Skipped;
        }
        self.overall_status = RunStatus::Aborted;
    }

    /// Stamp the completion time. A run still `Running` at this point
    /// went through every stage and becomes `Completed`.
    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
        if self.overall_status == RunStatus::Running {
            self.overall_status = RunStatus::Completed;
        }
    }

    /// Check the structural invariants every run must hold.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut running = 0;
        for (index, result) in self.stages.iter().enumerate() {
            if result.stage != Stage::ALL[index] {
                return Err(InvariantViolation::StageOrder {
                    index,
                    found: result.stage,
                });
            }

            let reached = matches!(
                result.status,
                StageStatus::Running | StageStatus::Completed | StageStatus::Error
            );
            if reached && result.started_at.is_none() {
                return Err(InvariantViolation::MissingStart {
                    stage: result.stage,
                    status: result.status,
                });
            }

            if result.status == StageStatus::Running {
                running += 1;
            }

            if result.status.is_settled() {
                let (Some(start), Some(end), Some(recorded)) =
                    (result.started_at, result.completed_at, result.duration_ms)
                else {
                    return Err(InvariantViolation::MissingCompletion {
                        stage: result.stage,
                    });
                };
                let expected = elapsed_ms(start, end);
                if recorded != expected {
                    return Err(InvariantViolation::DurationMismatch {
                        stage: result.stage,
                        recorded,
                        expected,
                    });
                }
            }
        }

        if running > 1 {
            return Err(InvariantViolation::MultipleRunning { count: running });
        }
        if self.is_finished() && self.completed_at.is_none() {
            return Err(InvariantViolation::UnfinishedRun);
        }
        Ok(())
    }
}
