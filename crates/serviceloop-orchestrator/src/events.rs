use serde::Serialize;

use serviceloop_history::{LoopRun, StageResult};
use serviceloop_utils::types::Stage;

/// Transition published by the orchestrator.
///
/// Events are sent while the orchestrator's state lock is held, immediately
/// after the mutation they describe, so each subscriber observes stage
/// indices in increasing order for a given run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    /// A run was created; stage 0 is already running.
    RunStarted { run: LoopRun },
    StageStarted {
        run_id: String,
        index: usize,
        stage: Stage,
    },
    StageFinished {
        run_id: String,
        index: usize,
        result: StageResult,
    },
    /// The run reached a terminal status and was filed into history.
    RunFinished { run: LoopRun },
    HistoryCleared,
}

impl LoopEvent {
    /// Id of the run the event belongs to, if any.
    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        match self {
            Self::RunStarted { run } | Self::RunFinished { run } => Some(&run.id),
            Self::StageStarted { run_id, .. } | Self::StageFinished { run_id, .. } => {
                Some(run_id)
            }
            Self::HistoryCleared => None,
        }
    }

    /// Stage index carried by the event, if any.
    #[must_use]
    pub const fn stage_index(&self) -> Option<usize> {
        match self {
            Self::StageStarted { index, .. } | Self::StageFinished { index, .. } => Some(*index),
            _ => None,
        }
    }
}
