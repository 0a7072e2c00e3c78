//! Service loop orchestration
//!
//! [`LoopOrchestrator`] drives one run at a time through the six fixed stages
//! (monitor → analyze → decide → execute → verify → optimize), publishes every
//! transition as a [`LoopEvent`], honours cooperative aborts at stage
//! boundaries, and files finished runs into a shared
//! [`HistoryStore`](serviceloop_history::HistoryStore).
//!
//! [`AutoTrigger`] layers a periodic caller on top.

mod auto;
mod events;
mod orchestrator;
mod timeout;

pub use auto::AutoTrigger;
pub use events::LoopEvent;
pub use orchestrator::{LoopOrchestrator, OrchestratorOptions};
pub use timeout::StageTimeout;
