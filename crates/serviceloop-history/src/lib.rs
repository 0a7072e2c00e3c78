//! Run records and history bookkeeping for the service loop.
//!
//! [`LoopRun`] is the record of one execution: six [`StageResult`] entries in
//! fixed stage order plus run-level metadata. Finished runs are copied into a
//! [`HistoryStore`], from which [`Stats`] are recomputed on demand.

pub mod run;
pub mod stats;
pub mod store;

pub use run::{InvariantViolation, LoopRun, StageResult};
pub use stats::Stats;
pub use store::HistoryStore;
