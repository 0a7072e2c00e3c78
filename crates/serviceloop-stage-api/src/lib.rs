//! Stage work contract for the service loop orchestrator
//!
//! This crate defines the boundary between the orchestrator and whatever
//! performs each stage's unit of work. The orchestrator treats executors as
//! opaque: they may be mocks, simulations, or calls into real cluster
//! subsystems.
//!
//! # Purpose
//!
//! Keeping the contract in its own crate lets executors be written against
//! a small surface without pulling in orchestration or history types.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

pub use serviceloop_utils::types::Stage;

/// Payload produced by a successful stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    /// One-line summary shown on the stage card
    pub summary: String,
    /// Ordered detail lines
    pub details: Vec<String>,
    /// Optional numeric metrics keyed by name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, f64>>,
}

impl StageOutput {
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            details: Vec::new(),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }

    #[must_use]
    pub fn with_details<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.details.extend(lines.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value);
        self
    }
}

/// Performs the unit of work for one stage.
///
/// Implementations either resolve to a [`StageOutput`] or fail. The
/// orchestrator calls at most one stage at a time per run and applies its
/// own timeout; executors need not guard against either.
#[async_trait]
pub trait StageWorkExecutor: Send + Sync {
    async fn execute(&self, stage: Stage) -> Result<StageOutput>;
}

#[async_trait]
impl<T> StageWorkExecutor for Arc<T>
where
    T: StageWorkExecutor + ?Sized,
{
    async fn execute(&self, stage: Stage) -> Result<StageOutput> {
        (**self).execute(stage).await
    }
}

/// Adapter turning an async closure into a [`StageWorkExecutor`].
///
/// ```rust
/// use serviceloop_stage_api::{FnExecutor, Stage, StageOutput, StageWorkExecutor};
///
/// # tokio_test_block(async {
/// let executor = FnExecutor::new(|stage: Stage| async move {
///     Ok::<_, anyhow::Error>(StageOutput::new(format!("{stage} ok")))
/// });
/// let out = executor.execute(Stage::Monitor).await.unwrap();
/// assert_eq!(out.summary, "monitor ok");
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
pub struct FnExecutor<F> {
    func: F,
}

impl<F> FnExecutor<F> {
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> StageWorkExecutor for FnExecutor<F>
where
    F: Fn(Stage) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StageOutput>> + Send,
{
    async fn execute(&self, stage: Stage) -> Result<StageOutput> {
        (self.func)(stage).await
    }
}
