use std::time::Duration;

use serviceloop_config::LoopConfig;

/// Per-stage timeout with sensible defaults.
///
/// A stage whose executor does not resolve within the timeout is recorded
/// as a failed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeout {
    /// Timeout duration for one stage's unit of work
    pub duration: Duration,
}

impl StageTimeout {
    /// Default timeout in seconds (2 minutes)
    pub const DEFAULT_SECS: u64 = 120;

    /// Minimum timeout in seconds
    pub const MIN_SECS: u64 = 1;

    /// Create a `StageTimeout` with a specific duration in seconds
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self {
            duration: Duration::from_secs(secs.max(Self::MIN_SECS)),
        }
    }

    #[must_use]
    pub fn from_config(config: &LoopConfig) -> Self {
        Self::from_secs(config.stage_timeout_secs)
    }

    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.duration.as_secs()
    }
}

impl Default for StageTimeout {
    fn default() -> Self {
        Self::from_secs(Self::DEFAULT_SECS)
    }
}
