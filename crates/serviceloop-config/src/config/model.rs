use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-stage timeout in seconds.
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 120;

/// Default auto-trigger cadence in seconds.
pub const DEFAULT_AUTO_INTERVAL_SECS: u64 = 300;

/// Default broadcast buffer for loop events.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Effective orchestrator settings after precedence has been applied.
///
/// Construct directly (or via `Default`) for programmatic embedding where
/// the user's environment must not leak in; use [`Config::discover`](super::Config::discover)
/// for CLI-like behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Upper bound for a single stage's unit of work.
    pub stage_timeout_secs: u64,
    /// Cadence of the auto trigger.
    pub auto_interval_secs: u64,
    /// Whether the auto trigger is armed at startup.
    pub auto_mode: bool,
    /// Retention cap for finished runs; `None` retains everything.
    pub history_limit: Option<usize>,
    /// Buffer size for event subscribers before they start lagging.
    pub event_capacity: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
            auto_interval_secs: DEFAULT_AUTO_INTERVAL_SECS,
            auto_mode: false,
            history_limit: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl LoopConfig {
    #[must_use]
    pub const fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    #[must_use]
    pub const fn auto_interval(&self) -> Duration {
        Duration::from_secs(self.auto_interval_secs)
    }
}

/// `[loop]` table of the TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoopSection {
    pub stage_timeout_secs: Option<u64>,
    pub auto_interval_secs: Option<u64>,
    pub auto_mode: Option<bool>,
    pub history_limit: Option<usize>,
    pub event_capacity: Option<usize>,
}

/// Overrides supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file path (skips discovery)
    pub config_path: Option<std::path::PathBuf>,
    pub stage_timeout_secs: Option<u64>,
    pub auto_interval_secs: Option<u64>,
    pub auto_mode: Option<bool>,
    pub history_limit: Option<usize>,
}
