mod discovery;
mod model;
mod validation;

pub use model::{CliArgs, LoopConfig, LoopSection};

use std::collections::BTreeMap;
use std::path::PathBuf;

use serviceloop_utils::types::ConfigSource;

/// Directory searched for during discovery.
pub const CONFIG_DIR: &str = ".serviceloop";

/// File name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SERVICELOOP_CONFIG";

/// Configuration for serviceloop operations.
///
/// Holds the effective [`LoopConfig`] plus where each value came from.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI-like behaviour that:
/// - Honours `--config` and then `SERVICELOOP_CONFIG`
/// - Otherwise searches for `.serviceloop/config.toml` upward from the current
///   directory, stopping at a repository root
/// - Applies built-in defaults for unspecified values
#[derive(Debug, Clone)]
pub struct Config {
    pub loop_config: LoopConfig,
    /// Source attribution for every key in `loop_config`
    pub source_attribution: BTreeMap<String, ConfigSource>,
    /// Config file that contributed values, if any
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Built-in defaults with every key attributed to `ConfigSource::Default`.
    #[must_use]
    pub fn defaults() -> Self {
        Self::programmatic_with_source(LoopConfig::default(), ConfigSource::Default)
    }

    /// Wrap a programmatically built `LoopConfig`.
    #[must_use]
    pub fn programmatic(loop_config: LoopConfig) -> Self {
        Self::programmatic_with_source(loop_config, ConfigSource::Programmatic)
    }

    fn programmatic_with_source(loop_config: LoopConfig, source: ConfigSource) -> Self {
        let source_attribution = Self::KEYS
            .iter()
            .map(|key| ((*key).to_string(), source))
            .collect();
        Self {
            loop_config,
            source_attribution,
            config_path: None,
        }
    }

    /// Every configurable key, in display order.
    pub const KEYS: [&'static str; 5] = [
        "stage_timeout_secs",
        "auto_interval_secs",
        "auto_mode",
        "history_limit",
        "event_capacity",
    ];

    /// Source of a key, `Default` when unknown.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }

    /// Effective values rendered as strings with their source, for display.
    #[must_use]
    pub fn effective_values(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let c = &self.loop_config;
        let history = c
            .history_limit
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string());
        let values = [
            ("stage_timeout_secs", c.stage_timeout_secs.to_string()),
            ("auto_interval_secs", c.auto_interval_secs.to_string()),
            ("auto_mode", c.auto_mode.to_string()),
            ("history_limit", history),
            ("event_capacity", c.event_capacity.to_string()),
        ];
        values
            .into_iter()
            .map(|(key, value)| (key.to_string(), (value, self.source_of(key))))
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}
