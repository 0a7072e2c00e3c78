use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serviceloop_utils::error::ConfigError;
use serviceloop_utils::types::ConfigSource;

use super::{
    CONFIG_DIR, CONFIG_ENV_VAR, CONFIG_FILE, CliArgs, Config, LoopConfig, LoopSection,
};

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(rename = "loop")]
    loop_section: Option<LoopSection>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for discovery when neither
    /// `--config` nor `SERVICELOOP_CONFIG` names a file.
    ///
    /// # Errors
    /// Fails if an explicitly named file is missing, a file cannot be parsed,
    /// or the merged values do not validate.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        let mut args = cli_args.clone();
        if args.config_path.is_none() {
            args.config_path = env::var_os(CONFIG_ENV_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from);
        }
        Self::discover_from(&start_dir, &args)
    }

    /// Discover and load configuration starting from a specific directory.
    ///
    /// Path-driven variant used by tests to avoid process-global state; does
    /// not consult `SERVICELOOP_CONFIG`.
    ///
    /// # Errors
    /// See [`Config::discover`].
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let mut loop_config = LoopConfig::default();
        let mut source_attribution: BTreeMap<String, ConfigSource> = Self::KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    }
                    .into());
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)?;
            if let Some(section) = file_config.loop_section {
                apply_section(&mut loop_config, &mut source_attribution, &section);
            }
        }

        apply_cli(&mut loop_config, &mut source_attribution, cli_args);

        let config = Self {
            loop_config,
            source_attribution,
            config_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Search upward from `start_dir` for `.serviceloop/config.toml`.
    ///
    /// Stops at the filesystem root or at a repository root marker.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = start_dir;

        loop {
            let config_path = current_dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.is_file() {
                return Some(config_path);
            }

            if current_dir.join(".git").exists() || current_dir.join(".hg").exists() {
                return None;
            }

            current_dir = current_dir.parent()?;
        }
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidFile(format!("{}: {}", path.display(), e.message())).into()
        })
    }
}

fn apply_section(
    config: &mut LoopConfig,
    sources: &mut BTreeMap<String, ConfigSource>,
    section: &LoopSection,
) {
    let mut mark = |key: &str| {
        sources.insert(key.to_string(), ConfigSource::Config);
    };
    if let Some(v) = section.stage_timeout_secs {
        config.stage_timeout_secs = v;
        mark("stage_timeout_secs");
    }
    if let Some(v) = section.auto_interval_secs {
        config.auto_interval_secs = v;
        mark("auto_interval_secs");
    }
    if let Some(v) = section.auto_mode {
        config.auto_mode = v;
        mark("auto_mode");
    }
    if let Some(v) = section.history_limit {
        config.history_limit = Some(v);
        mark("history_limit");
    }
    if let Some(v) = section.event_capacity {
        config.event_capacity = v;
        mark("event_capacity");
    }
}

fn apply_cli(
    config: &mut LoopConfig,
    sources: &mut BTreeMap<String, ConfigSource>,
    cli_args: &CliArgs,
) {
    let mut mark = |key: &str| {
        sources.insert(key.to_string(), ConfigSource::Cli);
    };
    if let Some(v) = cli_args.stage_timeout_secs {
        config.stage_timeout_secs = v;
        mark("stage_timeout_secs");
    }
    if let Some(v) = cli_args.auto_interval_secs {
        config.auto_interval_secs = v;
        mark("auto_interval_secs");
    }
    if let Some(v) = cli_args.auto_mode {
        config.auto_mode = v;
        mark("auto_mode");
    }
    if let Some(v) = cli_args.history_limit {
        config.history_limit = Some(v);
        mark("history_limit");
    }
}
