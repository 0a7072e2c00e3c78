//! Config command implementation
//!
//! Handles `serviceloop config`: effective values and where each came from.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use super::json_emit::emit_json;
use crate::{Config, ConfigSource, ExitCode};

#[derive(Serialize)]
struct ConfigValue {
    value: String,
    source: ConfigSource,
}

#[derive(Serialize)]
struct ConfigReport {
    config_path: Option<PathBuf>,
    values: BTreeMap<String, ConfigValue>,
}

/// Print the effective configuration.
pub fn execute_config_command(json: bool, config: &Config) -> Result<ExitCode> {
    let values = config.effective_values();

    if json {
        let report = ConfigReport {
            config_path: config.config_path.clone(),
            values: values
                .into_iter()
                .map(|(key, (value, source))| (key, ConfigValue { value, source }))
                .collect(),
        };
        println!("{}", emit_json(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    match &config.config_path {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    for key in Config::KEYS {
        if let Some((value, source)) = values.get(key) {
            println!("  {key:<20} = {value:<10} ({source})");
        }
    }
    Ok(ExitCode::SUCCESS)
}
