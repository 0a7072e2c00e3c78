use serviceloop_utils::error::ConfigError;

use super::{Config, LoopConfig};

const MAX_STAGE_TIMEOUT_SECS: u64 = 3600;
const MAX_AUTO_INTERVAL_SECS: u64 = 86_400;
const MAX_EVENT_CAPACITY: usize = 65_536;

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl LoopConfig {
    /// Validate configuration values
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stage_timeout_secs == 0 {
            return Err(invalid("stage_timeout_secs", "must be at least 1 second"));
        }
        if self.stage_timeout_secs > MAX_STAGE_TIMEOUT_SECS {
            return Err(invalid(
                "stage_timeout_secs",
                "exceeds maximum limit of 3600 seconds (1 hour)",
            ));
        }

        if self.auto_interval_secs == 0 {
            return Err(invalid("auto_interval_secs", "must be at least 1 second"));
        }
        if self.auto_interval_secs > MAX_AUTO_INTERVAL_SECS {
            return Err(invalid(
                "auto_interval_secs",
                "exceeds maximum limit of 86400 seconds (1 day)",
            ));
        }

        if self.history_limit == Some(0) {
            return Err(invalid("history_limit", "must be greater than 0 when set"));
        }

        if self.event_capacity == 0 {
            return Err(invalid("event_capacity", "must be greater than 0"));
        }
        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(invalid("event_capacity", "exceeds maximum limit of 65536"));
        }

        Ok(())
    }
}

impl Config {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.loop_config.validate()
    }
}
