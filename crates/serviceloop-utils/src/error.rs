use std::fmt;
use thiserror::Error;

/// Library-level error type for serviceloop.
///
/// Stage failures are normally recorded as data on the run and never reach
/// callers through this type; `LoopError::Stage` exists for executors and
/// tooling that want to surface a single stage failure directly.
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration errors |
/// | 1 | Everything else |
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    StageExecution,
    FileSystem,
    Runtime,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::StageExecution => write!(f, "Stage Execution"),
            Self::FileSystem => write!(f, "File System"),
            Self::Runtime => write!(f, "Runtime"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

/// Failure of a single stage's unit of work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("Stage {stage} failed: {reason}")]
    Failed { stage: String, reason: String },

    #[error("Stage {stage} timed out after {timeout_seconds} seconds")]
    TimedOut { stage: String, timeout_seconds: u64 },

    #[error("Stage {stage} panicked: {message}")]
    Panicked { stage: String, message: String },
}

impl StageError {
    /// Name of the stage this error belongs to.
    #[must_use]
    pub fn stage(&self) -> &str {
        match self {
            Self::Failed { stage, .. }
            | Self::TimedOut { stage, .. }
            | Self::Panicked { stage, .. } => stage,
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

impl UserFriendlyError for LoopError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Stage(err) => err.user_message(),
            Self::Io(err) => format!("File system operation failed: {err}"),
            Self::Runtime(msg) => format!("Async runtime failure: {msg}"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Stage(err) => err.suggestions(),
            Self::Io(_) => vec!["Check file permissions and that the path exists".to_string()],
            Self::Runtime(_) => vec!["Re-run with --verbose for details".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Stage(_) => ErrorCategory::StageExecution,
            Self::Io(_) => ErrorCategory::FileSystem,
            Self::Runtime(_) => ErrorCategory::Runtime,
        }
    }
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => format!("The configuration file is invalid: {reason}"),
            Self::InvalidValue { key, value } => {
                format!("Configuration key '{key}' has an invalid value: {value}")
            }
            Self::NotFound { path } => format!("No configuration file exists at {path}"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of the file".to_string(),
                "Only keys under the [loop] table are recognised".to_string(),
            ],
            Self::InvalidValue { key, .. } => {
                vec![format!("Adjust '{key}' in .serviceloop/config.toml or on the command line")]
            }
            Self::NotFound { .. } => vec![
                "Pass an existing file with --config".to_string(),
                "Or unset SERVICELOOP_CONFIG to use discovery".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl UserFriendlyError for StageError {
    fn user_message(&self) -> String {
        match self {
            Self::Failed { stage, reason } => format!("The {stage} stage failed: {reason}"),
            Self::TimedOut {
                stage,
                timeout_seconds,
            } => format!("The {stage} stage did not finish within {timeout_seconds} seconds"),
            Self::Panicked { stage, .. } => {
                format!("The {stage} stage work crashed before returning a result")
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TimedOut { .. } => vec![
                "Increase stage_timeout_secs if the stage is expected to be slow".to_string(),
            ],
            _ => vec!["Start a new run to retry; runs are never retried automatically".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::StageExecution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_display() {
        let err = StageError::TimedOut {
            stage: "execute".to_string(),
            timeout_seconds: 30,
        };
        assert_eq!(err.to_string(), "Stage execute timed out after 30 seconds");
        assert_eq!(err.stage(), "execute");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_loop_error_from_config() {
        let err: LoopError = ConfigError::InvalidValue {
            key: "auto_interval_secs".to_string(),
            value: "must be at least 1".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.user_message().contains("auto_interval_secs"));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_stage_error_category() {
        let err = LoopError::Stage(StageError::Failed {
            stage: "verify".to_string(),
            reason: "node unreachable".to_string(),
        });
        assert_eq!(err.category(), ErrorCategory::StageExecution);
        assert_eq!(err.category().to_string(), "Stage Execution");
    }
}
