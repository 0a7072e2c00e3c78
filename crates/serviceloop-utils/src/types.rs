use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of stages in every loop run.
pub const STAGE_COUNT: usize = 6;

/// Stage identifiers for the service loop pipeline.
///
/// `Stage` enumerates the six fixed steps of a loop run. Order is significant
/// and fixed; a run never reorders or repeats stages.
///
/// # Stage Order
///
/// ```text
/// Monitor → Analyze → Decide → Execute → Verify → Optimize
/// ```
///
/// # Example
///
/// ```rust
/// use serviceloop_utils::types::Stage;
///
/// let stage = Stage::Decide;
/// assert_eq!(stage.as_str(), "decide");
/// assert_eq!(stage.index(), 2);
/// assert_eq!(Stage::from_index(2), Some(Stage::Decide));
/// ```
///
/// # Serialization
///
/// `Stage` serializes to its lowercase name (e.g., `"monitor"`, `"optimize"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "test-utils", derive(strum::VariantNames))]
#[cfg_attr(feature = "test-utils", strum(serialize_all = "lowercase"))]
pub enum Stage {
    /// Collect cluster telemetry (GPU utilisation, queue depth, node health).
    Monitor,
    /// Detect anomalies and bottlenecks in the collected telemetry.
    Analyze,
    /// Choose remediation or scaling actions.
    Decide,
    /// Apply the chosen actions to the cluster.
    Execute,
    /// Confirm the actions had the intended effect.
    Verify,
    /// Tune parameters for the next iteration.
    Optimize,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; STAGE_COUNT] = [
        Self::Monitor,
        Self::Analyze,
        Self::Decide,
        Self::Execute,
        Self::Verify,
        Self::Optimize,
    ];

    /// Canonical lowercase name used in events, logs and JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monitor => "monitor",
            Self::Analyze => "analyze",
            Self::Decide => "decide",
            Self::Execute => "execute",
            Self::Verify => "verify",
            Self::Optimize => "optimize",
        }
    }

    /// Position of the stage within a run (0-based).
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Monitor => 0,
            Self::Analyze => 1,
            Self::Decide => 2,
            Self::Execute => 3,
            Self::Verify => 4,
            Self::Optimize => 5,
        }
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < STAGE_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Human-readable label for dashboards.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Monitor => "Monitor",
            Self::Analyze => "Analyze",
            Self::Decide => "Decide",
            Self::Execute => "Execute",
            Self::Verify => "Verify",
            Self::Optimize => "Optimize",
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Monitor => "Collect GPU, node and queue telemetry",
            Self::Analyze => "Detect anomalies and capacity bottlenecks",
            Self::Decide => "Select remediation and scaling actions",
            Self::Execute => "Apply selected actions to the cluster",
            Self::Verify => "Confirm actions reached the expected state",
            Self::Optimize => "Tune parameters for the next iteration",
        }
    }

    /// The stage that follows this one, if any.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("stage", s))
    }
}

/// Status of a single stage within a run.
///
/// `Idle` is the state of a stage not yet reached. Exactly one stage per run
/// may be `Running`. `Completed` and `Error` are terminal for the stage.
/// `Skipped` is produced only by abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "test-utils", derive(strum::VariantNames))]
#[cfg_attr(feature = "test-utils", strum(serialize_all = "lowercase"))]
pub enum StageStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
    Skipped,
}

impl StageStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }

    /// `Completed` or `Error`: the stage ran and settled.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason a run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "test-utils", derive(strum::VariantNames))]
#[cfg_attr(feature = "test-utils", strum(serialize_all = "lowercase"))]
pub enum Trigger {
    /// Operator action from the dashboard.
    #[default]
    Manual,
    /// Periodic auto trigger.
    Auto,
    /// External alert event.
    Alert,
}

impl Trigger {
    pub const ALL: [Trigger; 3] = [Self::Manual, Self::Auto, Self::Alert];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
            Self::Alert => "alert",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trigger {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|trigger| trigger.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("trigger", s))
    }
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "test-utils", derive(strum::VariantNames))]
#[cfg_attr(feature = "test-utils", strum(serialize_all = "lowercase"))]
pub enum RunStatus {
    Running,
    Completed,
    Error,
    Aborted,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Aborted => "aborted",
        }
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse failure for the string forms of the enums above.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Source of a configuration value.
///
/// Indicates where a configuration value originated from in the precedence chain:
/// CLI arguments > config file > programmatic overrides > built-in defaults.
///
/// # Example
///
/// ```rust
/// use serviceloop_utils::types::ConfigSource;
///
/// let source = ConfigSource::Cli;
/// let json = serde_json::to_string(&source).unwrap();
/// assert_eq!(json, r#""cli""#);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "test-utils", derive(strum::VariantNames))]
#[cfg_attr(feature = "test-utils", strum(serialize_all = "lowercase"))]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from configuration file.
    Config,
    /// Value provided programmatically.
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cli => "cli",
            Self::Config => "config",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        };
        f.write_str(s)
    }
}
