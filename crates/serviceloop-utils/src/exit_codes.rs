//! Exit code constants for the serviceloop CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Run completed (or command succeeded) |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `RUN_FAILED` | The run ended with a stage error |
//! | 4 | `RUN_ABORTED` | The run was aborted |

use crate::error::LoopError;
use crate::types::RunStatus;

/// Exit codes matching the documented exit code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const INTERNAL: ExitCode = ExitCode(1);
    pub const CLI_ARGS: ExitCode = ExitCode(2);
    pub const RUN_FAILED: ExitCode = ExitCode(3);
    pub const RUN_ABORTED: ExitCode = ExitCode(4);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }

    /// Exit code reported for a finished run.
    #[must_use]
    pub const fn for_run_status(status: RunStatus) -> Self {
        match status {
            RunStatus::Completed => Self::SUCCESS,
            RunStatus::Error => Self::RUN_FAILED,
            RunStatus::Aborted => Self::RUN_ABORTED,
            RunStatus::Running => Self::INTERNAL,
        }
    }
}

impl LoopError {
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Stage(_) => ExitCode::RUN_FAILED,
            Self::Io(_) | Self::Runtime(_) => ExitCode::INTERNAL,
        }
    }
}
