//! Error types for the builder domain

use super::types::FailureReason;
use std::path::PathBuf;
use thiserror::Error;

/// Suffix appended when no installation is configured at all
pub const GLOBAL_CONFIG_NEEDED: &str =
    " Maybe you need to configure where your TIBCO installation is?";

/// Suffix appended when installations exist but the job picked none
pub const PROJECT_CONFIG_NEEDED: &str =
    " Maybe you need to configure the job to choose one of your TIBCO installations?";

/// Errors that can occur while composing or running a TIBCO tool
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No installation matched, or its executable does not exist
    #[error("Cannot find executable from the chosen TIBCO installation \"{installation}\"")]
    ExecutableNotFound {
        /// Installation name the job asked for.
        installation: String,
    },

    /// Neither the module-root nor the workspace-root build file exists
    #[error("Unable to find build script at {}", path.display())]
    BuildFileNotFound {
        /// First candidate that was tried.
        path: PathBuf,
    },

    /// Launching or communicating with the process failed
    #[error("command execution failed: {reason}{hint}")]
    ProcessIo {
        /// Underlying I/O error text.
        reason: String,
        /// Configuration hint, empty when none applies.
        hint: String,
    },

    /// The process ran to completion and reported failure
    #[error("Process exited with code {code}")]
    NonZeroExit {
        /// Exit code returned by the process.
        code: i32,
    },

    /// Configuration file or job file is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error outside process execution
    #[error("IO error: {0}")]
    Io(String),
}

impl BuildError {
    /// Creates a process I/O error without a hint
    #[must_use]
    pub fn process_io(reason: impl Into<String>) -> Self {
        Self::ProcessIo {
            reason: reason.into(),
            hint: String::new(),
        }
    }

    /// Failure category reported to the host
    #[must_use]
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::ExecutableNotFound { .. } => FailureReason::ExecutableNotFound,
            Self::BuildFileNotFound { .. } => FailureReason::BuildFileNotFound,
            Self::NonZeroExit { .. } => FailureReason::NonZeroExit,
            Self::ProcessIo { .. } | Self::Config(_) | Self::Io(_) => {
                FailureReason::ProcessIoError
            }
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
