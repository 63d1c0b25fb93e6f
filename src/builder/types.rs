//! Core types for the builder domain
//!
//! This module contains the small value types shared by both tool kinds:
//! which tool is being driven, which platform it runs on, and how an
//! invocation ended.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two external TIBCO command-line programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// The AMX Eclipse Ant wrapper (`amx_eclipse_ant`)
    AmxEclipseAnt,
    /// The BusinessEvents studio-tools archive builder (`studio-tools`)
    StudioTools,
}

impl ToolKind {
    /// All tool kinds, in registration order
    pub const ALL: [ToolKind; 2] = [ToolKind::AmxEclipseAnt, ToolKind::StudioTools];

    /// Stable identifier used in job files and on the command line
    pub fn id(self) -> &'static str {
        match self {
            Self::AmxEclipseAnt => "amx-eclipse-ant",
            Self::StudioTools => "studio-tools",
        }
    }

    /// Executable file name on the given platform
    pub fn executable_name(self, platform: Platform) -> String {
        let base = match self {
            Self::AmxEclipseAnt => "amx_eclipse_ant",
            Self::StudioTools => "studio-tools",
        };
        match platform {
            Platform::Windows => format!("{base}.exe"),
            Platform::Unix => base.to_string(),
        }
    }

    /// Human-readable name of the build step
    pub fn display_name(self) -> &'static str {
        match self {
            Self::AmxEclipseAnt => "Invoke TIBCO AMX Eclipse Ant",
            Self::StudioTools => "Invoke TIBCO BusinessEvents studio-tools",
        }
    }

    /// Parses a tool-kind identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Platform of the node the tool runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux, macOS and other Unix-like systems
    Unix,
    /// Windows, where commands are wrapped in `cmd.exe`
    Windows,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Unix }
    }

    /// Returns true for Unix-like platforms
    pub fn is_unix(self) -> bool {
        matches!(self, Self::Unix)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Why an invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No matching installation, or its executable is missing on disk
    ExecutableNotFound,
    /// Neither build-file candidate exists
    BuildFileNotFound,
    /// Launching or talking to the process failed
    ProcessIoError,
    /// The process ran to completion with a non-zero exit code
    NonZeroExit,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutableNotFound => write!(f, "EXECUTABLE_NOT_FOUND"),
            Self::BuildFileNotFound => write!(f, "BUILD_FILE_NOT_FOUND"),
            Self::ProcessIoError => write!(f, "PROCESS_IO_ERROR"),
            Self::NonZeroExit => write!(f, "NON_ZERO_EXIT"),
        }
    }
}

/// Outcome of one builder invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    /// The process exited with code 0
    Success,
    /// Composition or execution failed
    Failure {
        /// Failure category
        reason: FailureReason,
        /// Diagnostic written to the build log
        message: String,
    },
}

impl ExecutionOutcome {
    /// Returns true if the invocation succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if the invocation failed
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Failure category, if any
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Success => None,
            Self::Failure { reason, .. } => Some(*reason),
        }
    }
}

impl From<super::errors::BuildError> for ExecutionOutcome {
    fn from(err: super::errors::BuildError) -> Self {
        Self::Failure {
            reason: err.reason(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failure { reason, message } => write!(f, "FAILURE ({reason}): {message}"),
        }
    }
}
