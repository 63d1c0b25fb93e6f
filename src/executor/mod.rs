//! Command composition and process execution
//!
//! This module contains everything between a composed invocation and the
//! build log: argument lists, the environment view, the launcher and the
//! console annotator.

pub mod annotator;
mod command;
mod context;
mod environment;
mod process;

pub use annotator::{LineAnnotator, Marker};
pub use command::{Argument, ArgumentList, CommandLine, MASK, parse_properties, tokenize};
pub use context::BuildContext;
pub use environment::{EnvironmentView, expand_variables, redact};
pub use process::{Launcher, LocalLauncher, ProcessExecutor};
pub(crate) use process::write_log_line;
