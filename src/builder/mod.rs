//! Builder domain types and logic

pub mod ant;
pub mod config;
pub mod errors;
pub mod plugins;
pub mod studio_tools;
pub mod types;


pub use ant::AmxEclipseAntBuilder;
pub use config::{AntConfig, STUDIO_TOOLS_OPERATIONS, StudioToolsConfig, ToolConfig, fix_empty_and_trim};
pub use errors::BuildError;
pub use plugins::{
    BuilderDescriptor, BuilderRegistry, InstallationLookup, TibcoBuilder, default_property_file,
    registry,
};
pub use studio_tools::StudioToolsBuilder;
pub use types::{ExecutionOutcome, FailureReason, Platform, ToolKind};
