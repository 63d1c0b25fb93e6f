//! Prelude module for common imports

// Re-export builder types
pub use crate::builder::{
    AmxEclipseAntBuilder, AntConfig, BuildError, BuilderDescriptor, BuilderRegistry,
    ExecutionOutcome, FailureReason, InstallationLookup, Platform, StudioToolsBuilder,
    StudioToolsConfig, TibcoBuilder, ToolConfig, ToolKind, registry,
};

// Re-export executor types
pub use crate::executor::{
    BuildContext, CommandLine, EnvironmentView, Launcher, LineAnnotator, LocalLauncher,
    ProcessExecutor,
};

// Re-export infrastructure types
pub use crate::infrastructure::{
    Installation, InstallationResolver, InstallationStore, Node, SearchPathResolver,
};
