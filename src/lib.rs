//! # tibco-builder - TIBCO build steps for CI
//!
//! tibco-builder drives two TIBCO command-line programs from a CI job:
//! the AMX Eclipse Ant wrapper (`amx_eclipse_ant`) and the BusinessEvents
//! archive builder (`studio-tools`). For each build step it
//!
//! 1. resolves a named installation for the node and environment,
//! 2. composes the exact command line, masking sensitive values in
//!    everything that gets logged,
//! 3. runs the process and streams its output through a line annotator
//!    that marks target headers and the final `BUILD SUCCESSFUL` /
//!    `BUILD FAILED` line,
//! 4. maps the exit code into an [`ExecutionOutcome`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use tibco_builder::prelude::*;
//!
//! let store = InstallationStore::in_memory(vec![Installation::new("tibco", "/opt/tibco")]);
//! let resolver = SearchPathResolver::default();
//! let lookup = InstallationLookup::new(&store, &resolver);
//!
//! let ctx = BuildContext::new("/var/ci/workspace")
//!     .with_env(EnvironmentView::from_process().with_build_variable("RELEASE", "5.2"));
//! let builder = registry()
//!     .create(AntConfig::new("tibco").with_targets("clean package").into())
//!     .unwrap();
//!
//! let outcome = builder.perform(&ctx, &lookup, &LocalLauncher, &mut std::io::stdout());
//! assert!(outcome.is_success());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod builder;
pub mod executor;
pub mod infrastructure;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use builder::{
    AmxEclipseAntBuilder, AntConfig, BuildError, BuilderRegistry, ExecutionOutcome, FailureReason,
    InstallationLookup, Platform, StudioToolsBuilder, StudioToolsConfig, TibcoBuilder, ToolConfig,
    ToolKind, registry,
};
pub use executor::{
    ArgumentList, BuildContext, CommandLine, EnvironmentView, Launcher, LineAnnotator,
    LocalLauncher, ProcessExecutor, expand_variables,
};
pub use infrastructure::{
    Config, Installation, InstallationResolver, InstallationStore, Node, ResolvedInstallation,
    SearchPathResolver, init_logging,
};

/// Version of the tibco-builder crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
