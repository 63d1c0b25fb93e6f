//! Builder plugin system
//!
//! Each tool kind is one [`TibcoBuilder`] implementation. A
//! [`BuilderDescriptor`] turns a job's [`ToolConfig`] into a builder, and
//! the process-wide [`BuilderRegistry`] maps tool identifiers to
//! descriptors.

use super::ant::AmxEclipseAntBuilder;
use super::config::ToolConfig;
use super::errors::BuildError;
use super::studio_tools::StudioToolsBuilder;
use super::types::{ExecutionOutcome, Platform, ToolKind};
use crate::executor::{BuildContext, CommandLine, Launcher, ProcessExecutor, write_log_line};
use crate::infrastructure::{InstallationResolver, InstallationStore, ResolvedInstallation};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Configured installations plus the resolver that looks inside them
#[derive(Clone, Copy)]
pub struct InstallationLookup<'a> {
    store: &'a InstallationStore,
    resolver: &'a dyn InstallationResolver,
}

impl<'a> InstallationLookup<'a> {
    /// Creates a lookup over `store`
    #[must_use]
    pub fn new(store: &'a InstallationStore, resolver: &'a dyn InstallationResolver) -> Self {
        Self { store, resolver }
    }

    /// Returns true if at least one installation is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.store.is_empty()
    }

    /// Finds `name` and specializes it for the build's node and environment
    ///
    /// # Errors
    ///
    /// Returns `BuildError::ExecutableNotFound` if no installation has that
    /// name or its executable is missing.
    pub fn resolve(
        &self,
        name: &str,
        tool: ToolKind,
        ctx: &BuildContext,
    ) -> Result<ResolvedInstallation, BuildError> {
        let not_found = || BuildError::ExecutableNotFound {
            installation: name.to_string(),
        };
        let installation = self.store.find(name).ok_or_else(not_found)?;
        self.resolver
            .specialize(&installation, &ctx.node, &ctx.env, tool, ctx.platform)
            .ok_or_else(not_found)
    }
}

/// Property file used when the job does not name one
///
/// `<exe>.tra` on Unix, `<exe without .exe>.tra` on Windows.
#[must_use]
pub fn default_property_file(executable: &Path, platform: Platform) -> String {
    let exe = executable.to_string_lossy();
    let stem = match platform {
        Platform::Windows => exe
            .len()
            .checked_sub(4)
            .filter(|&at| exe.is_char_boundary(at) && exe[at..].eq_ignore_ascii_case(".exe"))
            .map_or(&exe[..], |at| &exe[..at]),
        Platform::Unix => &exe[..],
    };
    format!("{stem}.tra")
}

/// One tool kind's build step
pub trait TibcoBuilder: Send + Sync {
    /// Tool kind this builder drives
    fn kind(&self) -> ToolKind;

    /// Human-readable name of the step
    fn display_name(&self) -> &'static str {
        self.kind().display_name()
    }

    /// Installation the step asks for
    fn installation_name(&self) -> &str;

    /// Builds the command line without side effects
    ///
    /// # Errors
    ///
    /// Returns `ExecutableNotFound` or `BuildFileNotFound` when the
    /// invocation cannot be composed.
    fn compose(
        &self,
        ctx: &BuildContext,
        installations: &InstallationLookup<'_>,
    ) -> Result<CommandLine, BuildError>;

    /// Composes and runs the step, writing everything into `log`
    fn perform(
        &self,
        ctx: &BuildContext,
        installations: &InstallationLookup<'_>,
        launcher: &dyn Launcher,
        log: &mut dyn Write,
    ) -> ExecutionOutcome {
        let span = tracing::info_span!("perform", tool = %self.kind(), invocation = %ctx.invocation_id);
        let _guard = span.enter();

        let cmd = match self.compose(ctx, installations) {
            Ok(cmd) => cmd,
            Err(err) => {
                tracing::error!(error = %err, "Cannot compose command line");
                write_log_line(log, format_args!("FATAL: {err}"));
                return err.into();
            }
        };

        ProcessExecutor::new(launcher)
            .installations_configured(installations.is_configured())
            .execute(&cmd, log)
    }
}

/// Creates builders of one tool kind
pub trait BuilderDescriptor: Send + Sync {
    /// Tool kind of the builders this descriptor creates
    fn kind(&self) -> ToolKind;

    /// Human-readable name
    fn display_name(&self) -> &str;

    /// Creates a builder from a job configuration
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Config` if `config` is for another tool kind.
    fn new_instance(&self, config: ToolConfig) -> Result<Box<dyn TibcoBuilder>, BuildError>;
}

fn wrong_kind(expected: ToolKind, config: &ToolConfig) -> BuildError {
    BuildError::Config(format!(
        "expected a {expected} step, got {}",
        config.kind()
    ))
}

struct AntDescriptor;

impl BuilderDescriptor for AntDescriptor {
    fn kind(&self) -> ToolKind {
        ToolKind::AmxEclipseAnt
    }

    fn display_name(&self) -> &str {
        self.kind().display_name()
    }

    fn new_instance(&self, config: ToolConfig) -> Result<Box<dyn TibcoBuilder>, BuildError> {
        match config {
            ToolConfig::AmxEclipseAnt(ant) => Ok(Box::new(AmxEclipseAntBuilder::new(ant))),
            other => Err(wrong_kind(self.kind(), &other)),
        }
    }
}

struct StudioToolsDescriptor;

impl BuilderDescriptor for StudioToolsDescriptor {
    fn kind(&self) -> ToolKind {
        ToolKind::StudioTools
    }

    fn display_name(&self) -> &str {
        self.kind().display_name()
    }

    fn new_instance(&self, config: ToolConfig) -> Result<Box<dyn TibcoBuilder>, BuildError> {
        match config {
            ToolConfig::StudioTools(st) => Ok(Box::new(StudioToolsBuilder::new(st))),
            other => Err(wrong_kind(self.kind(), &other)),
        }
    }
}

/// Registry of builder descriptors, keyed by tool identifier
#[derive(Default)]
pub struct BuilderRegistry {
    descriptors: HashMap<String, Arc<dyn BuilderDescriptor>>,
}

impl BuilderRegistry {
    /// Creates a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
        }
    }

    /// Creates a registry holding both built-in tool kinds
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(AntDescriptor);
        registry.register(StudioToolsDescriptor);
        registry
    }

    /// Registers a descriptor
    pub fn register<T: BuilderDescriptor + 'static>(&mut self, descriptor: T) {
        let arc: Arc<dyn BuilderDescriptor> = Arc::new(descriptor);
        self.descriptors.insert(arc.kind().id().to_string(), arc);
    }

    /// Gets a descriptor by tool identifier
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn BuilderDescriptor>> {
        self.descriptors.get(id).cloned()
    }

    /// Checks if a tool identifier is registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    /// Registered tool identifiers, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Creates the builder for a job step
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Config` if the step's tool kind is not registered.
    pub fn create(&self, config: ToolConfig) -> Result<Box<dyn TibcoBuilder>, BuildError> {
        let id = config.kind().id();
        let descriptor = self
            .get(id)
            .ok_or_else(|| BuildError::Config(format!("no builder registered for {id}")))?;
        descriptor.new_instance(config)
    }
}

static REGISTRY: Lazy<BuilderRegistry> = Lazy::new(BuilderRegistry::with_defaults);

/// Process-wide registry of the built-in tool kinds
#[must_use]
pub fn registry() -> &'static BuilderRegistry {
    &REGISTRY
}
