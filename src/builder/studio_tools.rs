//! BusinessEvents studio-tools builder
//!
//! Composes `studio-tools` invocations:
//!
//! ```text
//! <exe> --propFile <tra> -core <operation> -p <projectDir> [-x] [-o <archive>] [-cp <classpath>]
//! ```
//!
//! The project directory is handed to the tool as-is; it is not checked
//! here.

use super::config::StudioToolsConfig;
use super::errors::BuildError;
use super::plugins::{InstallationLookup, TibcoBuilder, default_property_file};
use super::types::ToolKind;
use crate::executor::{ArgumentList, BuildContext, CommandLine};

/// Builder for one studio-tools step
#[derive(Debug, Clone)]
pub struct StudioToolsBuilder {
    config: StudioToolsConfig,
}

impl StudioToolsBuilder {
    /// Creates a builder for `config`
    #[must_use]
    pub fn new(config: StudioToolsConfig) -> Self {
        Self { config }
    }

    /// Step configuration
    #[must_use]
    pub fn config(&self) -> &StudioToolsConfig {
        &self.config
    }
}

impl TibcoBuilder for StudioToolsBuilder {
    fn kind(&self) -> ToolKind {
        ToolKind::StudioTools
    }

    fn installation_name(&self) -> &str {
        &self.config.installation_name
    }

    fn compose(
        &self,
        ctx: &BuildContext,
        installations: &InstallationLookup<'_>,
    ) -> Result<CommandLine, BuildError> {
        let installation =
            installations.resolve(&self.config.installation_name, ToolKind::StudioTools, ctx)?;

        let env = &ctx.env;
        let operation = env.expand_opt(self.config.operation.as_deref());
        let project_dir = env.expand_opt(self.config.project_dir.as_deref());
        let archive = env.expand_opt(self.config.output_archive_file.as_deref());
        let class_path = env.expand_opt(self.config.extended_class_path.as_deref());
        let property_file = env
            .expand_opt(self.config.tra_property_file.as_deref())
            .unwrap_or_else(|| default_property_file(&installation.executable, ctx.platform));

        let mut args = ArgumentList::new();
        args.add(installation.executable.to_string_lossy())
            .add_pair("--propFile", property_file);
        if let Some(operation) = operation {
            args.add_pair("-core", operation);
        }
        if let Some(dir) = &project_dir {
            args.add_pair("-p", dir.clone());
        }
        if self.config.overwrite_output {
            args.add("-x");
        }
        if let Some(archive) = archive {
            args.add_pair("-o", archive);
        }
        if let Some(class_path) = class_path {
            args.add_pair("-cp", class_path);
        }

        let args = args.redacted(env);
        let args = if ctx.platform.is_unix() {
            args
        } else {
            args.to_windows_command().quote_empty_properties()
        };

        let working_dir = match project_dir {
            Some(dir) => ctx.workspace_root.join(dir),
            None => ctx.module_root.clone(),
        };

        let mut cmd = CommandLine::new(ToolKind::StudioTools, args, working_dir)
            .with_env(env.resolved())
            .with_secrets(env.sensitive_values());
        for (key, value) in installation.env_overlay() {
            cmd = cmd.with_overlay(key, value);
        }

        tracing::debug!(command = %cmd, "Composed studio-tools command");
        Ok(cmd.with_installation(installation))
    }
}
