//! `tibco-builder run` and `tibco-builder compose`

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use tibco_builder::builder::STUDIO_TOOLS_OPERATIONS;
use tibco_builder::prelude::*;

/// Arguments shared by `run` and `compose`
#[derive(Args, Debug)]
pub struct JobArgs {
    /// Job file describing one build step
    pub job: PathBuf,

    /// Workspace root (defaults to the current directory)
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Module root, relative to the workspace (defaults to the workspace)
    #[arg(long)]
    pub module_root: Option<PathBuf>,

    /// Build variable, repeatable
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,

    /// Build variable whose value must not be logged, repeatable
    #[arg(long, value_name = "KEY")]
    pub sensitive: Vec<String>,

    /// Node the build runs on, as named in the configuration file
    #[arg(long)]
    pub node: Option<String>,
}

fn parse_define(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

impl JobArgs {
    fn context(&self, store: &InstallationStore) -> Result<BuildContext> {
        let workspace = match &self.workspace {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Cannot determine the current directory")?,
        };

        let mut env = EnvironmentView::from_process()
            .with_base_var("WORKSPACE", workspace.to_string_lossy());
        for (key, value) in &self.defines {
            env = env.with_build_variable(key, value);
        }
        for key in &self.sensitive {
            env = env.with_sensitive(key);
        }

        let node = match &self.node {
            Some(name) => store.node(name).unwrap_or_else(|| Node::named(name)),
            None => Node::built_in(),
        };

        let mut ctx = BuildContext::new(&workspace).with_env(env).with_node(node);
        if let Some(root) = &self.module_root {
            ctx = ctx.with_module_root(workspace.join(root));
        }
        Ok(ctx)
    }
}

fn load_job(path: &std::path::Path) -> Result<ToolConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file: {}", path.display()))?;
    ToolConfig::from_yaml(&text).with_context(|| format!("Invalid job file: {}", path.display()))
}

/// Composes and runs the job, streaming the annotated output to stdout
pub fn run_job(store: &InstallationStore, args: &JobArgs) -> Result<ExecutionOutcome> {
    let config = load_job(&args.job)?;
    let ctx = args.context(store)?;
    let builder = registry().create(config)?;

    let resolver = SearchPathResolver::default();
    let lookup = InstallationLookup::new(store, &resolver);

    let stdout = std::io::stdout();
    let mut log = stdout.lock();
    let outcome = builder.perform(&ctx, &lookup, &LocalLauncher, &mut log);
    tracing::info!(tool = %builder.kind(), outcome = %outcome, "Build step finished");
    Ok(outcome)
}

/// What `compose` prints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedCommand {
    /// Tool kind identifier
    pub tool: ToolKind,
    /// Working directory
    pub working_dir: PathBuf,
    /// Argument vector as logged, sensitive values masked
    pub argv: Vec<String>,
    /// Variables added to the process environment, sensitive values masked
    pub env_overlay: BTreeMap<String, String>,
}

impl ComposedCommand {
    /// Human-readable rendering
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "tool: {}", self.tool);
        let _ = writeln!(out, "working directory: {}", self.working_dir.display());
        let _ = writeln!(out, "argv:");
        for arg in &self.argv {
            let _ = writeln!(out, "  {arg}");
        }
        let _ = writeln!(out, "environment:");
        for (key, value) in &self.env_overlay {
            let _ = writeln!(out, "  {key}={value}");
        }
        out
    }
}

impl From<&CommandLine> for ComposedCommand {
    fn from(cmd: &CommandLine) -> Self {
        Self {
            tool: cmd.tool(),
            working_dir: cmd.working_dir().to_path_buf(),
            argv: cmd.args().to_masked_vec(),
            env_overlay: cmd.masked_overlay(),
        }
    }
}

/// Composes the job without running it
pub fn compose_job(store: &InstallationStore, args: &JobArgs) -> Result<ComposedCommand> {
    let config = load_job(&args.job)?;
    let ctx = args.context(store)?;
    let builder = registry().create(config)?;

    let resolver = SearchPathResolver::default();
    let lookup = InstallationLookup::new(store, &resolver);
    let cmd = builder.compose(&ctx, &lookup)?;
    Ok(ComposedCommand::from(&cmd))
}

/// Lists registered tool kinds and the studio-tools operations
pub fn describe_tools() -> String {
    let mut out = String::new();
    for id in registry().names() {
        if let Some(descriptor) = registry().get(id) {
            let _ = writeln!(out, "{id:<18}{}", descriptor.display_name());
        }
    }
    let _ = writeln!(out, "\nstudio-tools operations:");
    for (id, label) in STUDIO_TOOLS_OPERATIONS {
        let _ = writeln!(out, "  {id:<24}{label}");
    }
    out
}
