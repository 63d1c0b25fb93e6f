//! `tibco-builder installations` - Manage configured installations

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tibco_builder::infrastructure::{Installation, InstallationStore, check_home};
use tibco_builder::ToolKind;

#[derive(Subcommand, Debug)]
pub enum InstallationsCommand {
    /// List configured installations
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Add an installation, replacing one with the same name
    Add {
        /// Name jobs refer to
        name: String,
        /// Installation root
        home: String,
        /// Directory of one tool's executable, relative to the home
        #[arg(long, value_name = "TOOL=DIR", value_parser = parse_tool_dir)]
        tool_dir: Vec<(ToolKind, PathBuf)>,
    },

    /// Remove an installation
    Remove {
        /// Installation name
        name: String,
    },
}

fn parse_tool_dir(s: &str) -> Result<(ToolKind, PathBuf), String> {
    let (tool, dir) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TOOL=DIR, got `{s}`"))?;
    let kind = ToolKind::from_id(tool).ok_or_else(|| format!("unknown tool `{tool}`"))?;
    Ok((kind, PathBuf::from(dir)))
}

pub fn run(store: &InstallationStore, command: InstallationsCommand) -> Result<()> {
    match command {
        InstallationsCommand::List { json } => {
            let installations = store.installations();
            if json {
                println!("{}", serde_json::to_string_pretty(&installations)?);
            } else if installations.is_empty() {
                println!("No TIBCO installation configured");
            } else {
                print!("{}", format_installations(&installations));
            }
        }
        InstallationsCommand::Add {
            name,
            home,
            tool_dir,
        } => {
            // Homes holding ${VAR} are only checked once expanded, at build time.
            if !home.contains("${")
                && let Err(message) = check_home(Path::new(&home))
            {
                bail!(message);
            }
            let installation = tool_dir
                .into_iter()
                .fold(Installation::new(name, &home), |inst, (kind, dir)| {
                    inst.with_tool_dir(kind, dir)
                });
            tracing::info!(name = %installation.name, home = %installation.home, "Adding installation");
            store
                .add(installation)
                .context("Failed to save the configuration")?;
        }
        InstallationsCommand::Remove { name } => {
            let removed = store
                .remove(&name)
                .context("Failed to save the configuration")?;
            if !removed {
                bail!("No installation named `{name}`");
            }
        }
    }
    Ok(())
}

fn format_installations(installations: &[Installation]) -> String {
    let mut out = String::new();
    for installation in installations {
        out.push_str(&format!("{:<20}{}\n", installation.name, installation.home));
        for (kind, dir) in &installation.tool_dirs {
            out.push_str(&format!("  {kind}: {}\n", dir.display()));
        }
    }
    out
}
