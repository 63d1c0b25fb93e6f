//! Command-line front end
//!
//! - `run`: compose and execute one job file
//! - `compose`: print the command a job file would run, without running it
//! - `installations`: list, add or remove configured installations
//! - `tools`: list the registered tool kinds
//! - `completions`: generate shell completions

pub mod completions;
pub mod installations;
pub mod run;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tibco_builder::infrastructure::{DEFAULT_CONFIG_FILE, InstallationStore, init_logging};

/// CLI arguments for tibco-builder
#[derive(Parser, Debug)]
#[command(name = "tibco-builder")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Global configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level (overrides the configuration file, `RUST_LOG` overrides both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose and run the build step described by a job file
    Run(run::JobArgs),

    /// Print the command line a job file would run
    Compose {
        #[command(flatten)]
        job: run::JobArgs,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Manage configured TIBCO installations
    #[command(subcommand)]
    Installations(installations::InstallationsCommand),

    /// List the supported tool kinds
    Tools,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    use clap::CommandFactory;
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<ExitCode> {
    let args = Args::parse();

    let store = InstallationStore::load(&args.config)
        .with_context(|| format!("Failed to load configuration: {}", args.config.display()))?;
    let level = args.log_level.clone().unwrap_or_else(|| store.log_level());
    init_logging(&level);

    match args.command {
        Command::Run(job) => {
            let outcome = run::run_job(&store, &job)?;
            if outcome.is_failure() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Compose { job, json } => {
            let composed = run::compose_job(&store, &job)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&composed)?);
            } else {
                print!("{}", composed.render());
            }
        }
        Command::Installations(command) => {
            installations::run(&store, command)?;
        }
        Command::Tools => {
            print!("{}", run::describe_tools());
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{completions}");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
