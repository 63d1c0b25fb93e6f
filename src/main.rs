//! tibco-builder - run TIBCO builds from the command line
//!
//! Composes and runs TIBCO AMX Eclipse Ant and BusinessEvents studio-tools
//! invocations described by small YAML job files.
//!
//! ## Commands
//!
//! - `tibco-builder run` - Compose and run a job file
//! - `tibco-builder compose` - Print the command a job file would run
//! - `tibco-builder installations` - Manage configured installations
//! - `tibco-builder tools` - List supported tool kinds
//! - `tibco-builder completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Register an installation
//! tibco-builder installations add tibco-5 /opt/tibco
//!
//! # Describe a build step
//! cat > package.yaml <<EOF
//! tool: amx-eclipse-ant
//! installationName: tibco-5
//! targets: clean package
//! EOF
//!
//! # See what would run, then run it
//! tibco-builder compose package.yaml -D RELEASE=5.2
//! tibco-builder run package.yaml -D RELEASE=5.2
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            if std::env::var("TIBCO_BUILDER_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
