//! Infrastructure layer
//!
//! This module contains the configuration store, installation handling and
//! logging setup.

mod config;
mod installation;
mod logging;

pub use config::{Config, DEFAULT_CONFIG_FILE, InstallationStore};
pub use installation::{
    Installation, InstallationResolver, Node, ResolvedInstallation, SearchPathResolver, TIBCO_HOME,
    check_home, launder_home,
};
pub use logging::init_logging;
