//! Configuration management
//!
//! Global settings live in one YAML file: the log level and the list of
//! installations jobs may refer to. [`InstallationStore`] loads that file
//! once at startup and writes it back after every change.

use super::installation::{Installation, Node};
use crate::builder::BuildError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "tibco-builder.yaml";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Configured installations
    #[serde(default)]
    pub installations: Vec<Installation>,
    /// Nodes with per-installation home overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            installations: Vec::new(),
            nodes: Vec::new(),
        }
    }
}

impl Config {
    /// Reads a configuration file; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Io` if the file cannot be read and
    /// `BuildError::Config` if it is not valid YAML.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let mut config: Self =
            serde_yaml::from_str(&text).map_err(|e| BuildError::Config(e.to_string()))?;
        for installation in &mut config.installations {
            installation.home = super::installation::launder_home(&installation.home);
        }
        Ok(config)
    }

    /// Writes this configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), BuildError> {
        let text = serde_yaml::to_string(self).map_err(|e| BuildError::Config(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        Ok(())
    }
}

/// Shared, persisted list of installations
#[derive(Debug)]
pub struct InstallationStore {
    path: Option<PathBuf>,
    config: RwLock<Config>,
}

impl InstallationStore {
    /// Creates an in-memory store that never touches the disk
    #[must_use]
    pub fn in_memory(installations: Vec<Installation>) -> Self {
        Self {
            path: None,
            config: RwLock::new(Config {
                installations,
                ..Config::default()
            }),
        }
    }

    /// Loads the store from `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, BuildError> {
        let path = path.into();
        let config = Config::load(&path)?;
        tracing::info!(
            path = %path.display(),
            installations = config.installations.len(),
            "Loaded configuration"
        );
        Ok(Self {
            path: Some(path),
            config: RwLock::new(config),
        })
    }

    /// Persists the current state, if the store is backed by a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<(), BuildError> {
        if let Some(path) = &self.path {
            self.config.read().save(path)?;
            tracing::debug!(path = %path.display(), "Saved configuration");
        }
        Ok(())
    }

    /// Configured log level
    #[must_use]
    pub fn log_level(&self) -> String {
        self.config.read().log_level.clone()
    }

    /// Snapshot of all installations
    #[must_use]
    pub fn installations(&self) -> Vec<Installation> {
        self.config.read().installations.clone()
    }

    /// Returns true if no installation is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.config.read().installations.is_empty()
    }

    /// Finds an installation by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Installation> {
        self.config
            .read()
            .installations
            .iter()
            .find(|i| i.name == name)
            .cloned()
    }

    /// Finds a node by name
    #[must_use]
    pub fn node(&self, name: &str) -> Option<Node> {
        self.config.read().nodes.iter().find(|n| n.name == name).cloned()
    }

    /// Replaces all installations and saves
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn set_installations(&self, installations: Vec<Installation>) -> Result<(), BuildError> {
        self.config.write().installations = installations;
        self.save()
    }

    /// Adds or replaces an installation by name and saves
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn add(&self, installation: Installation) -> Result<(), BuildError> {
        {
            let mut config = self.config.write();
            config.installations.retain(|i| i.name != installation.name);
            config.installations.push(installation);
        }
        self.save()
    }

    /// Removes an installation by name and saves; returns whether it existed
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn remove(&self, name: &str) -> Result<bool, BuildError> {
        let removed = {
            let mut config = self.config.write();
            let before = config.installations.len();
            config.installations.retain(|i| i.name != name);
            before != config.installations.len()
        };
        if removed {
            self.save()?;
        }
        Ok(removed)
    }
}
