//! TIBCO installations
//!
//! An [`Installation`] is an administrator-configured root directory. Before
//! a build uses it, the installation is specialized for the node the build
//! runs on and then for the build environment, in that order. An
//! [`InstallationResolver`] turns the specialized home into the path of a
//! tool executable.

use crate::builder::{Platform, ToolKind};
use crate::executor::EnvironmentView;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the variable that points tools at their installation
pub const TIBCO_HOME: &str = "TIBCO_HOME";

/// Strips one trailing path separator
#[must_use]
pub fn launder_home(home: &str) -> String {
    home.strip_suffix('/')
        .or_else(|| home.strip_suffix('\\'))
        .unwrap_or(home)
        .to_string()
}

/// A named TIBCO installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    /// Name jobs refer to
    pub name: String,

    /// Installation root
    pub home: String,

    /// Directory holding each tool's executable, relative to `home`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tool_dirs: BTreeMap<ToolKind, PathBuf>,
}

impl Installation {
    /// Creates an installation, laundering `home`
    #[must_use]
    pub fn new(name: impl Into<String>, home: &str) -> Self {
        Self {
            name: name.into(),
            home: launder_home(home),
            tool_dirs: BTreeMap::new(),
        }
    }

    /// Sets the directory holding `tool`, relative to `home`
    #[must_use]
    pub fn with_tool_dir(mut self, tool: ToolKind, dir: impl Into<PathBuf>) -> Self {
        self.tool_dirs.insert(tool, dir.into());
        self
    }

    /// Applies the node's tool location for this installation, if any
    #[must_use]
    pub fn for_node(&self, node: &Node) -> Self {
        match node.tool_location(&self.name) {
            Some(home) => Self {
                home: launder_home(home),
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    /// Expands `${VAR}` placeholders in `home`
    #[must_use]
    pub fn for_environment(&self, env: &EnvironmentView) -> Self {
        Self {
            home: env.expand(&self.home),
            ..self.clone()
        }
    }
}

/// The machine a build runs on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node name, empty for the built-in node
    #[serde(default)]
    pub name: String,

    /// Per-installation home overrides on this node
    #[serde(default)]
    pub tool_locations: BTreeMap<String, String>,
}

impl Node {
    /// The built-in node, with no overrides
    #[must_use]
    pub fn built_in() -> Self {
        Self::default()
    }

    /// Creates a named node
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tool_locations: BTreeMap::new(),
        }
    }

    /// Overrides the home of `installation` on this node
    #[must_use]
    pub fn with_tool_location(mut self, installation: impl Into<String>, home: impl Into<String>) -> Self {
        self.tool_locations.insert(installation.into(), home.into());
        self
    }

    /// Home override for `installation`, if any
    #[must_use]
    pub fn tool_location(&self, installation: &str) -> Option<&str> {
        self.tool_locations.get(installation).map(String::as_str)
    }
}

/// Installation specialized for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstallation {
    /// Installation name
    pub name: String,
    /// Specialized home directory
    pub home: PathBuf,
    /// Absolute, platform-correct executable path
    pub executable: PathBuf,
}

impl ResolvedInstallation {
    /// Variables the installation contributes to the process environment
    #[must_use]
    pub fn env_overlay(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(
            TIBCO_HOME.to_string(),
            self.home.to_string_lossy().into_owned(),
        )])
    }
}

/// Finds tool executables inside an installation
pub trait InstallationResolver: Send + Sync {
    /// Returns the executable for `tool`, or `None` if it does not exist
    fn resolve_executable(
        &self,
        installation: &Installation,
        tool: ToolKind,
        platform: Platform,
    ) -> Option<PathBuf>;

    /// Specializes `installation` for `node` then `env` and resolves `tool`
    fn specialize(
        &self,
        installation: &Installation,
        node: &Node,
        env: &EnvironmentView,
        tool: ToolKind,
        platform: Platform,
    ) -> Option<ResolvedInstallation> {
        let specialized = installation.for_node(node).for_environment(env);
        let executable = self.resolve_executable(&specialized, tool, platform)?;
        Some(ResolvedInstallation {
            name: specialized.name,
            home: PathBuf::from(specialized.home),
            executable,
        })
    }
}

/// Looks for executables in a fixed list of directories under the home
#[derive(Debug, Clone)]
pub struct SearchPathResolver {
    search_dirs: Vec<PathBuf>,
}

impl SearchPathResolver {
    /// Creates a resolver searching `dirs`, relative to the home
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs: dirs }
    }
}

impl Default for SearchPathResolver {
    fn default() -> Self {
        Self::new(vec![PathBuf::from("bin"), PathBuf::new()])
    }
}

impl InstallationResolver for SearchPathResolver {
    fn resolve_executable(
        &self,
        installation: &Installation,
        tool: ToolKind,
        platform: Platform,
    ) -> Option<PathBuf> {
        let home = Path::new(&installation.home);
        let exe_name = tool.executable_name(platform);

        let candidates: Vec<PathBuf> = match installation.tool_dirs.get(&tool) {
            Some(dir) => vec![home.join(dir).join(&exe_name)],
            None => self
                .search_dirs
                .iter()
                .map(|dir| home.join(dir).join(&exe_name))
                .collect(),
        };

        let found = candidates.into_iter().find(|path| path.is_file())?;
        tracing::debug!(installation = %installation.name, executable = %found.display(), "Resolved executable");
        Some(std::path::absolute(&found).unwrap_or(found))
    }
}

/// Checks that `home` can serve as an installation root
///
/// # Errors
///
/// Returns a message if `home` is set but is not a directory.
pub fn check_home(home: &Path) -> Result<(), String> {
    if home.as_os_str().is_empty() || home.is_dir() {
        Ok(())
    } else {
        Err(format!("Not a valid directory: {}", home.display()))
    }
}
