//! Per-invocation build context

use super::environment::EnvironmentView;
use crate::builder::Platform;
use crate::infrastructure::Node;
use std::path::PathBuf;

/// Everything a build step needs to know about the build it runs in
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Invocation ID, used to correlate log lines
    pub invocation_id: String,

    /// Layered environment
    pub env: EnvironmentView,

    /// Module root, searched first for build files
    pub module_root: PathBuf,

    /// Workspace root, searched second for build files
    pub workspace_root: PathBuf,

    /// Node the build runs on
    pub node: Node,

    /// Platform of that node
    pub platform: Platform,
}

impl BuildContext {
    /// Creates a context rooted at `workspace` on the built-in node
    #[must_use]
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        Self {
            invocation_id: uuid::Uuid::new_v4().to_string(),
            env: EnvironmentView::new(),
            module_root: workspace.clone(),
            workspace_root: workspace,
            node: Node::built_in(),
            platform: Platform::current(),
        }
    }

    /// Sets the environment
    #[must_use]
    pub fn with_env(mut self, env: EnvironmentView) -> Self {
        self.env = env;
        self
    }

    /// Sets the module root
    #[must_use]
    pub fn with_module_root(mut self, module_root: impl Into<PathBuf>) -> Self {
        self.module_root = module_root.into();
        self
    }

    /// Sets the node
    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.node = node;
        self
    }

    /// Sets the platform
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}
