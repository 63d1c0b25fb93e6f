//! Job-level tool configuration
//!
//! A `ToolConfig` is what a job stores for one build step. Values are
//! immutable once built, and every optional string is normalized so that
//! an empty or blank field is the same as an absent one.

use super::types::ToolKind;
use serde::{Deserialize, Deserializer, Serialize};

/// Trims `value` and maps an empty result to `None`
#[must_use]
pub fn fix_empty_and_trim(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn normalized<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(fix_empty_and_trim(raw.as_deref()))
}

/// Configuration of an AMX Eclipse Ant build step
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntConfig {
    /// Name of the installation to use
    pub installation_name: String,

    /// Targets, `-D` options and Ant flags, whitespace or newline separated
    #[serde(default, deserialize_with = "normalized")]
    pub targets: Option<String>,

    /// Build script relative to the module root or workspace
    #[serde(default, deserialize_with = "normalized")]
    pub build_file: Option<String>,

    /// Extra `key=value` properties, one per line
    #[serde(default, deserialize_with = "normalized")]
    pub properties: Option<String>,

    /// Override for the `.tra` property file
    #[serde(default, deserialize_with = "normalized")]
    pub tra_property_file: Option<String>,

    /// Value for `ANT_OPTS`
    #[serde(default, deserialize_with = "normalized")]
    pub ant_opts: Option<String>,

    /// Business Studio workspace passed as `-data`
    #[serde(default, deserialize_with = "normalized")]
    pub business_studio_workspace: Option<String>,
}

impl AntConfig {
    /// Creates a new Ant configuration for the given installation
    #[must_use]
    pub fn new(installation_name: impl Into<String>) -> Self {
        Self {
            installation_name: installation_name.into(),
            ..Self::default()
        }
    }

    /// Sets the targets string
    #[must_use]
    pub fn with_targets(mut self, targets: &str) -> Self {
        self.targets = fix_empty_and_trim(Some(targets));
        self
    }

    /// Sets the build file
    #[must_use]
    pub fn with_build_file(mut self, build_file: &str) -> Self {
        self.build_file = fix_empty_and_trim(Some(build_file));
        self
    }

    /// Sets the free-form properties text
    #[must_use]
    pub fn with_properties(mut self, properties: &str) -> Self {
        self.properties = fix_empty_and_trim(Some(properties));
        self
    }

    /// Sets the `.tra` property file override
    #[must_use]
    pub fn with_tra_property_file(mut self, path: &str) -> Self {
        self.tra_property_file = fix_empty_and_trim(Some(path));
        self
    }

    /// Sets `ANT_OPTS`
    #[must_use]
    pub fn with_ant_opts(mut self, opts: &str) -> Self {
        self.ant_opts = fix_empty_and_trim(Some(opts));
        self
    }

    /// Sets the Business Studio workspace
    #[must_use]
    pub fn with_business_studio_workspace(mut self, workspace: &str) -> Self {
        self.business_studio_workspace = fix_empty_and_trim(Some(workspace));
        self
    }
}

/// Configuration of a studio-tools build step
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioToolsConfig {
    /// Name of the installation to use
    pub installation_name: String,

    /// studio-tools operation, passed as `-core`
    #[serde(default, deserialize_with = "normalized")]
    pub operation: Option<String>,

    /// Project directory, passed as `-p` and used as working directory
    #[serde(default, deserialize_with = "normalized")]
    pub project_dir: Option<String>,

    /// Override for the `.tra` property file
    #[serde(default, deserialize_with = "normalized")]
    pub tra_property_file: Option<String>,

    /// Archive to produce, passed as `-o`
    #[serde(default, deserialize_with = "normalized")]
    pub output_archive_file: Option<String>,

    /// Extra class path, passed as `-cp`
    #[serde(default, deserialize_with = "normalized")]
    pub extended_class_path: Option<String>,

    /// Overwrite an existing archive (`-x`)
    #[serde(default)]
    pub overwrite_output: bool,
}

impl StudioToolsConfig {
    /// Creates a new studio-tools configuration for the given installation
    #[must_use]
    pub fn new(installation_name: impl Into<String>) -> Self {
        Self {
            installation_name: installation_name.into(),
            ..Self::default()
        }
    }

    /// Sets the operation
    #[must_use]
    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = fix_empty_and_trim(Some(operation));
        self
    }

    /// Sets the project directory
    #[must_use]
    pub fn with_project_dir(mut self, dir: &str) -> Self {
        self.project_dir = fix_empty_and_trim(Some(dir));
        self
    }

    /// Sets the `.tra` property file override
    #[must_use]
    pub fn with_tra_property_file(mut self, path: &str) -> Self {
        self.tra_property_file = fix_empty_and_trim(Some(path));
        self
    }

    /// Sets the output archive
    #[must_use]
    pub fn with_output_archive_file(mut self, path: &str) -> Self {
        self.output_archive_file = fix_empty_and_trim(Some(path));
        self
    }

    /// Sets the extended class path
    #[must_use]
    pub fn with_extended_class_path(mut self, class_path: &str) -> Self {
        self.extended_class_path = fix_empty_and_trim(Some(class_path));
        self
    }

    /// Sets whether the output archive is overwritten
    #[must_use]
    pub fn with_overwrite_output(mut self, overwrite: bool) -> Self {
        self.overwrite_output = overwrite;
        self
    }
}

/// Operations offered for studio-tools; the operation field stays free-form
pub const STUDIO_TOOLS_OPERATIONS: [(&str, &str); 6] = [
    ("importDesigner", "Import Designer Project"),
    ("migrateCoherenceCalls", "Migrate Coherence Function Calls"),
    (
        "importExistingProject",
        "Import Existing TIBCO BusinessEvents Studio Project",
    ),
    (
        "buildLibrary",
        "Create TIBCO BusinessEvents Studio 5.1 Project Library",
    ),
    ("buildEar", "Build Enterprise Archive"),
    ("generateClass", "Generate Class"),
];

/// A configured build step of either tool kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "kebab-case")]
pub enum ToolConfig {
    /// AMX Eclipse Ant step
    AmxEclipseAnt(AntConfig),
    /// studio-tools step
    StudioTools(StudioToolsConfig),
}

impl ToolConfig {
    /// Tool kind of this step
    #[must_use]
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::AmxEclipseAnt(_) => ToolKind::AmxEclipseAnt,
            Self::StudioTools(_) => ToolKind::StudioTools,
        }
    }

    /// Installation name the step asks for
    #[must_use]
    pub fn installation_name(&self) -> &str {
        match self {
            Self::AmxEclipseAnt(c) => &c.installation_name,
            Self::StudioTools(c) => &c.installation_name,
        }
    }

    /// Parses a job file
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Config` if the YAML does not describe a step.
    pub fn from_yaml(text: &str) -> Result<Self, super::BuildError> {
        serde_yaml::from_str(text).map_err(|e| super::BuildError::Config(e.to_string()))
    }
}

impl From<AntConfig> for ToolConfig {
    fn from(config: AntConfig) -> Self {
        Self::AmxEclipseAnt(config)
    }
}

impl From<StudioToolsConfig> for ToolConfig {
    fn from(config: StudioToolsConfig) -> Self {
        Self::StudioTools(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fix_empty_and_trim() {
        assert_eq!(fix_empty_and_trim(None), None);
        assert_eq!(fix_empty_and_trim(Some("")), None);
        assert_eq!(fix_empty_and_trim(Some("   \n")), None);
        assert_eq!(
            fix_empty_and_trim(Some("  build.xml ")),
            Some("build.xml".to_string())
        );
    }

    #[test]
    fn test_builder_normalizes_empty_fields() {
        let config = AntConfig::new("tibco")
            .with_targets("")
            .with_build_file("  ")
            .with_ant_opts("-Xmx512m");
        assert_eq!(config, AntConfig::new("tibco").with_ant_opts("-Xmx512m"));
    }

    #[test]
    fn test_job_file_normalizes_empty_fields() {
        let yaml = r#"
tool: amx-eclipse-ant
installationName: tibco-5
targets: "  clean build "
buildFile: ""
properties: "   "
"#;
        let config = ToolConfig::from_yaml(yaml).unwrap();
        let ToolConfig::AmxEclipseAnt(ant) = config else {
            panic!("expected an ant step");
        };
        assert_eq!(ant.targets.as_deref(), Some("clean build"));
        assert_eq!(ant.build_file, None);
        assert_eq!(ant.properties, None);
    }

    #[test]
    fn test_studio_tools_job_file() {
        let yaml = r"
tool: studio-tools
installationName: be-5
operation: buildEar
projectDir: /projects/orders
outputArchiveFile: orders.ear
overwriteOutput: true
";
        let config = ToolConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.kind(), ToolKind::StudioTools);
        assert_eq!(config.installation_name(), "be-5");
        let ToolConfig::StudioTools(st) = config else {
            panic!("expected a studio-tools step");
        };
        assert!(st.overwrite_output);
        assert_eq!(st.extended_class_path, None);
    }

    #[test]
    fn test_invalid_job_file() {
        let err = ToolConfig::from_yaml("tool: maven\n").unwrap_err();
        assert!(matches!(err, crate::builder::BuildError::Config(_)));
    }

    proptest! {
        #[test]
        fn prop_normalization_is_idempotent(s in ".*") {
            let once = fix_empty_and_trim(Some(&s));
            let twice = fix_empty_and_trim(once.as_deref());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_blank_fields_equal_absent(ws in "[ \t\r\n]*") {
            let blank = AntConfig::new("t")
                .with_targets(&ws)
                .with_properties(&ws)
                .with_tra_property_file(&ws);
            prop_assert_eq!(blank, AntConfig::new("t"));
        }
    }
}
