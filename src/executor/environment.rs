//! Layered build environment and `${VAR}` expansion
//!
//! The environment a build step sees is built from three layers:
//!
//! - the base environment (usually the agent's process environment)
//! - job-level build variables, which override the base
//! - the set of build-variable names marked sensitive
//!
//! Expansion is a pure substitution over that view. Unknown variables are
//! left literally in place, never reported as errors.
//!
//! ```rust
//! use tibco_builder::EnvironmentView;
//!
//! let env = EnvironmentView::new()
//!     .with_base_var("TIBCO_ROOT", "/opt/tibco")
//!     .with_build_variable("RELEASE", "5.2");
//! assert_eq!(env.expand("${TIBCO_ROOT}/be/${RELEASE}"), "/opt/tibco/be/5.2");
//! assert_eq!(env.expand("${UNKNOWN}"), "${UNKNOWN}");
//! ```

use super::command::MASK;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.]*)\}").unwrap()
});

/// Expands `${VAR}` placeholders using `lookup`
///
/// If a variable is not found, it remains unchanged in the output.
pub fn expand_variables<'a, F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = caps.get(1).map_or("", |m| m.as_str());
            match lookup(var_name) {
                Some(value) => value.to_string(),
                None => caps
                    .get(0)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            }
        })
        .to_string()
}

/// Replaces every occurrence of each secret in `text` with [`MASK`]
///
/// Longer secrets are replaced first so a secret containing another one
/// is hidden whole.
#[must_use]
pub fn redact(text: &str, secrets: &[String]) -> String {
    let mut ordered: Vec<&str> = secrets
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    ordered.sort_by_key(|s| std::cmp::Reverse(s.len()));
    ordered
        .into_iter()
        .fold(text.to_string(), |acc, secret| acc.replace(secret, MASK))
}

/// Key/value view of the environment a build step runs with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentView {
    base: BTreeMap<String, String>,
    build_variables: BTreeMap<String, String>,
    sensitive: BTreeSet<String>,
}

impl EnvironmentView {
    /// Creates an empty environment view
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a view whose base layer is the current process environment
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            base: std::env::vars().collect(),
            ..Self::default()
        }
    }

    /// Adds a variable to the base layer
    #[must_use]
    pub fn with_base_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.base.insert(key.into(), value.into());
        self
    }

    /// Adds a job-level build variable
    #[must_use]
    pub fn with_build_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_variables.insert(key.into(), value.into());
        self
    }

    /// Marks a variable name as sensitive
    #[must_use]
    pub fn with_sensitive(mut self, key: impl Into<String>) -> Self {
        self.sensitive.insert(key.into());
        self
    }

    /// Looks a variable up; build variables win over the base layer
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.build_variables
            .get(key)
            .or_else(|| self.base.get(key))
            .map(String::as_str)
    }

    /// Returns true if `key` must be masked in diagnostics
    #[must_use]
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.sensitive.contains(key)
    }

    /// Job-level build variables, sorted by name
    #[must_use]
    pub fn build_variables(&self) -> &BTreeMap<String, String> {
        &self.build_variables
    }

    /// Sensitive variable names
    #[must_use]
    pub fn sensitive(&self) -> &BTreeSet<String> {
        &self.sensitive
    }

    /// Current values of the sensitive variables
    #[must_use]
    pub fn sensitive_values(&self) -> Vec<String> {
        self.sensitive
            .iter()
            .filter_map(|key| self.get(key))
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Hides the values of sensitive variables inside `text`
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        redact(text, &self.sensitive_values())
    }

    /// Flattens all layers into one map
    #[must_use]
    pub fn resolved(&self) -> BTreeMap<String, String> {
        let mut merged = self.base.clone();
        merged.extend(
            self.build_variables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }

    /// Expands `${VAR}` placeholders against this view
    #[must_use]
    pub fn expand(&self, input: &str) -> String {
        expand_variables(input, |name| self.get(name))
    }

    /// Expands an optional value
    #[must_use]
    pub fn expand_opt(&self, input: Option<&str>) -> Option<String> {
        input.map(|s| self.expand(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_variables_simple() {
        let env = EnvironmentView::new().with_base_var("BUILD_NUMBER", "123");
        assert_eq!(env.expand("echo ${BUILD_NUMBER}"), "echo 123");
    }

    #[test]
    fn test_expand_variables_not_found() {
        let env = EnvironmentView::new().with_base_var("FOO", "bar");
        assert_eq!(env.expand("echo ${UNKNOWN}"), "echo ${UNKNOWN}");
    }

    #[test]
    fn test_expand_variables_mixed() {
        let env = EnvironmentView::new()
            .with_base_var("BUILD_NUMBER", "789")
            .with_base_var("FOO", "bar");
        assert_eq!(
            env.expand("${BUILD_NUMBER} and ${UNKNOWN} and ${FOO}"),
            "789 and ${UNKNOWN} and bar"
        );
    }

    #[test]
    fn test_build_variables_override_base() {
        let env = EnvironmentView::new()
            .with_base_var("TARGET", "base")
            .with_build_variable("TARGET", "job");
        assert_eq!(env.get("TARGET"), Some("job"));
        assert_eq!(env.resolved().get("TARGET").map(String::as_str), Some("job"));
    }

    #[test]
    fn test_sensitive_marker() {
        let env = EnvironmentView::new()
            .with_build_variable("PASSWORD", "s3cret")
            .with_sensitive("PASSWORD");
        assert!(env.is_sensitive("PASSWORD"));
        assert!(!env.is_sensitive("USER"));
        assert_eq!(env.get("PASSWORD"), Some("s3cret"));
    }

    #[test]
    fn test_redact_hides_expanded_secrets() {
        let env = EnvironmentView::new()
            .with_build_variable("PASSWORD", "s3cret")
            .with_build_variable("USER", "admin")
            .with_sensitive("PASSWORD")
            .with_sensitive("UNSET");
        assert_eq!(env.sensitive_values(), vec!["s3cret".to_string()]);
        let expanded = env.expand("-Dpw=${PASSWORD} -Duser=${USER}");
        assert_eq!(env.redact(&expanded), "-Dpw=****** -Duser=admin");
    }

    #[test]
    fn test_redact_longest_secret_first() {
        let secrets = vec!["abc".to_string(), "abcdef".to_string(), String::new()];
        assert_eq!(redact("x=abcdef y=abc", &secrets), "x=****** y=******");
    }

    #[test]
    fn test_expand_opt() {
        let env = EnvironmentView::new().with_base_var("WS", "/ws");
        assert_eq!(env.expand_opt(None), None);
        assert_eq!(env.expand_opt(Some("${WS}/a")), Some("/ws/a".to_string()));
    }
}
