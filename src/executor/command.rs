//! Argument lists and composed command lines
//!
//! An [`ArgumentList`] keeps two renderings of every argument side by side:
//! the value handed to the process and the value echoed to the build log.
//! They only differ for sensitive `-D` pairs, which are echoed as
//! `-Dkey=******`.

use super::environment::{EnvironmentView, redact};
use crate::builder::ToolKind;
use crate::infrastructure::ResolvedInstallation;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Replacement text for sensitive values
pub const MASK: &str = "******";

static EMPTY_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"( )(-D[^" ]+)= "#).unwrap()
});

/// One argument plus its log rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    value: String,
    masked: Option<String>,
}

impl Argument {
    /// An argument that is echoed as-is
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            masked: None,
        }
    }

    /// An argument whose log rendering differs from its value
    #[must_use]
    pub fn masked(value: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            masked: Some(display.into()),
        }
    }

    /// Value passed to the process
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Value shown in logs
    #[must_use]
    pub fn display(&self) -> &str {
        self.masked.as_deref().unwrap_or(&self.value)
    }

    /// Returns true if the log rendering hides part of the value
    #[must_use]
    pub fn is_masked(&self) -> bool {
        self.masked.is_some()
    }
}

/// Ordered list of process arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentList {
    args: Vec<Argument>,
}

impl ArgumentList {
    /// Creates an empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one argument
    pub fn add(&mut self, value: impl Into<String>) -> &mut Self {
        self.args.push(Argument::plain(value));
        self
    }

    /// Appends a flag followed by its value
    pub fn add_pair(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.add(flag).add(value)
    }

    /// Appends `<prefix><key>=<value>`, masked in logs when `mask` is set
    pub fn add_key_value_pair(&mut self, prefix: &str, key: &str, value: &str, mask: bool) -> &mut Self {
        let arg = format!("{prefix}{key}={value}");
        if mask {
            self.args
                .push(Argument::masked(arg, format!("{prefix}{key}={MASK}")));
        } else {
            self.args.push(Argument::plain(arg));
        }
        self
    }

    /// Appends one `<prefix><key>=<value>` per entry, in key order
    pub fn add_key_value_pairs(
        &mut self,
        prefix: &str,
        pairs: &BTreeMap<String, String>,
        sensitive: &BTreeSet<String>,
    ) -> &mut Self {
        for (key, value) in pairs {
            self.add_key_value_pair(prefix, key, value, sensitive.contains(key));
        }
        self
    }

    /// Parses `properties` and appends one pair per property
    ///
    /// Keys and values are `${VAR}`-expanded after parsing, so backslashes
    /// in expanded values survive untouched.
    pub fn add_key_value_pairs_from_properties(
        &mut self,
        prefix: &str,
        properties: Option<&str>,
        env: &EnvironmentView,
    ) -> &mut Self {
        let Some(text) = properties else {
            return self;
        };
        for (key, value) in parse_properties(text) {
            let key = env.expand(&key);
            let value = env.expand(&value);
            let mask = env.is_sensitive(&key);
            self.add_key_value_pair(prefix, &key, &value, mask);
        }
        self
    }

    /// Appends every token of `text`, see [`tokenize`]
    pub fn add_tokenized(&mut self, text: &str) -> &mut Self {
        for token in tokenize(text) {
            self.add(token);
        }
        self
    }

    /// Masks sensitive values that reached arguments through expansion
    ///
    /// Arguments that already carry a masked rendering are left alone.
    #[must_use]
    pub fn redacted(mut self, env: &EnvironmentView) -> Self {
        let secrets = env.sensitive_values();
        if secrets.is_empty() {
            return self;
        }
        for arg in self.args.iter_mut().filter(|a| a.masked.is_none()) {
            let shown = redact(&arg.value, &secrets);
            if shown != arg.value {
                arg.masked = Some(shown);
            }
        }
        self
    }

    /// Number of arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns true if there are no arguments
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Iterates over the arguments
    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.args.iter()
    }

    /// Values passed to the process
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.args.iter().map(|a| a.value.clone()).collect()
    }

    /// Values shown in logs
    #[must_use]
    pub fn to_masked_vec(&self) -> Vec<String> {
        self.args.iter().map(|a| a.display().to_string()).collect()
    }

    /// Log rendering on one line, quoting arguments that contain blanks
    #[must_use]
    pub fn to_masked_string(&self) -> String {
        self.args
            .iter()
            .map(|a| {
                let shown = a.display();
                if shown.is_empty() || shown.contains(char::is_whitespace) {
                    format!("\"{shown}\"")
                } else {
                    shown.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Wraps the list into `cmd.exe /C "<args> && exit %%ERRORLEVEL%%"`
    ///
    /// `cmd.exe` is needed so that batch wrappers report the right exit
    /// code. The doubled `%%` delays expansion until after the tool ran.
    #[must_use]
    pub fn to_windows_command(&self) -> Self {
        let mut line = String::new();
        let mut masked_line = String::new();
        for arg in &self.args {
            line.push_str(&quote_windows_arg(&arg.value));
            line.push(' ');
            masked_line.push_str(&quote_windows_arg(arg.display()));
            masked_line.push(' ');
        }
        line.push_str("&& exit %%ERRORLEVEL%%");
        masked_line.push_str("&& exit %%ERRORLEVEL%%");

        let mut out = Self::new();
        out.add("cmd.exe").add("/C");
        if self.args.iter().any(Argument::is_masked) {
            out.args.push(Argument::masked(
                format!("\"{line}\""),
                format!("\"{masked_line}\""),
            ));
        } else {
            out.add(format!("\"{line}\""));
        }
        out
    }

    /// Turns `-Dkey= ` into `-Dkey="" ` inside the last argument
    ///
    /// Only the last argument is rewritten. After [`to_windows_command`]
    /// the whole tool invocation lives in that one argument.
    ///
    /// [`to_windows_command`]: ArgumentList::to_windows_command
    #[must_use]
    pub fn quote_empty_properties(mut self) -> Self {
        if let Some(last) = self.args.last_mut() {
            last.value = quote_empty_properties(&last.value);
            if let Some(masked) = last.masked.as_mut() {
                *masked = quote_empty_properties(masked);
            }
        }
        self
    }
}

fn quote_empty_properties(line: &str) -> String {
    // Adjacent matches share a separating blank, so repeat until stable.
    let mut current = line.to_string();
    loop {
        let next = EMPTY_PROPERTY
            .replace_all(&current, "${1}${2}=\"\" ")
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn quote_windows_arg(arg: &str) -> String {
    fn start_quoting(buf: &mut String, arg: &str, at: usize) -> bool {
        buf.push('"');
        buf.push_str(&arg[..at]);
        true
    }

    let mut buf = String::new();
    let mut quoted = false;
    let mut percent = false;
    for (i, ch) in arg.char_indices() {
        let mut c = ch;
        if !quoted && matches!(c, ' ' | '*' | '?' | ',' | ';') {
            quoted = start_quoting(&mut buf, arg, i);
        } else if matches!(c, '^' | '&' | '<' | '>' | '|') {
            if !quoted {
                quoted = start_quoting(&mut buf, arg, i);
            }
        } else if c == '"' {
            if !quoted {
                quoted = start_quoting(&mut buf, arg, i);
            }
            buf.push('"');
        } else if percent && c.is_ascii_alphabetic() {
            if !quoted {
                quoted = start_quoting(&mut buf, arg, i);
            }
            buf.push('"');
            buf.push(c);
            c = '"';
        }
        percent = c == '%';
        if quoted {
            buf.push(c);
        }
    }
    if quoted {
        buf.push('"');
    } else {
        buf.push_str(arg);
    }
    buf
}

/// Splits `text` into words, honouring quotes
///
/// Single or double quotes group blanks into one word and are removed.
/// Backslashes are kept literally, so Windows paths pass through
/// untouched; only `\"` inside double quotes stands for a quote. Tabs and
/// newlines count as blanks. Unbalanced quotes fall back to plain
/// whitespace splitting.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    split_quoted(text).unwrap_or_else(|| text.split_whitespace().map(ToString::to_string).collect())
}

fn split_quoted(text: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        q if q == c => break,
                        '\\' if c == '"' && chars.peek() == Some(&'"') => {
                            chars.next();
                            word.push('"');
                        }
                        other => word.push(other),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Some(words)
}

/// Parses `java.util.Properties` style text into ordered pairs
///
/// Later duplicates replace the value of the first occurrence in place.
#[must_use]
pub fn parse_properties(text: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut lines = text.lines();

    while let Some(first) = lines.next() {
        let mut logical = first.trim_start().to_string();
        if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
            continue;
        }
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_property(&logical);
        if let Some(slot) = pairs.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            pairs.push((key, value));
        }
    }
    pairs
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_property(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    key.push(unescape(escaped));
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if chars.peek().is_some_and(|c| *c == '=' || *c == ':') {
                    chars.next();
                }
                break;
            }
            c => key.push(c),
        }
    }

    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }

    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(unescape(escaped));
            }
        } else {
            value.push(c);
        }
    }
    (key, value)
}

fn unescape(c: char) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\u{c}',
        other => other,
    }
}

/// A fully composed invocation, ready for the launcher
#[derive(Debug, Clone)]
pub struct CommandLine {
    tool: ToolKind,
    args: ArgumentList,
    env: BTreeMap<String, String>,
    overlay: BTreeMap<String, String>,
    working_dir: PathBuf,
    installation: Option<ResolvedInstallation>,
    secrets: Vec<String>,
}

impl CommandLine {
    /// Creates a command line with an empty environment
    #[must_use]
    pub fn new(tool: ToolKind, args: ArgumentList, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            args,
            env: BTreeMap::new(),
            overlay: BTreeMap::new(),
            working_dir: working_dir.into(),
            installation: None,
            secrets: Vec::new(),
        }
    }

    /// Sets the base environment of the process
    #[must_use]
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Adds a variable on top of the base environment
    #[must_use]
    pub fn with_overlay(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overlay.insert(key.into(), value.into());
        self
    }

    /// Records sensitive values to hide in the overlay rendering
    #[must_use]
    pub fn with_secrets(mut self, secrets: Vec<String>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Records the installation the command was composed from
    #[must_use]
    pub fn with_installation(mut self, installation: ResolvedInstallation) -> Self {
        self.installation = Some(installation);
        self
    }

    /// Tool kind this command drives
    #[must_use]
    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Argument list, executable first
    #[must_use]
    pub fn args(&self) -> &ArgumentList {
        &self.args
    }

    /// Variables added on top of the base environment
    #[must_use]
    pub fn overlay(&self) -> &BTreeMap<String, String> {
        &self.overlay
    }

    /// Overlay as shown in logs, sensitive values masked
    #[must_use]
    pub fn masked_overlay(&self) -> BTreeMap<String, String> {
        self.overlay
            .iter()
            .map(|(k, v)| (k.clone(), redact(v, &self.secrets)))
            .collect()
    }

    /// Complete process environment: base plus overlay
    #[must_use]
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        env.extend(self.overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }

    /// Working directory of the process
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Installation the command was composed from, if any
    #[must_use]
    pub fn installation(&self) -> Option<&ResolvedInstallation> {
        self.installation.as_ref()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] $ {}",
            self.working_dir.display(),
            self.args.to_masked_string()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_value_pairs_masking() {
        let pairs = BTreeMap::from([
            ("PASSWORD".to_string(), "s3cret".to_string()),
            ("USER".to_string(), "admin".to_string()),
        ]);
        let sensitive = BTreeSet::from(["PASSWORD".to_string()]);

        let mut args = ArgumentList::new();
        args.add_key_value_pairs("-D", &pairs, &sensitive);

        assert_eq!(args.to_vec(), vec!["-DPASSWORD=s3cret", "-DUSER=admin"]);
        assert_eq!(
            args.to_masked_vec(),
            vec!["-DPASSWORD=******", "-DUSER=admin"]
        );
    }

    #[test]
    fn test_tokenize_handles_newlines_and_quotes() {
        assert_eq!(
            tokenize("clean\n\tbuild  \"-Dmsg=hello world\""),
            vec!["clean", "build", "-Dmsg=hello world"]
        );
    }

    #[test]
    fn test_tokenize_keeps_backslashes() {
        assert_eq!(
            tokenize("-Dpath=C:\\tibco\\lib build"),
            vec!["-Dpath=C:\\tibco\\lib", "build"]
        );
        assert_eq!(
            tokenize("-f C:\\b\\build.xml \"-Dout=C:\\Program Files\\out\""),
            vec!["-f", "C:\\b\\build.xml", "-Dout=C:\\Program Files\\out"]
        );
    }

    #[test]
    fn test_tokenize_quote_forms() {
        assert_eq!(
            tokenize("-Dmsg='a b' -Dq=\"say \\\"hi\\\"\" \"\""),
            vec!["-Dmsg=a b", "-Dq=say \"hi\"", ""]
        );
    }

    #[test]
    fn test_add_tokenized_then_redacted() {
        let env = EnvironmentView::new()
            .with_build_variable("PASSWORD", "s3cret")
            .with_sensitive("PASSWORD");
        let mut args = ArgumentList::new();
        args.add_key_value_pair("-D", "PASSWORD", "s3cret", true)
            .add_tokenized(&env.expand("deploy -Dpw=${PASSWORD}"));
        let args = args.redacted(&env);

        assert_eq!(args.to_vec(), vec!["-DPASSWORD=s3cret", "deploy", "-Dpw=s3cret"]);
        assert_eq!(
            args.to_masked_vec(),
            vec!["-DPASSWORD=******", "deploy", "-Dpw=******"]
        );
    }

    #[test]
    fn test_tokenize_unbalanced_quote_falls_back() {
        assert_eq!(tokenize("clean \"build"), vec!["clean", "\"build"]);
    }

    #[test]
    fn test_parse_properties() {
        let text = "# comment\n! other comment\n\nfoo=bar\nspaced : value with spaces\nplain value\nempty=\n";
        assert_eq!(
            parse_properties(text),
            vec![
                ("foo".to_string(), "bar".to_string()),
                ("spaced".to_string(), "value with spaces".to_string()),
                ("plain".to_string(), "value".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_parse_properties_continuation_and_override() {
        let text = "path=a\\\n    b\nkey=first\nkey=second\nwin=C:\\\\tibco";
        assert_eq!(
            parse_properties(text),
            vec![
                ("path".to_string(), "ab".to_string()),
                ("key".to_string(), "second".to_string()),
                ("win".to_string(), "C:\\tibco".to_string()),
            ]
        );
    }

    #[test]
    fn test_properties_are_expanded_and_masked() {
        let env = EnvironmentView::new()
            .with_build_variable("TOKEN", "abc")
            .with_sensitive("api.token");
        let mut args = ArgumentList::new();
        args.add_key_value_pairs_from_properties(
            "-D",
            Some("api.token=${TOKEN}\nhome=${MISSING}"),
            &env,
        );
        assert_eq!(args.to_vec(), vec!["-Dapi.token=abc", "-Dhome=${MISSING}"]);
        assert_eq!(
            args.to_masked_vec(),
            vec!["-Dapi.token=******", "-Dhome=${MISSING}"]
        );
    }

    #[test]
    fn test_quote_windows_arg() {
        assert_eq!(quote_windows_arg("plain"), "plain");
        assert_eq!(quote_windows_arg("C:\\Program Files\\x"), "\"C:\\Program Files\\x\"");
        assert_eq!(quote_windows_arg("a&b"), "\"a&b\"");
        assert_eq!(quote_windows_arg("say\"hi"), "\"say\"\"hi\"");
        assert_eq!(quote_windows_arg("%PATH%"), "\"%\"P\"ATH%\"");
    }

    #[test]
    fn test_to_windows_command() {
        let mut args = ArgumentList::new();
        args.add("C:\\tibco\\amx_eclipse_ant.exe").add("-Dfoo=").add("build");
        let windows = args.to_windows_command();
        assert_eq!(
            windows.to_vec(),
            vec![
                "cmd.exe",
                "/C",
                "\"C:\\tibco\\amx_eclipse_ant.exe -Dfoo= build && exit %%ERRORLEVEL%%\""
            ]
        );
    }

    #[test]
    fn test_quote_empty_properties_last_token_only() {
        let mut args = ArgumentList::new();
        args.add("-Dfirst= ").add("x -Da= -Db= -Dc=set && exit");
        let fixed = args.quote_empty_properties();
        assert_eq!(
            fixed.to_vec(),
            vec!["-Dfirst= ", "x -Da=\"\" -Db=\"\" -Dc=set && exit"]
        );
    }

    #[test]
    fn test_windows_command_keeps_masking() {
        let mut args = ArgumentList::new();
        args.add("tool.exe")
            .add_key_value_pair("-D", "PASSWORD", "s3cret", true)
            .add_key_value_pair("-D", "EMPTY", "", false);
        let windows = args.to_windows_command().quote_empty_properties();

        let real = windows.to_vec();
        let shown = windows.to_masked_vec();
        assert!(real[2].contains("-DPASSWORD=s3cret"));
        assert!(real[2].contains("-DEMPTY=\"\" "));
        assert!(!shown[2].contains("s3cret"));
        assert!(shown[2].contains("-DPASSWORD=******"));
        assert!(shown[2].contains("-DEMPTY=\"\" "));
    }

    #[test]
    fn test_command_line_display_is_masked() {
        let mut args = ArgumentList::new();
        args.add("/opt/tibco/bin/amx_eclipse_ant")
            .add_key_value_pair("-D", "PASSWORD", "s3cret", true);
        let cmd = CommandLine::new(ToolKind::AmxEclipseAnt, args, "/ws")
            .with_env(BTreeMap::from([("A".to_string(), "1".to_string())]))
            .with_overlay("TIBCO_HOME", "/opt/tibco");

        assert_eq!(
            cmd.to_string(),
            "[/ws] $ /opt/tibco/bin/amx_eclipse_ant -DPASSWORD=******"
        );
        assert_eq!(cmd.environment().len(), 2);
    }

    #[test]
    fn test_masked_overlay() {
        let cmd = CommandLine::new(ToolKind::AmxEclipseAnt, ArgumentList::new(), "/ws")
            .with_overlay("ANT_OPTS", "-Dpw=s3cret -Xmx1g")
            .with_secrets(vec!["s3cret".to_string()]);
        assert_eq!(
            cmd.masked_overlay().get("ANT_OPTS").map(String::as_str),
            Some("-Dpw=****** -Xmx1g")
        );
        assert_eq!(
            cmd.environment().get("ANT_OPTS").map(String::as_str),
            Some("-Dpw=s3cret -Xmx1g")
        );
    }
}
