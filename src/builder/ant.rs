//! AMX Eclipse Ant builder
//!
//! Composes `amx_eclipse_ant` invocations:
//!
//! ```text
//! <exe> --propFile <tra> [-file <name>] [-data <workspace>]
//!       -D<build variables>... -D<properties>... <targets>...
//! ```
//!
//! The build script is looked up under the module root first and the
//! workspace root second. The process runs in the directory holding it.

use super::config::AntConfig;
use super::errors::BuildError;
use super::plugins::{InstallationLookup, TibcoBuilder, default_property_file};
use super::types::ToolKind;
use crate::executor::{ArgumentList, BuildContext, CommandLine, tokenize};
use std::path::{Path, PathBuf};

/// Build script used when neither the job nor the targets name one
pub const DEFAULT_BUILD_FILE: &str = "build.xml";

/// Environment variable carrying JVM options for Ant
pub const ANT_OPTS: &str = "ANT_OPTS";

const BUILD_FILE_FLAGS: [&str; 3] = ["-f", "-file", "-buildfile"];

/// Returns the token following the first build-file flag in `targets`
fn build_file_from_targets(targets: &[String]) -> Option<&str> {
    targets
        .windows(2)
        .find(|pair| BUILD_FILE_FLAGS.contains(&pair[0].as_str()))
        .map(|pair| pair[1].as_str())
}

/// Builder for one AMX Eclipse Ant step
#[derive(Debug, Clone)]
pub struct AmxEclipseAntBuilder {
    config: AntConfig,
}

impl AmxEclipseAntBuilder {
    /// Creates a builder for `config`
    #[must_use]
    pub fn new(config: AntConfig) -> Self {
        Self { config }
    }

    /// Step configuration
    #[must_use]
    pub fn config(&self) -> &AntConfig {
        &self.config
    }

    /// Finds the build script under the module root, then the workspace root
    fn locate_build_file(&self, ctx: &BuildContext, relative: &str) -> Result<PathBuf, BuildError> {
        let first = ctx.module_root.join(relative);
        if first.exists() {
            return Ok(first);
        }
        let second = ctx.workspace_root.join(relative);
        if second.exists() {
            tracing::debug!(path = %second.display(), "Build file found under workspace root");
            return Ok(second);
        }
        Err(BuildError::BuildFileNotFound { path: first })
    }
}

impl TibcoBuilder for AmxEclipseAntBuilder {
    fn kind(&self) -> ToolKind {
        ToolKind::AmxEclipseAnt
    }

    fn installation_name(&self) -> &str {
        &self.config.installation_name
    }

    fn compose(
        &self,
        ctx: &BuildContext,
        installations: &InstallationLookup<'_>,
    ) -> Result<CommandLine, BuildError> {
        let installation =
            installations.resolve(&self.config.installation_name, ToolKind::AmxEclipseAnt, ctx)?;

        let env = &ctx.env;
        let workspace = env.expand_opt(self.config.business_studio_workspace.as_deref());
        let build_file = env.expand_opt(self.config.build_file.as_deref());
        let targets_text = env.expand_opt(self.config.targets.as_deref()).unwrap_or_default();
        let targets = tokenize(&targets_text);
        let property_file = env
            .expand_opt(self.config.tra_property_file.as_deref())
            .unwrap_or_else(|| default_property_file(&installation.executable, ctx.platform));
        let ant_opts = env.expand_opt(self.config.ant_opts.as_deref());

        let from_targets = match build_file {
            Some(_) => None,
            None => build_file_from_targets(&targets),
        };
        let relative = build_file
            .as_deref()
            .or(from_targets)
            .unwrap_or(DEFAULT_BUILD_FILE);
        let build_path = self.locate_build_file(ctx, relative)?;

        let mut args = ArgumentList::new();
        args.add(installation.executable.to_string_lossy())
            .add_pair("--propFile", property_file);
        if from_targets.is_none() {
            let name = build_path
                .file_name()
                .map_or_else(|| relative.to_string(), |n| n.to_string_lossy().into_owned());
            args.add_pair("-file", name);
        }
        if let Some(workspace) = workspace {
            args.add_pair("-data", workspace);
        }
        args.add_key_value_pairs("-D", env.build_variables(), env.sensitive())
            .add_key_value_pairs_from_properties("-D", self.config.properties.as_deref(), env);
        args.add_tokenized(&targets_text);

        let args = args.redacted(env);
        let args = if ctx.platform.is_unix() {
            args
        } else {
            args.to_windows_command().quote_empty_properties()
        };

        let working_dir = build_path
            .parent()
            .map_or_else(|| ctx.module_root.clone(), Path::to_path_buf);

        let mut cmd = CommandLine::new(ToolKind::AmxEclipseAnt, args, working_dir)
            .with_env(env.resolved())
            .with_secrets(env.sensitive_values());
        for (key, value) in installation.env_overlay() {
            cmd = cmd.with_overlay(key, value);
        }
        if let Some(opts) = ant_opts {
            cmd = cmd.with_overlay(ANT_OPTS, opts);
        }

        tracing::debug!(command = %cmd, "Composed AMX Eclipse Ant command");
        Ok(cmd.with_installation(installation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FailureReason, Platform};
    use crate::executor::EnvironmentView;
    use crate::infrastructure::{Installation, InstallationStore, SearchPathResolver, TIBCO_HOME};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        home: TempDir,
        workspace: TempDir,
        store: InstallationStore,
        resolver: SearchPathResolver,
    }

    impl Fixture {
        fn new() -> Self {
            let home = TempDir::new().unwrap();
            fs::create_dir_all(home.path().join("bin")).unwrap();
            fs::write(home.path().join("bin/amx_eclipse_ant"), "").unwrap();
            fs::write(home.path().join("bin/amx_eclipse_ant.exe"), "").unwrap();

            let workspace = TempDir::new().unwrap();
            fs::create_dir_all(workspace.path().join("module")).unwrap();
            fs::write(workspace.path().join("module/build.xml"), "<project/>").unwrap();

            let store = InstallationStore::in_memory(vec![Installation::new(
                "tibco",
                home.path().to_str().unwrap(),
            )]);
            Self {
                home,
                workspace,
                store,
                resolver: SearchPathResolver::default(),
            }
        }

        fn lookup(&self) -> InstallationLookup<'_> {
            InstallationLookup::new(&self.store, &self.resolver)
        }

        fn ctx(&self) -> BuildContext {
            BuildContext::new(self.workspace.path())
                .with_module_root(self.workspace.path().join("module"))
                .with_platform(Platform::Unix)
        }

        fn exe(&self) -> String {
            self.home.path().join("bin/amx_eclipse_ant").to_string_lossy().into_owned()
        }

        fn compose(&self, config: AntConfig, ctx: &BuildContext) -> Result<CommandLine, BuildError> {
            AmxEclipseAntBuilder::new(config).compose(ctx, &self.lookup())
        }
    }

    #[test]
    fn test_argument_order() {
        let fx = Fixture::new();
        let ctx = fx.ctx().with_env(
            EnvironmentView::new()
                .with_build_variable("BUILD_NUMBER", "42")
                .with_build_variable("PASSWORD", "s3cret")
                .with_sensitive("PASSWORD"),
        );
        let config = AntConfig::new("tibco")
            .with_targets("clean build -Dfoo=bar")
            .with_properties("release=1.0");

        let cmd = fx.compose(config, &ctx).unwrap();
        let exe = fx.exe();
        assert_eq!(
            cmd.args().to_vec(),
            vec![
                exe.clone(),
                "--propFile".to_string(),
                format!("{exe}.tra"),
                "-file".to_string(),
                "build.xml".to_string(),
                "-DBUILD_NUMBER=42".to_string(),
                "-DPASSWORD=s3cret".to_string(),
                "-Drelease=1.0".to_string(),
                "clean".to_string(),
                "build".to_string(),
                "-Dfoo=bar".to_string(),
            ]
        );
        assert!(cmd.to_string().contains("-DPASSWORD=******"));
        assert!(!cmd.to_string().contains("s3cret"));
        assert_eq!(cmd.working_dir(), fx.workspace.path().join("module"));
    }

    #[test]
    fn test_targets_keep_windows_paths() {
        let fx = Fixture::new();
        let config = AntConfig::new("tibco").with_targets("-Dout=C:\\out\\dir package");

        let args = fx.compose(config, &fx.ctx()).unwrap().args().to_vec();
        assert_eq!(&args[args.len() - 2..], ["-Dout=C:\\out\\dir", "package"]);
    }

    #[test]
    fn test_build_file_flag_keeps_windows_path() {
        let targets = tokenize("clean -f C:\\b\\build.xml package");
        assert_eq!(build_file_from_targets(&targets), Some("C:\\b\\build.xml"));
    }

    #[test]
    fn test_sensitive_value_in_targets_is_masked() {
        let fx = Fixture::new();
        let ctx = fx.ctx().with_env(
            EnvironmentView::new()
                .with_build_variable("PASSWORD", "s3cret")
                .with_sensitive("PASSWORD"),
        );
        let config = AntConfig::new("tibco")
            .with_targets("deploy -Dpw=${PASSWORD}")
            .with_ant_opts("-Dpw=${PASSWORD}");

        let cmd = fx.compose(config, &ctx).unwrap();
        assert!(cmd.args().to_vec().contains(&"-Dpw=s3cret".to_string()));
        assert!(cmd.to_string().ends_with("deploy -Dpw=******"));
        assert!(!cmd.to_string().contains("s3cret"));
        assert_eq!(
            cmd.masked_overlay().get(ANT_OPTS).map(String::as_str),
            Some("-Dpw=******")
        );
        assert_eq!(
            cmd.overlay().get(ANT_OPTS).map(String::as_str),
            Some("-Dpw=s3cret")
        );
    }

    #[test]
    fn test_workspace_and_explicit_property_file() {
        let fx = Fixture::new();
        let ctx = fx.ctx().with_env(EnvironmentView::new().with_base_var("WS", "/studio/ws"));
        let config = AntConfig::new("tibco")
            .with_business_studio_workspace("${WS}")
            .with_tra_property_file("/etc/custom.tra");

        let args = fx.compose(config, &ctx).unwrap().args().to_vec();
        assert_eq!(&args[1..3], ["--propFile", "/etc/custom.tra"]);
        assert_eq!(&args[5..7], ["-data", "/studio/ws"]);
    }

    #[test]
    fn test_unknown_installation_skips_build_file_search() {
        let fx = Fixture::new();
        let ctx = BuildContext::new("/does/not/exist");
        let err = fx
            .compose(AntConfig::new("other").with_build_file("missing.xml"), &ctx)
            .unwrap_err();
        assert_eq!(err.reason(), FailureReason::ExecutableNotFound);
    }

    #[test]
    fn test_build_file_falls_back_to_workspace_root() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.workspace.path().join("scripts")).unwrap();
        fs::write(fx.workspace.path().join("scripts/deploy.xml"), "").unwrap();

        let cmd = fx
            .compose(AntConfig::new("tibco").with_build_file("scripts/deploy.xml"), &fx.ctx())
            .unwrap();
        assert_eq!(cmd.working_dir(), fx.workspace.path().join("scripts"));
        assert_eq!(&cmd.args().to_vec()[3..5], ["-file", "deploy.xml"]);
    }

    #[test]
    fn test_missing_build_file_reports_first_candidate() {
        let fx = Fixture::new();
        let err = fx
            .compose(AntConfig::new("tibco").with_build_file("nowhere.xml"), &fx.ctx())
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::BuildFileNotFound {
                path: fx.workspace.path().join("module/nowhere.xml")
            }
        );
    }

    #[test]
    fn test_build_file_flag_in_targets() {
        let fx = Fixture::new();
        fs::write(fx.workspace.path().join("other.xml"), "").unwrap();

        let cmd = fx
            .compose(AntConfig::new("tibco").with_targets("-f other.xml package"), &fx.ctx())
            .unwrap();
        let args = cmd.args().to_vec();
        assert!(!args.contains(&"-file".to_string()));
        assert_eq!(&args[3..], ["-f", "other.xml", "package"]);
        assert_eq!(cmd.working_dir(), fx.workspace.path());

        let err = fx
            .compose(AntConfig::new("tibco").with_targets("-buildfile gone.xml"), &fx.ctx())
            .unwrap_err();
        assert_eq!(err.reason(), FailureReason::BuildFileNotFound);
    }

    #[test]
    fn test_empty_fields_compose_like_absent_ones() {
        let fx = Fixture::new();
        let blank = AntConfig::new("tibco")
            .with_targets(" ")
            .with_build_file("")
            .with_properties("\n")
            .with_ant_opts("");
        let a = fx.compose(blank, &fx.ctx()).unwrap();
        let b = fx.compose(AntConfig::new("tibco"), &fx.ctx()).unwrap();
        assert_eq!(a.args(), b.args());
        assert_eq!(a.overlay(), b.overlay());
    }

    #[test]
    fn test_environment_overlay() {
        let fx = Fixture::new();
        let ctx = fx.ctx().with_env(EnvironmentView::new().with_base_var("HEAP", "1g"));
        let cmd = fx
            .compose(AntConfig::new("tibco").with_ant_opts("-Xmx${HEAP}"), &ctx)
            .unwrap();

        assert_eq!(cmd.overlay().get(ANT_OPTS).map(String::as_str), Some("-Xmx1g"));
        assert_eq!(
            cmd.overlay().get(TIBCO_HOME).map(String::as_str),
            fx.home.path().to_str()
        );
        assert_eq!(cmd.environment().get("HEAP").map(String::as_str), Some("1g"));
    }

    #[test]
    fn test_windows_requotes_empty_property() {
        let fx = Fixture::new();
        let config = AntConfig::new("tibco").with_targets("-Dfoo= build");

        let unix = fx.compose(config.clone(), &fx.ctx()).unwrap();
        assert!(unix.args().to_vec().contains(&"-Dfoo=".to_string()));

        let ctx = fx.ctx().with_platform(Platform::Windows);
        let windows = fx.compose(config, &ctx).unwrap().args().to_vec();
        assert_eq!(&windows[..2], ["cmd.exe", "/C"]);
        assert_eq!(windows.len(), 3);
        assert!(windows[2].contains("amx_eclipse_ant.tra"));
        assert!(windows[2].contains(" -Dfoo=\"\" build && exit %%ERRORLEVEL%%"));
    }

    #[cfg(unix)]
    fn install_script(fx: &Fixture, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = fx.home.path().join("bin/amx_eclipse_ant");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_perform_runs_tool_in_build_directory() {
        use crate::executor::LocalLauncher;

        let fx = Fixture::new();
        install_script(
            &fx,
            "echo; echo compile:; echo \"home=$TIBCO_HOME\"; echo BUILD SUCCESSFUL",
        );
        let builder = AmxEclipseAntBuilder::new(AntConfig::new("tibco").with_targets("compile"));

        let mut log = Vec::new();
        let outcome = builder.perform(&fx.ctx(), &fx.lookup(), &LocalLauncher, &mut log);
        let log = String::from_utf8(log).unwrap();

        assert_eq!(outcome, crate::builder::ExecutionOutcome::Success);
        assert!(log.contains(&format!("home={}", fx.home.path().display())));
        assert!(log.contains("\x1b[8mha:amx-eclipse-ant:target\x1b[0mcompile:"));
        assert!(log.contains("\x1b[8mha:amx-eclipse-ant:outcome\x1b[0mBUILD SUCCESSFUL"));
    }

    #[cfg(unix)]
    #[test]
    fn test_perform_reports_non_zero_exit() {
        use crate::executor::LocalLauncher;

        let fx = Fixture::new();
        install_script(&fx, "echo BUILD FAILED; exit 1");
        let builder = AmxEclipseAntBuilder::new(AntConfig::new("tibco"));

        let mut log = Vec::new();
        let outcome = builder.perform(&fx.ctx(), &fx.lookup(), &LocalLauncher, &mut log);
        assert_eq!(outcome.reason(), Some(FailureReason::NonZeroExit));
    }

    #[test]
    fn test_perform_writes_composition_failure() {
        let fx = Fixture::new();
        let builder = AmxEclipseAntBuilder::new(AntConfig::new("tibco").with_build_file("gone.xml"));

        let mut log = Vec::new();
        let outcome = builder.perform(&fx.ctx(), &fx.lookup(), &crate::executor::LocalLauncher, &mut log);
        assert_eq!(outcome.reason(), Some(FailureReason::BuildFileNotFound));
        assert!(String::from_utf8(log).unwrap().starts_with("FATAL: Unable to find build script at "));
    }
}
