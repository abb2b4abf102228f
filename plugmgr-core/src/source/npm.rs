//! Package source backed by the npm CLI

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use super::{ModuleLoader, PackageModule, PackageSource};
use crate::config::NpmConfig;
use crate::error::SourceError;

/// Tool subcommand that acquires a package
pub fn acquire_action(use_link: bool) -> &'static str {
    if use_link { "link" } else { "install" }
}

/// Tool subcommand that reverses [`acquire_action`]
pub fn release_action(use_link: bool) -> &'static str {
    if use_link { "unlink" } else { "rm" }
}

/// Reject ids the package tool would read as a flag, or that would leave
/// `node_modules` once joined onto it.
pub fn validate_package_id(source_id: &str) -> Result<(), SourceError> {
    let invalid = source_id.is_empty()
        || source_id.starts_with('-')
        || source_id.starts_with('/')
        || source_id.contains("..")
        || source_id.contains(['\\', '\0'])
        || source_id.split('/').any(|segment| segment.is_empty() || segment == ".");
    if invalid {
        return Err(SourceError::InvalidPackageId(source_id.to_string()));
    }
    Ok(())
}

/// Runs `npm install|link -- <id>` in the configured working directory, then
/// loads `node_modules/<id>` with its [`ModuleLoader`].
///
/// The tool is executed directly, never through a shell.
pub struct NpmPackageSource {
    config: NpmConfig,
    loader: Arc<dyn ModuleLoader>,
}

impl NpmPackageSource {
    pub fn new(config: NpmConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &NpmConfig {
        &self.config
    }

    /// Where the tool places `source_id`
    pub fn package_dir(&self, source_id: &str) -> PathBuf {
        self.config.working_dir.join("node_modules").join(source_id)
    }

    async fn run(&self, action: &'static str, source_id: &str) -> Result<(), SourceError> {
        validate_package_id(source_id)?;
        tracing::debug!(
            program = %self.config.program,
            action,
            source = %source_id,
            dir = %self.config.working_dir.display(),
            "Running package tool"
        );

        let output = Command::new(&self.config.program)
            .arg(action)
            .arg("--")
            .arg(source_id)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| SourceError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::CommandFailed {
                program: self.config.program.clone(),
                action,
                package: source_id.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn acquire(&self, source_id: &str, use_link: bool) -> Result<PackageModule, SourceError> {
        validate_package_id(source_id)?;
        tokio::fs::create_dir_all(&self.config.working_dir).await?;
        self.run(acquire_action(use_link), source_id).await?;
        Ok(self.loader.load(source_id, &self.package_dir(source_id))?)
    }
}

#[async_trait]
impl PackageSource for NpmPackageSource {
    async fn resolve(&self, source_id: &str, use_link: bool) -> Option<PackageModule> {
        match self.acquire(source_id, use_link).await {
            Ok(module) => Some(module),
            Err(e) => {
                tracing::warn!(source = %source_id, use_link, error = %e, "Failed to resolve package");
                None
            }
        }
    }

    async fn remove(&self, source_id: &str, use_link: bool) {
        if let Err(e) = self.run(release_action(use_link), source_id).await {
            tracing::warn!(source = %source_id, use_link, error = %e, "Failed to remove package");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ModuleExport, StaticLoader};
    use plugmgr_api::{Plugin, PluginDefinition};
    use tempfile::TempDir;

    fn source(program: &str, dir: &TempDir) -> NpmPackageSource {
        let loader = StaticLoader::new()
            .with_plugin("demo", || Plugin::create(PluginDefinition::new("demo", "tests")));
        NpmPackageSource::new(
            NpmConfig {
                program: program.to_string(),
                working_dir: dir.path().join("work"),
            },
            Arc::new(loader),
        )
    }

    #[test]
    fn test_actions() {
        assert_eq!(acquire_action(false), "install");
        assert_eq!(acquire_action(true), "link");
        assert_eq!(release_action(false), "rm");
        assert_eq!(release_action(true), "unlink");
    }

    #[test]
    fn test_package_dir() {
        let dir = TempDir::new().unwrap();
        let npm = source("npm", &dir);
        assert_eq!(
            npm.package_dir("@acme/widget"),
            dir.path().join("work/node_modules/@acme/widget")
        );
    }

    #[test]
    fn test_validate_package_id() {
        for id in ["demo", "hello-plugin", "@acme/widget", "widget.js"] {
            assert!(validate_package_id(id).is_ok(), "{id} should be accepted");
        }
        for id in [
            "",
            "--prefix=/x",
            "-g",
            "../../elsewhere",
            "@acme/../../x",
            "/abs/path",
            "a//b",
            "./demo",
            "a\\b",
        ] {
            assert!(
                matches!(validate_package_id(id), Err(SourceError::InvalidPackageId(_))),
                "{id:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_id_never_reaches_tool() {
        let dir = TempDir::new().unwrap();
        let npm = source("true", &dir);

        let err = npm.acquire("../../elsewhere", false).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidPackageId(_)));
        assert!(!dir.path().join("work").exists());
        assert!(npm.resolve("--prefix=/x", false).await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_id_follows_end_of_options_marker() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let script = dir.path().join("fake-npm");
        std::fs::write(&script, "#!/bin/sh\necho \"$@\" >> args.txt\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let npm = source(script.to_str().unwrap(), &dir);
        npm.resolve("demo", true).await.unwrap();
        npm.remove("demo", false).await;

        let args = std::fs::read_to_string(dir.path().join("work/args.txt")).unwrap();
        assert_eq!(args, "link -- demo\nrm -- demo\n");
    }

    #[tokio::test]
    async fn test_missing_program_resolves_to_none() {
        let dir = TempDir::new().unwrap();
        let npm = source("plugmgr-definitely-not-a-program", &dir);
        assert!(npm.resolve("demo", false).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_swallows_spawn_failure() {
        let dir = TempDir::new().unwrap();
        let npm = source("plugmgr-definitely-not-a-program", &dir);
        npm.remove("demo", true).await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_resolves_to_none() {
        let dir = TempDir::new().unwrap();
        let npm = source("false", &dir);
        assert!(npm.resolve("demo", false).await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_tool_hands_off_to_loader() {
        let dir = TempDir::new().unwrap();
        let npm = source("true", &dir);

        let module = npm.resolve("demo", true).await.unwrap();
        assert!(matches!(module.default, Some(ModuleExport::Plugin(_))));
        assert!(dir.path().join("work").is_dir());

        assert!(npm.resolve("unregistered", false).await.is_none());
    }
}
