//! Error types for plugmgr-core

use std::path::PathBuf;
use std::time::Duration;

use plugmgr_api::PluginError;
use thiserror::Error;

/// Errors surfaced by [`PluginManager`](crate::PluginManager) operations.
///
/// Resolution failures and unknown plugins are not errors: they come back as
/// `None` / `Ok(false)`.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// A hook failed or a config change was rejected
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// A transition did not finish within the configured hook timeout
    #[error("Plugin '{plugin}' {transition} timed out after {timeout:?}")]
    Timeout {
        plugin: String,
        transition: &'static str,
        timeout: Duration,
    },
}

/// Errors turning a fetched package into a module
#[derive(Error, Debug)]
pub enum LoadError {
    /// No in-process factory registered for this package
    #[error("Package '{0}' is not registered")]
    NotRegistered(String),

    /// Plugin library not found in the package directory
    #[error("Plugin library not found in {dir}")]
    LibraryNotFound { dir: PathBuf },

    /// API version mismatch between plugmgr and plugin
    #[error("API version mismatch: plugmgr expects {expected}, plugin has {found}")]
    ApiVersionMismatch { expected: u32, found: u32 },

    /// Failed to load dynamic library
    #[error("Failed to load plugin library: {0}")]
    Library(#[from] libloading::Error),

    /// The library's constructor returned nothing
    #[error("Plugin library returned a null instance")]
    NullInstance,
}

/// Errors inside a package source. Logged and swallowed by the source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Invalid package id: {0:?}")]
    InvalidPackageId(String),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{program} {action} {package}` failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        action: &'static str,
        package: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_error_conversion() {
        let err: ManagerError = PluginError::hook("enable", "boom").into();
        assert!(matches!(err, ManagerError::Plugin(_)));
        assert!(err.to_string().contains("enable hook failed: boom"));
    }

    #[test]
    fn test_timeout_display() {
        let err = ManagerError::Timeout {
            plugin: "slow-plugin".to_string(),
            transition: "install",
            timeout: Duration::from_secs(5),
        };
        let msg = err.to_string();
        assert!(msg.contains("slow-plugin"));
        assert!(msg.contains("install"));
        assert!(msg.contains("5"));
    }

    #[test]
    fn test_api_version_mismatch_display() {
        let err = LoadError::ApiVersionMismatch {
            expected: 1,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("1"));
        assert!(msg.contains("2"));
    }

    #[test]
    fn test_command_failed_display() {
        let err = SourceError::CommandFailed {
            program: "npm".into(),
            action: "install",
            package: "left-pad".into(),
            status: "exit status: 1".into(),
            stderr: "E404".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("npm install left-pad"));
        assert!(msg.contains("E404"));
    }

    #[test]
    fn test_load_error_converts_into_source_error() {
        let err = SourceError::InvalidPackageId("--prefix=/x".into());
        assert_eq!(err.to_string(), "Invalid package id: \"--prefix=/x\"");

        let err: SourceError = LoadError::NotRegistered("pkg".into()).into();
        assert!(matches!(err, SourceError::Load(_)));
        assert_eq!(err.to_string(), "Package 'pkg' is not registered");
    }
}
