//! Configuration for the manager and the npm package source

use std::path::PathBuf;
use std::time::Duration;

/// Default package tool
pub const DEFAULT_PACKAGE_TOOL: &str = "npm";

/// Configuration for [`PluginManager`](crate::PluginManager)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerConfig {
    /// Reject config overrides that fall outside a parameter's declared choices
    pub strict_choices: bool,
    /// Upper bound for a single transition, hook included. `None` waits forever.
    pub hook_timeout: Option<Duration>,
}

/// Configuration for [`NpmPackageSource`](crate::NpmPackageSource)
#[derive(Debug, Clone, PartialEq)]
pub struct NpmConfig {
    /// Package tool executable
    pub program: String,
    /// Directory the tool runs in; packages land in `node_modules/` below it
    pub working_dir: PathBuf,
}

impl Default for NpmConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PACKAGE_TOOL.to_string(),
            working_dir: plugmgr_paths::packages_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_config_default() {
        let config = ManagerConfig::default();
        assert!(!config.strict_choices);
        assert!(config.hook_timeout.is_none());
    }

    #[test]
    fn test_npm_config_default() {
        let config = NpmConfig::default();
        assert_eq!(config.program, "npm");
        assert!(config.working_dir.ends_with("plugmgr/packages"));
    }
}
