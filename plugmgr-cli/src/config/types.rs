use plugmgr_api::PluginContext;
use plugmgr_core::{DEFAULT_PACKAGE_TOOL, ManagerConfig, NpmConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default host name handed to plugins
pub const DEFAULT_HOST_NAME: &str = "plugmgr";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPlugmgrConfig {
    #[serde(default)]
    pub host: RawHostConfig,

    #[serde(default)]
    pub packages: RawPackagesConfig,

    #[serde(default)]
    pub manager: RawManagerConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHostConfig {
    pub name: Option<String>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPackagesConfig {
    pub tool: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub link: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawManagerConfig {
    pub strict_choices: Option<bool>,
    pub hook_timeout_secs: Option<u64>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlugmgrConfig {
    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub packages: PackagesConfig,

    #[serde(default)]
    pub manager: ManagerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Name the host reports to plugins
    pub name: String,

    /// Root directory for plugin data
    pub data_dir: PathBuf,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_HOST_NAME.to_string(),
            data_dir: plugmgr_paths::data_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagesConfig {
    /// Package tool executable
    pub tool: String,

    /// Directory the package tool runs in
    pub working_dir: PathBuf,

    /// Acquire packages by link instead of install
    pub link: bool,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_PACKAGE_TOOL.to_string(),
            working_dir: plugmgr_paths::packages_dir(),
            link: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ManagerSection {
    /// Reject overrides outside a parameter's declared choices
    pub strict_choices: bool,

    /// Per-transition timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_timeout_secs: Option<u64>,
}

impl PlugmgrConfig {
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            strict_choices: self.manager.strict_choices,
            hook_timeout: self.manager.hook_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn npm_config(&self) -> NpmConfig {
        NpmConfig {
            program: self.packages.tool.clone(),
            working_dir: self.packages.working_dir.clone(),
        }
    }

    pub fn context(&self) -> PluginContext {
        PluginContext::new(self.host.name.clone(), self.host.data_dir.clone())
    }
}
