use super::types::{
    HostConfig, ManagerSection, PackagesConfig, PlugmgrConfig, RawHostConfig, RawManagerConfig,
    RawPackagesConfig, RawPlugmgrConfig,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<PlugmgrConfig> {
        let mut layers = Vec::new();
        if let Some(user_path) = Self::user_config_path() {
            layers.push(user_path);
        }
        layers.push(Self::project_config_path());
        Self::load_layers(&layers)
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "plugmgr").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with PLUGMGR_PROJECT_CONFIG_DIR
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("PLUGMGR_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".plugmgr/config.toml")
        }
    }

    /// Merge config files in order, later files overriding earlier ones.
    /// Missing files are skipped.
    pub fn load_layers(paths: &[PathBuf]) -> Result<PlugmgrConfig> {
        let mut raw = RawPlugmgrConfig::default();
        for path in paths {
            if let Some(layer) = Self::read_raw(path)? {
                raw = Self::merge_raw(raw, layer);
            }
        }
        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<Option<RawPlugmgrConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded config layer");
        Ok(Some(raw))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawPlugmgrConfig, overlay: RawPlugmgrConfig) -> RawPlugmgrConfig {
        RawPlugmgrConfig {
            host: RawHostConfig {
                name: overlay.host.name.or(base.host.name),
                data_dir: overlay.host.data_dir.or(base.host.data_dir),
            },
            packages: RawPackagesConfig {
                tool: overlay.packages.tool.or(base.packages.tool),
                working_dir: overlay.packages.working_dir.or(base.packages.working_dir),
                link: overlay.packages.link.or(base.packages.link),
            },
            manager: RawManagerConfig {
                strict_choices: overlay.manager.strict_choices.or(base.manager.strict_choices),
                hook_timeout_secs: overlay
                    .manager
                    .hook_timeout_secs
                    .or(base.manager.hook_timeout_secs),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawPlugmgrConfig) -> PlugmgrConfig {
        let host = HostConfig::default();
        let packages = PackagesConfig::default();
        PlugmgrConfig {
            host: HostConfig {
                name: raw.host.name.unwrap_or(host.name),
                data_dir: raw.host.data_dir.unwrap_or(host.data_dir),
            },
            packages: PackagesConfig {
                tool: raw.packages.tool.unwrap_or(packages.tool),
                working_dir: raw.packages.working_dir.unwrap_or(packages.working_dir),
                link: raw.packages.link.unwrap_or(packages.link),
            },
            manager: ManagerSection {
                strict_choices: raw.manager.strict_choices.unwrap_or(false),
                hook_timeout_secs: raw.manager.hook_timeout_secs,
            },
        }
    }
}
