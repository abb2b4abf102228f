//! PluginManager - fetches plugins and sequences their lifecycle

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use plugmgr_api::{
    LifecycleState, ParameterOverrides, Plugin, PluginContext, PluginError,
};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::ManagerConfig;
use crate::error::ManagerError;
use crate::source::{ModuleExport, PackageSource};

/// Snapshot of one fetched plugin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginSummary {
    pub source_id: String,
    pub name: String,
    pub state: LifecycleState,
    pub installed_using_link: bool,
}

/// Manages the fetched and installed plugins of one host context.
///
/// - At most one plugin per source identifier: repeat fetches return the
///   cached instance
/// - The installed collection keeps install order and holds each plugin once
/// - Identity is by reference (`Arc::ptr_eq`), never by content
pub struct PluginManager {
    context: PluginContext,
    source: Arc<dyn PackageSource>,
    config: ManagerConfig,
    /// Fetched plugins by source identifier
    fetched: RwLock<HashMap<String, Arc<Plugin>>>,
    /// Installed plugins in install order
    installed: RwLock<Vec<Arc<Plugin>>>,
}

impl PluginManager {
    /// Create a manager with the default configuration
    pub fn new(context: PluginContext, source: Arc<dyn PackageSource>) -> Self {
        Self::with_config(context, source, ManagerConfig::default())
    }

    pub fn with_config(
        context: PluginContext,
        source: Arc<dyn PackageSource>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            context,
            source,
            config,
            fetched: RwLock::new(HashMap::new()),
            installed: RwLock::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Resolve `source_id` into a plugin.
    ///
    /// A cached plugin is returned unchanged, and `use_link` is not re-applied
    /// to it. Returns `None` when the package does not resolve or its default
    /// export is not a plugin; nothing is cached then, so a later call tries
    /// again.
    pub async fn fetch_package(&self, source_id: &str, use_link: bool) -> Option<Arc<Plugin>> {
        if let Some(plugin) = self.fetched.read().await.get(source_id) {
            tracing::debug!(source = %source_id, "Plugin already fetched");
            return Some(plugin.clone());
        }

        let Some(module) = self.source.resolve(source_id, use_link).await else {
            tracing::warn!(source = %source_id, use_link, "Package did not resolve");
            return None;
        };

        let plugin = match module.default {
            Some(ModuleExport::Plugin(plugin)) => plugin,
            Some(ModuleExport::Other { kind }) => {
                tracing::warn!(source = %source_id, kind = %kind, "Default export is not a plugin");
                return None;
            }
            None => {
                tracing::warn!(source = %source_id, "Package has no default export");
                return None;
            }
        };

        let mut fetched = self.fetched.write().await;
        let cached = fetched.entry(source_id.to_string()).or_insert_with(|| {
            plugin.set_installed_using_link(use_link);
            plugin.attach_source(source_id);
            tracing::info!(
                source = %source_id,
                plugin = %plugin.name(),
                use_link,
                "Plugin fetched"
            );
            plugin
        });
        Some(cached.clone())
    }

    /// Plugin cached under `source_id`, without resolving
    pub async fn get(&self, source_id: &str) -> Option<Arc<Plugin>> {
        self.fetched
            .read()
            .await
            .get(source_id)
            .cloned()
    }

    /// Source identifier `plugin` was fetched under by this manager
    pub async fn package_name(&self, plugin: &Arc<Plugin>) -> Option<String> {
        let fetched = self.fetched.read().await;

        if let Some(source_id) = plugin.source_id()
            && fetched
                .get(source_id)
                .is_some_and(|cached| Arc::ptr_eq(cached, plugin))
        {
            return Some(source_id.to_string());
        }

        // Same instance cached under a second identifier.
        fetched
            .iter()
            .find(|(_, cached)| Arc::ptr_eq(cached, plugin))
            .map(|(source_id, _)| source_id.clone())
    }

    /// Apply `overrides`, install the plugin and enable it.
    ///
    /// Returns `Ok(false)` when the plugin was already installed. The plugin
    /// joins the installed collection only once its install hook succeeded.
    pub async fn install(
        &self,
        plugin: &Arc<Plugin>,
        overrides: Option<ParameterOverrides>,
    ) -> Result<bool, ManagerError> {
        if let Some(overrides) = overrides {
            self.apply_overrides(plugin, overrides)?;
        }

        if !self
            .transition(plugin, "install", plugin.install(&self.context))
            .await?
        {
            tracing::debug!(plugin = %plugin.name(), "Plugin already installed");
            return Ok(false);
        }

        {
            let mut installed = self.installed.write().await;
            if !installed.iter().any(|p| Arc::ptr_eq(p, plugin)) {
                installed.push(plugin.clone());
            }
        }
        tracing::info!(plugin = %plugin.name(), "Plugin installed");

        let enabled = self
            .transition(plugin, "enable", plugin.enable(&self.context))
            .await?;
        if enabled {
            tracing::info!(plugin = %plugin.name(), "Plugin enabled");
        }
        Ok(enabled)
    }

    /// Uninstall the plugin and remove its package.
    ///
    /// Returns `Ok(false)` for plugins this manager never fetched. A failing
    /// uninstall hook is returned as an error and leaves the bookkeeping and
    /// the package untouched.
    pub async fn uninstall(&self, plugin: &Arc<Plugin>) -> Result<bool, ManagerError> {
        let Some(source_id) = self.package_name(plugin).await else {
            tracing::debug!(plugin = %plugin.name(), "Plugin was not fetched by this manager");
            return Ok(false);
        };

        let was_installed = self
            .transition(plugin, "uninstall", plugin.uninstall(&self.context))
            .await?;
        if !was_installed {
            tracing::debug!(plugin = %plugin.name(), "Plugin was not installed");
        }

        self.installed
            .write()
            .await
            .retain(|p| !Arc::ptr_eq(p, plugin));

        let use_link = plugin.installed_using_link();
        self.source.remove(&source_id, use_link).await;
        tracing::info!(
            plugin = %plugin.name(),
            source = %source_id,
            use_link,
            "Plugin uninstalled"
        );
        Ok(true)
    }

    pub async fn enable(&self, plugin: &Arc<Plugin>) -> Result<bool, ManagerError> {
        self.transition(plugin, "enable", plugin.enable(&self.context))
            .await
    }

    pub async fn disable(&self, plugin: &Arc<Plugin>) -> Result<bool, ManagerError> {
        self.transition(plugin, "disable", plugin.disable(&self.context))
            .await
    }

    /// Installed plugins in install order
    pub async fn installed(&self) -> Vec<Arc<Plugin>> {
        self.installed.read().await.clone()
    }

    pub async fn installed_count(&self) -> usize {
        self.installed.read().await.len()
    }

    /// Source identifiers with a cached plugin, sorted
    pub async fn fetched_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self.fetched.read().await.keys().cloned().collect();
        sources.sort();
        sources
    }

    /// One summary per fetched plugin, sorted by source identifier
    pub async fn summaries(&self) -> Vec<PluginSummary> {
        let mut summaries: Vec<PluginSummary> = self
            .fetched
            .read()
            .await
            .iter()
            .map(|(source_id, plugin)| PluginSummary {
                source_id: source_id.clone(),
                name: plugin.name().to_string(),
                state: plugin.state(),
                installed_using_link: plugin.installed_using_link(),
            })
            .collect();
        summaries.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        summaries
    }

    fn apply_overrides(
        &self,
        plugin: &Plugin,
        overrides: ParameterOverrides,
    ) -> Result<(), ManagerError> {
        // Validate everything first so a bad key leaves the config as it was.
        let definition = plugin.definition();
        for (key, value) in &overrides {
            if self.config.strict_choices {
                definition.check_choice(key, value)?;
            } else if definition.parameter(key).is_none() {
                return Err(PluginError::UnknownParameter {
                    plugin: definition.name.clone(),
                    key: key.clone(),
                }
                .into());
            }
        }

        for (key, value) in overrides {
            plugin.set(&key, value)?;
        }
        Ok(())
    }

    async fn transition<F>(
        &self,
        plugin: &Plugin,
        transition: &'static str,
        fut: F,
    ) -> Result<bool, ManagerError>
    where
        F: Future<Output = Result<bool, PluginError>>,
    {
        let result = match self.config.hook_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut).await.map_err(|_| {
                tracing::warn!(
                    plugin = %plugin.name(),
                    transition,
                    ?timeout,
                    "Plugin transition timed out"
                );
                ManagerError::Timeout {
                    plugin: plugin.name().to_string(),
                    transition,
                    timeout,
                }
            })?,
            None => fut.await,
        };
        Ok(result?)
    }
}
