//! Plugin - one add-on instance and its lifecycle state machine

use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tokio::sync::Mutex;

use crate::config::PluginConfig;
use crate::context::PluginContext;
use crate::definition::{ParamValue, PluginDefinition};
use crate::error::PluginError;

/// Future returned by a lifecycle hook
pub type HookFuture = Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send>>;

type Hook = Arc<dyn Fn(PluginContext, PluginConfig) -> HookFuture + Send + Sync>;

/// Lifecycle state of a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Uninstalled,
    Disabled,
    Enabled,
}

impl LifecycleState {
    /// Anything but `Uninstalled` counts as installed
    pub fn is_installed(self) -> bool {
        self != Self::Uninstalled
    }

    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninstalled => "uninstalled",
            Self::Disabled => "disabled",
            Self::Enabled => "enabled",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Transition {
    Install,
    Uninstall,
    Enable,
    Disable,
}

impl Transition {
    fn name(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }

    // Enable is accepted straight from Uninstalled.
    fn permitted_from(self, state: LifecycleState) -> bool {
        match self {
            Self::Install => !state.is_installed(),
            Self::Uninstall => state.is_installed(),
            Self::Enable => !state.is_enabled(),
            Self::Disable => state.is_enabled(),
        }
    }

    fn target(self) -> LifecycleState {
        match self {
            Self::Install | Self::Disable => LifecycleState::Disabled,
            Self::Uninstall => LifecycleState::Uninstalled,
            Self::Enable => LifecycleState::Enabled,
        }
    }
}

struct Hooks {
    install: Hook,
    enable: Hook,
    disable: Hook,
    uninstall: Hook,
}

impl Hooks {
    fn get(&self, transition: Transition) -> &Hook {
        match transition {
            Transition::Install => &self.install,
            Transition::Uninstall => &self.uninstall,
            Transition::Enable => &self.enable,
            Transition::Disable => &self.disable,
        }
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            install: noop(),
            enable: noop(),
            disable: noop(),
            uninstall: noop(),
        }
    }
}

fn noop() -> Hook {
    Arc::new(|_: PluginContext, _: PluginConfig| -> HookFuture {
        Box::pin(async { Ok(()) })
    })
}

fn boxed<F, Fut>(hook: F) -> Hook
where
    F: Fn(PluginContext, PluginConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), PluginError>> + Send + 'static,
{
    Arc::new(move |ctx: PluginContext, config: PluginConfig| -> HookFuture {
        Box::pin(hook(ctx, config))
    })
}

struct PluginInner {
    config: PluginConfig,
    state: LifecycleState,
}

/// A single add-on: definition, mutable config, hooks and lifecycle state.
///
/// Hooks are attached with the consuming `on_*` setters before the plugin is
/// handed to a manager:
///
/// ```
/// use plugmgr_api::{Plugin, PluginDefinition, PluginParameter};
///
/// let plugin = Plugin::create(
///     PluginDefinition::new("greeter", "someone")
///         .with_parameter("greeting", PluginParameter::new("Greeting", "hello")),
/// )
/// .on_install(|ctx, config| async move {
///     let greeting: String = config.get("greeting").unwrap_or_default();
///     ctx.log_info(&config.name, &greeting);
///     Ok(())
/// });
/// ```
///
/// Transitions of one plugin are serialized: a second caller waits until the
/// first transition (hook included) has finished, then re-checks the state.
/// A failing hook leaves the state untouched and its error is returned.
/// Queries never wait for a running hook.
pub struct Plugin {
    definition: PluginDefinition,
    hooks: Hooks,
    /// Held across the hook of a transition
    transition_lock: Mutex<()>,
    /// Never held across an await
    inner: RwLock<PluginInner>,
    installed_using_link: AtomicBool,
    source_id: OnceLock<String>,
    /// Must stay the last field: dropped after `hooks`, whose code it may own.
    retained: std::sync::Mutex<Vec<Arc<dyn Any + Send + Sync>>>,
}

impl Plugin {
    /// Create a plugin with a default config and no-op hooks
    pub fn create(definition: PluginDefinition) -> Self {
        let config = PluginConfig::from_definition(&definition);
        Self {
            definition,
            hooks: Hooks::default(),
            transition_lock: Mutex::new(()),
            inner: RwLock::new(PluginInner {
                config,
                state: LifecycleState::Uninstalled,
            }),
            installed_using_link: AtomicBool::new(false),
            source_id: OnceLock::new(),
            retained: std::sync::Mutex::new(Vec::new()),
        }
    }

    // ─── Hooks ───────────────────────────────────────────────────────

    pub fn on_install<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(PluginContext, PluginConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PluginError>> + Send + 'static,
    {
        self.hooks.install = boxed(hook);
        self
    }

    pub fn on_enabled<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(PluginContext, PluginConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PluginError>> + Send + 'static,
    {
        self.hooks.enable = boxed(hook);
        self
    }

    pub fn on_disabled<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(PluginContext, PluginConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PluginError>> + Send + 'static,
    {
        self.hooks.disable = boxed(hook);
        self
    }

    pub fn on_uninstall<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(PluginContext, PluginConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PluginError>> + Send + 'static,
    {
        self.hooks.uninstall = boxed(hook);
        self
    }

    // ─── Metadata ────────────────────────────────────────────────────

    pub fn definition(&self) -> &PluginDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Whether the backing package was acquired through a persistent link
    pub fn installed_using_link(&self) -> bool {
        self.installed_using_link.load(Ordering::Acquire)
    }

    pub fn set_installed_using_link(&self, use_link: bool) {
        self.installed_using_link.store(use_link, Ordering::Release);
    }

    /// Source identifier this plugin was fetched under, if any
    pub fn source_id(&self) -> Option<&str> {
        self.source_id.get().map(String::as_str)
    }

    /// Bind the plugin to the source it was fetched under.
    ///
    /// Only the first call has an effect; returns whether it did.
    pub fn attach_source(&self, source_id: impl Into<String>) -> bool {
        self.source_id.set(source_id.into()).is_ok()
    }

    /// Keep `value` alive for as long as this plugin exists.
    ///
    /// Used by loaders to pin the code the hooks were compiled into. Retained
    /// values are dropped after everything else in the plugin.
    pub fn retain(&self, value: Arc<dyn Any + Send + Sync>) {
        self.retained
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }

    // ─── Configuration ───────────────────────────────────────────────

    /// Snapshot of the current config
    pub fn config(&self) -> PluginConfig {
        self.read().config.clone()
    }

    /// Change one parameter. Takes effect for the next hook invocation.
    pub fn set(&self, key: &str, value: impl Into<ParamValue>) -> Result<(), PluginError> {
        self.write().config.set(key, value)?;
        Ok(())
    }

    // ─── State ───────────────────────────────────────────────────────

    pub fn state(&self) -> LifecycleState {
        self.read().state
    }

    pub fn is_enabled(&self) -> bool {
        self.state().is_enabled()
    }

    pub fn is_installed(&self) -> bool {
        self.state().is_installed()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, PluginInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, PluginInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Transitions ─────────────────────────────────────────────────

    /// Uninstalled → Disabled. `Ok(false)` if already installed.
    pub async fn install(&self, context: &PluginContext) -> Result<bool, PluginError> {
        self.transition(context, Transition::Install).await
    }

    /// Disabled/Enabled → Uninstalled. `Ok(false)` if not installed.
    pub async fn uninstall(&self, context: &PluginContext) -> Result<bool, PluginError> {
        self.transition(context, Transition::Uninstall).await
    }

    /// Any other state → Enabled. `Ok(false)` if already enabled.
    pub async fn enable(&self, context: &PluginContext) -> Result<bool, PluginError> {
        self.transition(context, Transition::Enable).await
    }

    /// Enabled → Disabled. `Ok(false)` if not enabled.
    pub async fn disable(&self, context: &PluginContext) -> Result<bool, PluginError> {
        self.transition(context, Transition::Disable).await
    }

    async fn transition(
        &self,
        context: &PluginContext,
        transition: Transition,
    ) -> Result<bool, PluginError> {
        let _guard = self.transition_lock.lock().await;

        let (state, config) = {
            let inner = self.read();
            (inner.state, inner.config.clone())
        };
        if !transition.permitted_from(state) {
            tracing::debug!(
                plugin = %self.name(),
                transition = transition.name(),
                state = %state,
                "Transition not permitted, skipping"
            );
            return Ok(false);
        }

        let hook = self.hooks.get(transition);
        if let Err(e) = hook(context.clone(), config).await {
            tracing::warn!(
                plugin = %self.name(),
                transition = transition.name(),
                error = %e,
                "Lifecycle hook failed"
            );
            return Err(e);
        }

        self.write().state = transition.target();
        tracing::debug!(
            plugin = %self.name(),
            from = %state,
            to = %transition.target(),
            "Plugin transitioned"
        );
        Ok(true)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.definition.name)
            .field("source_id", &self.source_id.get())
            .field("installed_using_link", &self.installed_using_link())
            .finish_non_exhaustive()
    }
}
