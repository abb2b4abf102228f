//! plugmgr-api - Plugin API for plugmgr
//!
//! This crate provides the types a plugin author needs: a declarative
//! [`PluginDefinition`], the per-instance [`PluginConfig`] derived from it, the
//! [`Plugin`] lifecycle state machine with its hooks, and the [`PluginContext`]
//! handle passed to every hook.
//!
//! # Example
//!
//! ```ignore
//! use plugmgr_api::{Plugin, PluginDefinition, PluginParameter, export_plugin};
//!
//! fn create() -> Plugin {
//!     Plugin::create(
//!         PluginDefinition::new("my-plugin", "me")
//!             .with_parameter("retries", PluginParameter::new("Retries", 3)),
//!     )
//!     .on_enabled(|ctx, config| async move {
//!         ctx.log_info(&config.name, "enabled");
//!         Ok(())
//!     })
//! }
//!
//! export_plugin!(create);
//! ```

pub mod config;
pub mod context;
pub mod definition;
pub mod error;
pub mod plugin;

pub use config::{ParameterOverrides, PluginConfig};
pub use context::{LogLevel, LogSink, PluginContext};
pub use definition::{ParamValue, ParameterChoice, PluginDefinition, PluginParameter};
pub use error::PluginError;
pub use plugin::{HookFuture, LifecycleState, Plugin};

/// Current plugin API version. Native plugins must match this exactly.
pub const API_VERSION: u32 = 1;

/// Symbol returning the API version a native plugin was built against
pub const API_VERSION_SYMBOL: &[u8] = b"_plugmgr_plugin_api_version";

/// Symbol creating the plugin instance a native plugin exports
pub const CREATE_SYMBOL: &[u8] = b"_plugmgr_plugin_create";

/// Export a plugin constructor for dynamic loading.
///
/// The constructor is any path to a `fn() -> Plugin`. The host takes
/// ownership of the returned plugin.
///
/// # Generated Functions
///
/// - `_plugmgr_plugin_create()`: Creates the plugin instance
/// - `_plugmgr_plugin_api_version()`: Returns the API version
#[macro_export]
macro_rules! export_plugin {
    ($constructor:path) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn _plugmgr_plugin_create() -> *mut $crate::Plugin {
            let plugin: $crate::Plugin = $constructor();
            Box::into_raw(Box::new(plugin))
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _plugmgr_plugin_api_version() -> u32 {
            $crate::API_VERSION
        }
    };
}
