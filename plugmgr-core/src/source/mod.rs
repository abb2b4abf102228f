//! Package sources - turn a source identifier into a loaded module
//!
//! A [`PackageSource`] makes a package's code available locally and loads it,
//! either through a persistent link or a one-shot install, and later reverses
//! that. Sources never fail loudly: resolution problems come back as `None`
//! and removal problems are logged.
//!
//! - [`NpmPackageSource`]: runs the package tool, then hands the package
//!   directory to a [`ModuleLoader`]
//! - [`BuiltinSource`]: in-process plugins, no external process
//! - [`StaticLoader`] / [`DylibLoader`]: the two module loaders

mod builtin;
mod loader;
mod npm;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use plugmgr_api::Plugin;

pub use builtin::BuiltinSource;
pub use loader::{DylibLoader, ModuleLoader, StaticLoader};
pub use npm::{NpmPackageSource, acquire_action, release_action, validate_package_id};

/// Fetch/remove collaborator used by the manager
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Make `source_id` available locally and load it.
    ///
    /// Returns `None` on any failure.
    async fn resolve(&self, source_id: &str, use_link: bool) -> Option<PackageModule>;

    /// Reverse a prior [`resolve`](PackageSource::resolve). Failures are swallowed.
    async fn remove(&self, source_id: &str, use_link: bool);
}

/// Default export of a loaded package
#[derive(Clone)]
pub enum ModuleExport {
    Plugin(Arc<Plugin>),
    /// Anything that is not a plugin
    Other { kind: String },
}

impl fmt::Debug for ModuleExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plugin(plugin) => f.debug_tuple("Plugin").field(&plugin.name()).finish(),
            Self::Other { kind } => f.debug_struct("Other").field("kind", kind).finish(),
        }
    }
}

/// A loaded package.
///
/// A plugin loaded from a native library retains that library itself (see
/// [`Plugin::retain`]), so the module carries no separate handle.
#[derive(Debug)]
pub struct PackageModule {
    pub default: Option<ModuleExport>,
}

impl PackageModule {
    pub fn new(default: Option<ModuleExport>) -> Self {
        Self { default }
    }

    /// Module whose default export is `plugin`
    pub fn plugin(plugin: Plugin) -> Self {
        Self::new(Some(ModuleExport::Plugin(Arc::new(plugin))))
    }
}
