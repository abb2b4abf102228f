//! plugmgr-core: fetch plugins from a package registry and manage their lifecycle
//!
//! - [`PluginManager`]: caches one plugin per source identifier, sequences
//!   install/enable/disable/uninstall, and tracks what is installed
//! - [`PackageSource`]: the fetch/remove collaborator, with
//!   [`NpmPackageSource`] and [`BuiltinSource`] implementations
//! - [`ModuleLoader`]: turns a fetched package into a module, with
//!   [`StaticLoader`] and [`DylibLoader`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use plugmgr_api::PluginContext;
//! use plugmgr_core::{DylibLoader, NpmConfig, NpmPackageSource, PluginManager};
//!
//! # async fn example() -> Result<(), plugmgr_core::ManagerError> {
//! let source = NpmPackageSource::new(NpmConfig::default(), Arc::new(DylibLoader::new()));
//! let manager = PluginManager::new(
//!     PluginContext::new("my-host", "/tmp/my-host"),
//!     Arc::new(source),
//! );
//!
//! if let Some(plugin) = manager.fetch_package("hello-plugin", false).await {
//!     manager.install(&plugin, None).await?;
//!     manager.uninstall(&plugin).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod source;

pub use config::{DEFAULT_PACKAGE_TOOL, ManagerConfig, NpmConfig};
pub use error::{LoadError, ManagerError, SourceError};
pub use manager::{PluginManager, PluginSummary};
pub use source::{
    BuiltinSource, DylibLoader, ModuleExport, ModuleLoader, NpmPackageSource,
    PackageModule, PackageSource, StaticLoader,
};
