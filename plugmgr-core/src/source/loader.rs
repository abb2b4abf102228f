//! Module loaders - from a package directory to a [`PackageModule`]

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use plugmgr_api::{API_VERSION, API_VERSION_SYMBOL, CREATE_SYMBOL, Plugin};

use super::{ModuleExport, PackageModule};
use crate::error::LoadError;

/// Loads the module of a package that is already present locally
pub trait ModuleLoader: Send + Sync {
    fn load(&self, source_id: &str, package_dir: &Path) -> Result<PackageModule, LoadError>;
}

type Factory = Arc<dyn Fn() -> ModuleExport + Send + Sync>;

/// Loader backed by in-process factories keyed by source identifier.
///
/// Each load calls the factory again, so every resolution gets a fresh
/// instance.
#[derive(Clone, Default)]
pub struct StaticLoader {
    factories: HashMap<String, Factory>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin constructor for `source_id`
    pub fn register<F>(&mut self, source_id: impl Into<String>, factory: F)
    where
        F: Fn() -> Plugin + Send + Sync + 'static,
    {
        self.register_export(source_id, move || {
            ModuleExport::Plugin(Arc::new(factory()))
        });
    }

    /// Register an arbitrary default export for `source_id`
    pub fn register_export<F>(&mut self, source_id: impl Into<String>, factory: F)
    where
        F: Fn() -> ModuleExport + Send + Sync + 'static,
    {
        self.factories.insert(source_id.into(), Arc::new(factory));
    }

    /// Builder form of [`register`](StaticLoader::register)
    pub fn with_plugin<F>(mut self, source_id: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Plugin + Send + Sync + 'static,
    {
        self.register(source_id, factory);
        self
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.factories.contains_key(source_id)
    }
}

impl fmt::Debug for StaticLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.factories.keys().collect();
        ids.sort();
        f.debug_struct("StaticLoader").field("factories", &ids).finish()
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&self, source_id: &str, _package_dir: &Path) -> Result<PackageModule, LoadError> {
        let factory = self
            .factories
            .get(source_id)
            .ok_or_else(|| LoadError::NotRegistered(source_id.to_string()))?;
        Ok(PackageModule::new(Some(factory())))
    }
}

/// Loader for native plugins built with `plugmgr_api::export_plugin!`.
///
/// Looks in the package directory, then its `lib/`, for `<name>.<ext>` or
/// `lib<name>.<ext>`, where `<name>` is the package name without scope and
/// the `lib` form uses underscores.
#[derive(Debug, Clone, Copy, Default)]
pub struct DylibLoader;

impl DylibLoader {
    pub fn new() -> Self {
        Self
    }

    fn extensions() -> &'static [&'static str] {
        if cfg!(target_os = "macos") {
            &["dylib", "so"]
        } else if cfg!(target_os = "windows") {
            &["dll"]
        } else {
            &["so"]
        }
    }

    /// Locate the plugin library for `source_id` below `package_dir`
    pub fn find_library(&self, package_dir: &Path, source_id: &str) -> Result<PathBuf, LoadError> {
        let base = source_id.rsplit('/').next().unwrap_or(source_id);
        let crate_name = base.replace('-', "_");

        for dir in [package_dir.to_path_buf(), package_dir.join("lib")] {
            for ext in Self::extensions() {
                let lib_path = dir.join(format!("{}.{}", base, ext));
                if lib_path.exists() {
                    return Ok(lib_path);
                }

                let lib_path = dir.join(format!("lib{}.{}", crate_name, ext));
                if lib_path.exists() {
                    return Ok(lib_path);
                }
            }
        }

        Err(LoadError::LibraryNotFound {
            dir: package_dir.to_path_buf(),
        })
    }
}

impl ModuleLoader for DylibLoader {
    fn load(&self, source_id: &str, package_dir: &Path) -> Result<PackageModule, LoadError> {
        let lib_path = self.find_library(package_dir, source_id)?;

        // SAFETY: the library comes from a package the caller asked to fetch.
        // It is expected to follow the export_plugin! contract.
        let library = unsafe { Library::new(&lib_path)? };

        let found = {
            // SAFETY: calling the C function generated by export_plugin!.
            let api_version_fn: libloading::Symbol<extern "C" fn() -> u32> =
                unsafe { library.get(API_VERSION_SYMBOL)? };
            api_version_fn()
        };
        if found != API_VERSION {
            return Err(LoadError::ApiVersionMismatch {
                expected: API_VERSION,
                found,
            });
        }

        let raw = {
            // SAFETY: same contract; the constructor hands over a boxed Plugin.
            let create_fn: libloading::Symbol<extern "C" fn() -> *mut Plugin> =
                unsafe { library.get(CREATE_SYMBOL)? };
            create_fn()
        };
        if raw.is_null() {
            return Err(LoadError::NullInstance);
        }

        // SAFETY: non-null pointer produced by Box::into_raw in export_plugin!.
        let plugin: Box<Plugin> = unsafe { Box::from_raw(raw) };
        tracing::debug!(
            source = %source_id,
            plugin = %plugin.name(),
            path = %lib_path.display(),
            "Loaded native plugin"
        );

        // The plugin's hooks and vtables live in the library. Every handle to
        // the plugin keeps it mapped, including ones that outlive the manager.
        plugin.retain(Arc::new(library));

        Ok(PackageModule::new(Some(ModuleExport::Plugin(Arc::from(plugin)))))
    }
}
