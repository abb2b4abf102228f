//! In-process package source

use std::path::Path;

use async_trait::async_trait;

use super::{ModuleLoader, PackageModule, PackageSource, StaticLoader};

/// Resolves plugins compiled into the host. Nothing is fetched or removed.
#[derive(Debug, Clone, Default)]
pub struct BuiltinSource {
    loader: StaticLoader,
}

impl BuiltinSource {
    pub fn new(loader: StaticLoader) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &StaticLoader {
        &self.loader
    }
}

#[async_trait]
impl PackageSource for BuiltinSource {
    async fn resolve(&self, source_id: &str, _use_link: bool) -> Option<PackageModule> {
        match self.loader.load(source_id, Path::new("")) {
            Ok(module) => Some(module),
            Err(e) => {
                tracing::debug!(source = %source_id, error = %e, "No builtin plugin");
                None
            }
        }
    }

    async fn remove(&self, source_id: &str, _use_link: bool) {
        tracing::debug!(source = %source_id, "Builtin plugins have nothing to remove");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugmgr_api::{Plugin, PluginDefinition};

    #[tokio::test]
    async fn test_resolve_registered_plugin() {
        let source = BuiltinSource::new(
            StaticLoader::new()
                .with_plugin("greeter", || Plugin::create(PluginDefinition::new("greeter", "t"))),
        );
        assert!(source.loader().contains("greeter"));
        assert!(source.resolve("greeter", false).await.is_some());
        assert!(source.resolve("other", false).await.is_none());
        source.remove("greeter", false).await;
    }
}
