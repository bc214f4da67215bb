//! Module loaders: how a module id becomes executable exports.
//!
//! Rust has no runtime code loading worth reaching for here, so modules are
//! compiled in and looked up by id. The [`RegistryLoader`] can additionally
//! probe for the bundle's script asset, so a deployment missing
//! `modules/<id>/<id>.js` fails the mount the same way a missing HTML or
//! CSS file does.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::fetcher::{AssetFetcher, FetchError, asset_path};
use super::module::{ModuleExports, ModuleFactory};

#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Resolves the executable unit for `module_id`.
    async fn load(&self, module_id: &str) -> Result<ModuleExports, FetchError>;
}

#[derive(Default)]
pub struct RegistryLoader {
    factories: HashMap<String, ModuleExports>,
    script_probe: Option<Arc<dyn AssetFetcher>>,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module_id: &str, factory: impl ModuleFactory + 'static) {
        self.factories.insert(module_id.to_string(), Arc::new(factory));
    }

    pub fn with(mut self, module_id: &str, factory: impl ModuleFactory + 'static) -> Self {
        self.register(module_id, factory);
        self
    }

    /// Requires `modules/<id>/<id>.js` to be fetchable before handing out exports.
    pub fn with_script_probe(mut self, fetcher: Arc<dyn AssetFetcher>) -> Self {
        self.script_probe = Some(fetcher);
        self
    }

    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

#[async_trait]
impl ModuleLoader for RegistryLoader {
    async fn load(&self, module_id: &str) -> Result<ModuleExports, FetchError> {
        if let Some(fetcher) = &self.script_probe {
            let script = fetcher.fetch_text(&asset_path(module_id, "js")).await?;
            debug!("Script probe for '{module_id}' ok ({} bytes)", script.len());
        }

        self.factories
            .get(module_id)
            .cloned()
            .ok_or_else(|| FetchError::UnknownModule(module_id.to_string()))
    }
}
