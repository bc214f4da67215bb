//! # Module Cache
//!
//! Fetch-once, reuse-forever storage for module bundles.
//!
//! ```text
//! get("quiz")
//!   ├── Ready(bundle)    → resolves on first poll, no I/O
//!   ├── Loading(shared)  → join the in-flight request
//!   └── (absent)         → start html ∥ css ∥ exports, store as Loading
//!                              ├── Ok  → promote to Ready
//!                              └── Err → remove entry (next call retries)
//! ```
//!
//! The in-flight future itself is cached, not just its result, so two
//! navigations racing to the same module share a single set of requests.
//! There is no eviction: the route table is small and fixed.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};

use crate::core::lock;
use crate::loader::fetcher::{AssetFetcher, FetchError, asset_path};
use crate::loader::module::ModuleExports;
use crate::loader::registry::ModuleLoader;

/// The fetched (HTML, CSS, executable) triple for a module.
pub struct LoadedModuleBundle {
    pub module_id: String,
    pub html: String,
    pub css: String,
    pub exports: ModuleExports,
}

impl fmt::Debug for LoadedModuleBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModuleBundle")
            .field("module_id", &self.module_id)
            .field("html", &self.html.len())
            .field("css", &self.css.len())
            .finish_non_exhaustive()
    }
}

/// Any part of a bundle failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLoadError {
    pub module_id: String,
    pub cause: FetchError,
}

impl fmt::Display for ModuleLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load module '{}': {}", self.module_id, self.cause)
    }
}

impl std::error::Error for ModuleLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

pub type BundleResult = Result<Arc<LoadedModuleBundle>, ModuleLoadError>;

type InFlight = Shared<BoxFuture<'static, BundleResult>>;

enum Slot {
    Ready(Arc<LoadedModuleBundle>),
    Loading(InFlight),
}

type Slots = Arc<Mutex<HashMap<String, Slot>>>;

pub struct ModuleCache {
    fetcher: Arc<dyn AssetFetcher>,
    loader: Arc<dyn ModuleLoader>,
    slots: Slots,
}

impl ModuleCache {
    pub fn new(fetcher: Arc<dyn AssetFetcher>, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            fetcher,
            loader,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the bundle for `module_id`, fetching it at most once.
    pub async fn get(&self, module_id: &str) -> BundleResult {
        let in_flight = {
            let mut slots = lock(&self.slots);
            match slots.get(module_id) {
                Some(Slot::Ready(bundle)) => return Ok(bundle.clone()),
                Some(Slot::Loading(in_flight)) => {
                    debug!("Joining in-flight load of '{module_id}'");
                    in_flight.clone()
                }
                None => {
                    let in_flight = self.start_load(module_id);
                    slots.insert(module_id.to_string(), Slot::Loading(in_flight.clone()));
                    in_flight
                }
            }
        };
        in_flight.await
    }

    fn start_load(&self, module_id: &str) -> InFlight {
        let fetcher = self.fetcher.clone();
        let loader = self.loader.clone();
        let slots = self.slots.clone();
        let module_id = module_id.to_string();

        info!("Loading bundle '{}' via {}", module_id, fetcher.name());

        async move {
            let html_path = asset_path(&module_id, "html");
            let css_path = asset_path(&module_id, "css");
            let result = futures::try_join!(
                fetcher.fetch_text(&html_path),
                fetcher.fetch_text(&css_path),
                loader.load(&module_id),
            );

            let mut slots = lock(&slots);
            match result {
                Ok((html, css, exports)) => {
                    let bundle = Arc::new(LoadedModuleBundle {
                        module_id: module_id.clone(),
                        html,
                        css,
                        exports,
                    });
                    slots.insert(module_id.clone(), Slot::Ready(bundle.clone()));
                    debug!("Cached bundle '{module_id}'");
                    Ok(bundle)
                }
                Err(cause) => {
                    slots.remove(&module_id);
                    warn!("Bundle '{module_id}' failed to load: {cause}");
                    Err(ModuleLoadError { module_id, cause })
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Warms the cache for `module_ids` concurrently. Failures are logged only.
    pub async fn preload(&self, module_ids: &[String]) {
        let loads = module_ids.iter().map(|id| self.get(id));
        for result in futures::future::join_all(loads).await {
            if let Err(e) = result {
                warn!("Preload skipped: {e}");
            }
        }
    }

    /// True once the bundle has finished loading successfully.
    pub fn contains(&self, module_id: &str) -> bool {
        matches!(lock(&self.slots).get(module_id), Some(Slot::Ready(_)))
    }

    pub fn is_loading(&self, module_id: &str) -> bool {
        matches!(lock(&self.slots).get(module_id), Some(Slot::Loading(_)))
    }

    /// Number of bundles loaded so far.
    pub fn len(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|s| matches!(s, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
