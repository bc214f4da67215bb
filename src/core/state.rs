//! # Shell State
//!
//! Business state for the quizshell shell. This module contains domain
//! logic only, no TUI-specific types. Presentation state lives in the `tui`
//! module.
//!
//! ```text
//! App
//! ├── lifecycle: Arc<ModuleLifecycleManager>  // router, cache, app state
//! ├── cache: Arc<ModuleCache>                 // for boot-time preloading
//! ├── document: Arc<HeadlessDocument>         // what the shell renders
//! ├── current_fragment: String                // last requested fragment
//! ├── current_route: Option<Arc<RouteDescriptor>>
//! ├── history: Vec<String>                    // fragments for Back
//! ├── pending: usize                          // navigations in flight
//! ├── status_message: String                  // title bar text
//! ├── error: Option<String>                   // last navigation error
//! └── session_id: Option<String>              // file-backed session, if any
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use log::{info, warn};

use crate::core::app_state::AppState;
use crate::core::cache::ModuleCache;
use crate::core::config::{ResolvedConfig, StorageBackend};
use crate::core::document::HeadlessDocument;
use crate::core::lifecycle::{LifecycleOptions, ModuleLifecycleManager};
use crate::core::route::{RouteDescriptor, RouteTableError, Router};
use crate::core::storage::{FileStorage, MemoryStorage, SessionStorage, new_session_id, sessions_dir};
use crate::loader::{AssetFetcher, HttpFetcher, builtin_assets, builtin_registry};

/// Oldest entries are dropped past this many.
pub const MAX_HISTORY: usize = 50;

pub struct App {
    pub lifecycle: Arc<ModuleLifecycleManager>,
    pub cache: Arc<ModuleCache>,
    pub document: Arc<HeadlessDocument>,
    pub current_fragment: String,
    pub current_route: Option<Arc<RouteDescriptor>>,
    pub history: Vec<String>,
    pub pending: usize,
    pub status_message: String,
    pub error: Option<String>,
    pub session_id: Option<String>,
    pub preload: Vec<String>,
}

impl App {
    pub fn new(lifecycle: Arc<ModuleLifecycleManager>, cache: Arc<ModuleCache>, document: Arc<HeadlessDocument>) -> Self {
        Self {
            lifecycle,
            cache,
            document,
            current_fragment: String::new(),
            current_route: None,
            history: Vec::new(),
            pending: 0,
            status_message: String::from("Welcome to quizshell!"),
            error: None,
            session_id: None,
            preload: Vec::new(),
        }
    }

    /// Wires the full stack (storage, assets, registry, router, lifecycle)
    /// from a resolved config.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, RouteTableError> {
        let (storage, session_id) = open_storage(config);
        let state = AppState::handle(storage);

        let fetcher: Arc<dyn AssetFetcher> = match &config.base_url {
            Some(base_url) => {
                info!("Serving modules from {base_url}");
                Arc::new(HttpFetcher::new(base_url.clone()))
            }
            None => {
                info!("Serving built-in modules");
                Arc::new(builtin_assets())
            }
        };
        let registry = if config.probe_scripts {
            builtin_registry().with_script_probe(fetcher.clone())
        } else {
            builtin_registry()
        };

        let router = Arc::new(Router::with_default(config.routes.clone(), &config.default_module)?);
        let cache = Arc::new(ModuleCache::new(fetcher, Arc::new(registry)));
        let document = Arc::new(HeadlessDocument::new());
        let lifecycle = Arc::new(ModuleLifecycleManager::new(
            router,
            cache.clone(),
            state,
            document.clone(),
            LifecycleOptions {
                crossfade_module: config.crossfade_module.clone(),
                crossfade: config.crossfade,
            },
        ));

        let mut app = Self::new(lifecycle, cache, document);
        app.session_id = session_id;
        app.preload = config.preload.clone();
        Ok(app)
    }

    pub fn router(&self) -> &Router {
        self.lifecycle.router()
    }

    pub fn is_navigating(&self) -> bool {
        self.pending > 0
    }

    /// Warms the bundle cache with the configured modules.
    pub async fn preload(&self) {
        if !self.preload.is_empty() {
            self.cache.preload(&self.preload).await;
        }
    }
}

fn open_storage(config: &ResolvedConfig) -> (Arc<dyn SessionStorage>, Option<String>) {
    if config.storage_backend == StorageBackend::Memory {
        return (Arc::new(MemoryStorage::new()), None);
    }

    let session_id = config.session_id.clone().unwrap_or_else(new_session_id);
    match sessions_dir().and_then(|dir| FileStorage::open(&dir, &session_id)) {
        Ok(storage) => {
            info!("Session {session_id} at {}", storage.path().display());
            (Arc::new(storage), Some(session_id))
        }
        Err(e) => {
            warn!("Session storage unavailable, keeping state in memory: {e}");
            (Arc::new(MemoryStorage::new()), None)
        }
    }
}
