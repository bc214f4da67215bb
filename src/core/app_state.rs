//! # Application State
//!
//! Single source of truth for data handed from one module to the next.
//!
//! ```text
//! AppState
//! ├── context: Mutex<Context>        // in-memory, authoritative
//! └── storage: Arc<dyn SessionStorage>  // mirror, written on every mutation
//! ```
//!
//! Every mutation is written through to session storage before the call
//! returns. A failed write is logged and swallowed: the in-memory context
//! stays authoritative for the rest of the process.
//!
//! Modules receive an [`AppStateHandle`] in `init` and may read or replace
//! the context through it.

use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::core::context::{Context, PARAMS_KEY};
use crate::core::lock;
use crate::core::route::RouteParams;
use crate::core::storage::SessionStorage;

/// Session storage key holding the serialized context.
pub const STORAGE_KEY: &str = "appContext";

/// Shared handle given to modules and the lifecycle manager.
pub type AppStateHandle = Arc<AppState>;

pub struct AppState {
    context: Mutex<Context>,
    storage: Arc<dyn SessionStorage>,
}

impl AppState {
    /// Creates the state, hydrating from `storage` when a saved context exists.
    ///
    /// A corrupt saved context is discarded; boot never fails on storage.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let context = hydrate(storage.as_ref());
        Self {
            context: Mutex::new(context),
            storage,
        }
    }

    pub fn handle(storage: Arc<dyn SessionStorage>) -> AppStateHandle {
        Arc::new(Self::new(storage))
    }

    /// Snapshot of the current context.
    pub fn context(&self) -> Context {
        lock(&self.context).clone()
    }

    /// Replaces the context.
    ///
    /// `params` carries over from the previous context unless `value`
    /// supplies its own.
    pub fn set_context(&self, mut value: Context) {
        let mut current = lock(&self.context);
        if !value.contains_key(PARAMS_KEY)
            && let Some(params) = current.get(PARAMS_KEY).cloned()
        {
            value.insert(PARAMS_KEY, params);
        }
        *current = value;
        self.persist(&current);
    }

    /// Merges route parameters into the context, keeping every other field.
    pub fn set_route_params(&self, params: &RouteParams) {
        let mut current = lock(&self.context);
        current.set_params(params);
        self.persist(&current);
    }

    /// Read-modify-write in one step; the result is persisted.
    pub fn update<R>(&self, f: impl FnOnce(&mut Context) -> R) -> R {
        let mut current = lock(&self.context);
        let out = f(&mut current);
        self.persist(&current);
        out
    }

    /// Clears the context and its stored copy (logout/reset flows).
    pub fn reset(&self) {
        let mut current = lock(&self.context);
        *current = Context::new();
        if let Err(e) = self.storage.remove_item(STORAGE_KEY) {
            warn!("Failed to clear stored context: {e}");
        }
    }

    fn persist(&self, context: &Context) {
        let json = match serde_json::to_string(context) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize context: {e}");
                return;
            }
        };
        match self.storage.set_item(STORAGE_KEY, &json) {
            Ok(()) => debug!("Persisted context ({} bytes)", json.len()),
            Err(e) => warn!("Context kept in memory only: {e}"),
        }
    }
}

fn hydrate(storage: &dyn SessionStorage) -> Context {
    let json = match storage.get_item(STORAGE_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return Context::new(),
        Err(e) => {
            warn!("Could not read stored context, starting empty: {e}");
            return Context::new();
        }
    };

    match serde_json::from_str::<Context>(&json) {
        Ok(context) => {
            debug!("Hydrated context with {} key(s)", context.as_map().len());
            context
        }
        Err(e) => {
            warn!("Discarding corrupt stored context: {e}");
            if let Err(e) = storage.remove_item(STORAGE_KEY) {
                warn!("Failed to remove corrupt context: {e}");
            }
            Context::new()
        }
    }
}
