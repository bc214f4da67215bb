//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::core::config::{ResolvedConfig, StorageBackend};
use crate::core::lock;
use crate::core::route::{DEFAULT_MODULE, default_routes};
use crate::core::state::App;
use crate::loader::fetcher::{AssetFetcher, EmbeddedFetcher, FetchError};
use crate::loader::module::{MarkupOnly, ModuleContext, ModuleInitError, RouteModule};
use crate::loader::registry::RegistryLoader;

/// Built-in modules, memory storage, no cross-fade.
pub fn test_config() -> ResolvedConfig {
    ResolvedConfig {
        base_url: None,
        default_module: DEFAULT_MODULE.to_string(),
        crossfade: std::time::Duration::ZERO,
        crossfade_module: None,
        probe_scripts: false,
        preload: Vec::new(),
        storage_backend: StorageBackend::Memory,
        session_id: None,
        routes: default_routes(),
    }
}

/// Shell state over [`test_config`].
pub fn test_app() -> App {
    App::from_config(&test_config()).unwrap()
}

/// Registry where every id maps to a module with no behaviour.
pub fn markup_registry(ids: &[&str]) -> RegistryLoader {
    let mut registry = RegistryLoader::new();
    for id in ids {
        registry.register(id, || Box::new(MarkupOnly) as Box<dyn RouteModule>);
    }
    registry
}

// ============================================================================
// Lifecycle probe
// ============================================================================

#[derive(Default)]
struct ProbeLog {
    events: Vec<String>,
    failing: HashSet<String>,
    created: usize,
    destroyed: usize,
}

/// Records `init:<id>` / `destroy:<id>` in call order.
#[derive(Clone, Default)]
pub struct Probe {
    log: Arc<Mutex<ProbeLog>>,
}

impl Probe {
    pub fn events(&self) -> Vec<String> {
        lock(&self.log).events.clone()
    }

    pub fn count(&self, event: &str) -> usize {
        lock(&self.log).events.iter().filter(|e| *e == event).count()
    }

    /// Instances created but not yet destroyed.
    pub fn live(&self) -> usize {
        let log = lock(&self.log);
        log.created - log.destroyed
    }

    pub fn fail_init(&self, module_id: &str) {
        lock(&self.log).failing.insert(module_id.to_string());
    }

    pub fn allow_init(&self, module_id: &str) {
        lock(&self.log).failing.remove(module_id);
    }
}

struct ProbeModule {
    module_id: String,
    probe: Probe,
}

#[async_trait]
impl RouteModule for ProbeModule {
    async fn init(&mut self, _cx: ModuleContext) -> Result<(), ModuleInitError> {
        let mut log = lock(&self.probe.log);
        log.events.push(format!("init:{}", self.module_id));
        if log.failing.contains(&self.module_id) {
            return Err(ModuleInitError(format!("{} refused to start", self.module_id)));
        }
        Ok(())
    }

    fn destroy(self: Box<Self>) {
        let mut log = lock(&self.probe.log);
        log.events.push(format!("destroy:{}", self.module_id));
        log.destroyed += 1;
    }
}

/// Registry whose modules report to `probe`.
pub fn probe_registry(probe: &Probe, ids: &[&str]) -> RegistryLoader {
    let mut registry = RegistryLoader::new();
    for id in ids {
        let probe = probe.clone();
        let module_id = id.to_string();
        registry.register(id, move || {
            lock(&probe.log).created += 1;
            Box::new(ProbeModule {
                module_id: module_id.clone(),
                probe: probe.clone(),
            }) as Box<dyn RouteModule>
        });
    }
    registry
}

// ============================================================================
// Counting / gated fetcher
// ============================================================================

/// Counts requests per path; optionally holds them until [`open`](Self::open).
pub struct CountingFetcher {
    inner: EmbeddedFetcher,
    counts: Mutex<HashMap<String, usize>>,
    gate: watch::Sender<bool>,
}

impl CountingFetcher {
    pub fn new(inner: EmbeddedFetcher) -> Self {
        Self {
            inner,
            counts: Mutex::new(HashMap::new()),
            gate: watch::Sender::new(true),
        }
    }

    pub fn gated(inner: EmbeddedFetcher) -> Self {
        let fetcher = Self::new(inner);
        fetcher.gate.send_replace(false);
        fetcher
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    pub fn count(&self, path: &str) -> usize {
        lock(&self.counts).get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl AssetFetcher for CountingFetcher {
    fn name(&self) -> &str {
        "counting"
    }

    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        *lock(&self.counts).entry(path.to_string()).or_insert(0) += 1;
        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(|_| FetchError::Network("gate dropped".to_string()))?;
        self.inner.fetch_text(path).await
    }
}
