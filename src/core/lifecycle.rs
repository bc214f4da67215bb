//! # Module Lifecycle
//!
//! The state machine deciding which module is mounted, and moving safely
//! between them.
//!
//! ```text
//!            navigate(B)                     init ok
//!   Idle ───────────────▶ Mounting(B) ───────────────▶ Active(B)
//!    ▲                     │    ▲                         │
//!    │  load/init failed   │    │  navigate(C), C != B    │
//!    └─────────────────────┘    └─────────────────────────┘
//!                                 destroy(B) happens here
//! ```
//!
//! ## Ordering
//!
//! Every navigation takes a generation number when it starts. The phases
//! that touch a live module instance (destroying the old one, mounting and
//! initializing the new one) run under the `transition` lock, so one
//! module's `destroy` always completes before another's `init` begins.
//! The bundle fetch runs outside the lock: a newer navigation does not
//! wait for a slow one. Each navigation re-checks its generation after
//! every suspension point and backs out without committing once a newer
//! navigation exists.
//!
//! ## Failure
//!
//! A failed load or a failed `init` leaves the surface showing the error
//! view with a link home, the lifecycle `Idle`, and nothing recorded as
//! active. The next visit to that module retries the full mount.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;

use crate::core::app_state::AppStateHandle;
use crate::core::cache::{LoadedModuleBundle, ModuleCache, ModuleLoadError};
use crate::core::document::{Document, ErrorView};
use crate::core::lock;
use crate::core::route::{NoRouteFound, RouteDescriptor, RouteParams, Router};
use crate::loader::module::{ModuleContext, ModuleInitError, RouteModule};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing mounted (boot, after teardown, or after a failure).
    Idle,
    /// A navigation owns the surface and has not committed yet.
    Mounting { module_id: String },
    Active { module_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// A new module was mounted and initialized.
    Mounted { module_id: String },
    /// Same module; parameters merged and `init` re-run, no remount.
    Updated { module_id: String },
    /// A newer navigation started first; this one committed nothing.
    Superseded,
}

#[derive(Debug)]
pub enum NavigationError {
    NoRoute(NoRouteFound),
    Load(ModuleLoadError),
    Init { module_id: String, source: ModuleInitError },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::NoRoute(e) => write!(f, "{e}"),
            NavigationError::Load(e) => write!(f, "{e}"),
            NavigationError::Init { module_id, source } => {
                write!(f, "module '{module_id}' failed to initialize: {source}")
            }
        }
    }
}

impl std::error::Error for NavigationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavigationError::NoRoute(e) => Some(e),
            NavigationError::Load(e) => Some(e),
            NavigationError::Init { source, .. } => Some(source),
        }
    }
}

/// Presentation knobs for transitions.
#[derive(Debug, Clone, Default)]
pub struct LifecycleOptions {
    /// Module whose mount is preceded by a cross-fade pause (the gallery).
    pub crossfade_module: Option<String>,
    pub crossfade: Duration,
}

/// The single mounted module.
pub struct ActiveModuleHandle {
    pub module_id: String,
    pub bundle: Arc<LoadedModuleBundle>,
    /// Navigation that mounted this instance.
    pub generation: u64,
    instance: Box<dyn RouteModule>,
}

impl ActiveModuleHandle {
    fn destroy(self) {
        info!("Destroying module '{}'", self.module_id);
        self.instance.destroy();
    }
}

/// Bookkeeping only touched under the transition lock.
#[derive(Default)]
struct Mounted {
    active: Option<ActiveModuleHandle>,
    /// Module whose stylesheet is currently injected.
    stylesheet: Option<String>,
}

pub struct ModuleLifecycleManager {
    router: Arc<Router>,
    cache: Arc<ModuleCache>,
    state: AppStateHandle,
    document: Arc<dyn Document>,
    options: LifecycleOptions,
    generation: AtomicU64,
    transition: tokio::sync::Mutex<Mounted>,
    phase: Mutex<LifecycleState>,
}

impl ModuleLifecycleManager {
    pub fn new(
        router: Arc<Router>,
        cache: Arc<ModuleCache>,
        state: AppStateHandle,
        document: Arc<dyn Document>,
        options: LifecycleOptions,
    ) -> Self {
        Self {
            router,
            cache,
            state,
            document,
            options,
            generation: AtomicU64::new(0),
            transition: tokio::sync::Mutex::new(Mounted::default()),
            phase: Mutex::new(LifecycleState::Idle),
        }
    }

    pub fn state(&self) -> LifecycleState {
        lock(&self.phase).clone()
    }

    pub fn active_module_id(&self) -> Option<String> {
        match self.state() {
            LifecycleState::Active { module_id } => Some(module_id),
            _ => None,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn app_state(&self) -> &AppStateHandle {
        &self.state
    }

    /// Resolves a fragment (redirecting unknown paths home) and navigates.
    pub async fn navigate_path(&self, path: &str) -> Result<NavigationOutcome, NavigationError> {
        let resolution = match self.router.resolve_or_default(path) {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!("{e}");
                self.unmount().await;
                self.show_error("Page not found", "That page does not exist.");
                return Err(NavigationError::NoRoute(e));
            }
        };
        let matched = resolution.matched;
        self.navigate(&matched.route, &matched.params).await
    }

    pub async fn navigate(
        &self,
        route: &RouteDescriptor,
        params: &RouteParams,
    ) -> Result<NavigationOutcome, NavigationError> {
        self.navigate_with_extra(route, params, None).await
    }

    pub async fn navigate_with_extra(
        &self,
        route: &RouteDescriptor,
        params: &RouteParams,
        extra: Option<Value>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let module_id = route.module_id.as_str();
        debug!("Navigation #{generation} to '{}' ({module_id})", route.path);

        let mut mounted = self.transition.lock().await;
        if !self.is_current(generation) {
            return Ok(self.superseded(generation));
        }

        if mounted.active.as_ref().is_some_and(|a| a.module_id == module_id) {
            return self.update_in_place(&mut mounted, generation, params, extra).await;
        }

        // Mandatory cleanup point: nothing else happens before this.
        if let Some(previous) = mounted.active.take() {
            previous.destroy();
        }
        if let Some(owner) = mounted.stylesheet.take() {
            self.document.remove_stylesheet(&owner);
        }
        self.set_phase(LifecycleState::Mounting {
            module_id: module_id.to_string(),
        });
        drop(mounted);

        if self.options.crossfade_module.as_deref() == Some(module_id)
            && !self.options.crossfade.is_zero()
        {
            tokio::time::sleep(self.options.crossfade).await;
        }

        let loaded = self.cache.get(module_id).await;

        let mut mounted = self.transition.lock().await;
        if !self.is_current(generation) {
            return Ok(self.superseded(generation));
        }

        let bundle = match loaded {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("{e}");
                self.show_error("This page could not be loaded", "Check your connection and try again.");
                self.set_phase(LifecycleState::Idle);
                return Err(NavigationError::Load(e));
            }
        };

        self.document.inject_stylesheet(module_id, &bundle.css);
        mounted.stylesheet = Some(module_id.to_string());
        self.document.set_mount_html(&bundle.html);
        self.state.set_route_params(params);

        let mut instance = bundle.exports.create();
        if let Err(e) = instance.init(self.module_context(extra)).await {
            warn!("Module '{module_id}' init failed: {e}");
            instance.destroy();
            if let Some(owner) = mounted.stylesheet.take() {
                self.document.remove_stylesheet(&owner);
            }
            if self.is_current(generation) {
                self.show_error("Something went wrong", "This page failed to start.");
                self.set_phase(LifecycleState::Idle);
            }
            return Err(NavigationError::Init {
                module_id: module_id.to_string(),
                source: e,
            });
        }

        if !self.is_current(generation) {
            // A newer navigation is queued on the lock and never saw this
            // instance, so release it here.
            instance.destroy();
            if let Some(owner) = mounted.stylesheet.take() {
                self.document.remove_stylesheet(&owner);
            }
            return Ok(self.superseded(generation));
        }

        mounted.active = Some(ActiveModuleHandle {
            module_id: module_id.to_string(),
            bundle,
            generation,
            instance,
        });
        self.set_phase(LifecycleState::Active {
            module_id: module_id.to_string(),
        });
        info!("Module '{module_id}' active");
        Ok(NavigationOutcome::Mounted {
            module_id: module_id.to_string(),
        })
    }

    /// Parameter-only navigation: merge params and re-run `init`, no remount.
    async fn update_in_place(
        &self,
        mounted: &mut Mounted,
        generation: u64,
        params: &RouteParams,
        extra: Option<Value>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let Some(mut active) = mounted.active.take() else {
            return Ok(self.superseded(generation));
        };
        let module_id = active.module_id.clone();
        debug!("Updating '{module_id}' in place");

        self.state.set_route_params(params);
        match active.instance.init(self.module_context(extra)).await {
            Ok(()) => {
                mounted.active = Some(active);
                if !self.is_current(generation) {
                    return Ok(self.superseded(generation));
                }
                self.set_phase(LifecycleState::Active {
                    module_id: module_id.clone(),
                });
                Ok(NavigationOutcome::Updated { module_id })
            }
            Err(e) => {
                warn!("Module '{module_id}' re-init failed: {e}");
                active.destroy();
                if let Some(owner) = mounted.stylesheet.take() {
                    self.document.remove_stylesheet(&owner);
                }
                self.show_error("Something went wrong", "This page failed to start.");
                self.set_phase(LifecycleState::Idle);
                Err(NavigationError::Init { module_id, source: e })
            }
        }
    }

    /// Hard teardown: destroy the active module, unmount, go `Idle`.
    pub async fn teardown(&self) {
        self.unmount().await;
        self.document.set_mount_html("");
        info!("Lifecycle torn down");
    }

    /// Supersedes any navigation in flight, destroys the active module and
    /// removes its stylesheet.
    async fn unmount(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut mounted = self.transition.lock().await;
        if let Some(active) = mounted.active.take() {
            active.destroy();
        }
        if let Some(owner) = mounted.stylesheet.take() {
            self.document.remove_stylesheet(&owner);
        }
        self.set_phase(LifecycleState::Idle);
    }

    fn module_context(&self, extra: Option<Value>) -> ModuleContext {
        ModuleContext {
            state: self.state.clone(),
            document: self.document.clone(),
            extra,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn superseded(&self, generation: u64) -> NavigationOutcome {
        debug!("Navigation #{generation} superseded");
        NavigationOutcome::Superseded
    }

    fn set_phase(&self, phase: LifecycleState) {
        *lock(&self.phase) = phase;
    }

    fn show_error(&self, title: &str, message: &str) {
        let view = ErrorView::new(title, message, &self.router.home_href());
        self.document.set_mount_html(&view.to_html());
    }
}
