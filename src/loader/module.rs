//! The contract every route module fulfils.
//!
//! A module's exports are a [`ModuleFactory`]; each mount creates one
//! [`RouteModule`] instance from it. The instance is initialized with the
//! shared [`ModuleContext`], may be re-initialized when only route
//! parameters change, and is destroyed exactly once: `destroy` takes the
//! instance by value, so a second call cannot be expressed.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::app_state::AppStateHandle;
use crate::core::document::Document;

/// Everything a module sees during `init`.
#[derive(Clone)]
pub struct ModuleContext {
    /// Live handle; modules read and replace the handoff context through it.
    pub state: AppStateHandle,
    /// Surface holding the module's mounted markup.
    pub document: Arc<dyn Document>,
    /// Optional caller-supplied payload for this navigation.
    pub extra: Option<Value>,
}

/// A module's `init` failed. The module is not left mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInitError(pub String);

impl fmt::Display for ModuleInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ModuleInitError {}

#[async_trait]
pub trait RouteModule: Send {
    /// Called after the module's markup is mounted, and again on a
    /// parameter-only navigation to the same module.
    async fn init(&mut self, _cx: ModuleContext) -> Result<(), ModuleInitError> {
        Ok(())
    }

    /// Releases everything the module acquired (tasks, timers, handles).
    fn destroy(self: Box<Self>) {}
}

/// Produces a fresh instance per mount.
pub trait ModuleFactory: Send + Sync {
    fn create(&self) -> Box<dyn RouteModule>;
}

impl<F> ModuleFactory for F
where
    F: Fn() -> Box<dyn RouteModule> + Send + Sync,
{
    fn create(&self) -> Box<dyn RouteModule> {
        self()
    }
}

/// The executable unit of a bundle.
pub type ModuleExports = Arc<dyn ModuleFactory>;

/// A module with neither `init` nor `destroy` behaviour (markup only).
pub struct MarkupOnly;

impl RouteModule for MarkupOnly {}
