//! # Core
//!
//! The module router and lifecycle manager. It knows nothing about any
//! specific UI technology: the surface is a [`document::Document`], assets
//! come through a [`crate::loader::AssetFetcher`], and persistence through a
//! [`storage::SessionStorage`].
//!
//! ```text
//!   fragment ──▶ Router ──▶ (RouteDescriptor, params)
//!                                   │
//!                                   ▼
//!                       ModuleLifecycleManager
//!                   ┌───────────┼──────────────┐
//!                   ▼           ▼              ▼
//!             ModuleCache    Document       AppState
//!             (bundles)    (mount point)   (handoff context,
//!                                           session storage)
//! ```
//!
//! ## Modules
//!
//! - [`route`]: route table, pattern matching, redirect policy
//! - [`cache`]: fetch-once bundle cache with shared in-flight loads
//! - [`lifecycle`]: the mount/unmount state machine
//! - [`app_state`]: handoff context, written through to session storage
//! - [`context`]: the context bag and its typed handoff shapes
//! - [`storage`]: session storage backends
//! - [`document`]: mount surface and the error view
//! - [`config`]: layered configuration
//! - [`state`] / [`action`]: shell state and its reducer

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod action;
pub mod app_state;
pub mod cache;
pub mod config;
pub mod context;
pub mod document;
pub mod lifecycle;
pub mod route;
pub mod state;
pub mod storage;

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
