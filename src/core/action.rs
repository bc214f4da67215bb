//! # Actions
//!
//! Everything that can happen in the shell becomes an `Action`.
//! User presses Enter in the address bar? That's `Action::Navigate(fragment)`.
//! A spawned navigation completes? That's `Action::NavigationFinished`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state, and returns an `Effect` describing any I/O the caller must
//! start. No side effects beyond the state itself happen here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::core::lifecycle::NavigationOutcome;
use crate::core::route::normalize_path;
use crate::core::state::{App, MAX_HISTORY};

#[derive(Debug)]
pub enum Action {
    /// Go to a fragment such as `#/topics/history`.
    Navigate(String),
    /// A spawned navigation completed; errors arrive already rendered.
    NavigationFinished {
        fragment: String,
        result: Result<NavigationOutcome, String>,
    },
    Back,
    /// Clear the handoff context and its stored copy.
    ResetContext,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Run the lifecycle navigation for this fragment.
    SpawnNavigation(String),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Navigate(raw) => {
            let fragment = format!("#{}", normalize_path(&raw));
            if !app.current_fragment.is_empty() && app.current_fragment != fragment {
                app.history.push(std::mem::take(&mut app.current_fragment));
                if app.history.len() > MAX_HISTORY {
                    app.history.remove(0);
                }
            }
            begin_navigation(app, fragment)
        }
        Action::Back => match app.history.pop() {
            Some(previous) => begin_navigation(app, previous),
            None => {
                app.status_message = String::from("No earlier page");
                Effect::None
            }
        },
        Action::NavigationFinished { fragment, result } => {
            app.pending = app.pending.saturating_sub(1);
            match result {
                Ok(NavigationOutcome::Mounted { module_id } | NavigationOutcome::Updated { module_id }) => {
                    info!("Navigation to {fragment} settled on '{module_id}'");
                    app.error = None;
                    app.status_message = app
                        .current_route
                        .as_ref()
                        .map(|r| r.name.clone())
                        .unwrap_or(module_id);
                }
                Ok(NavigationOutcome::Superseded) => {
                    debug!("Navigation to {fragment} superseded");
                }
                Err(message) => {
                    warn!("Navigation to {fragment} failed: {message}");
                    // A newer navigation still running owns the status line.
                    if !app.is_navigating() {
                        app.error = Some(message);
                        app.status_message = String::from("Navigation failed");
                    }
                }
            }
            Effect::None
        }
        Action::ResetContext => {
            app.lifecycle.app_state().reset();
            app.status_message = String::from("Context cleared");
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

fn begin_navigation(app: &mut App, fragment: String) -> Effect {
    app.current_route = app
        .router()
        .resolve_or_default(&fragment)
        .ok()
        .map(|resolution| resolution.matched.route);
    app.current_fragment = fragment.clone();
    app.pending += 1;
    app.error = None;
    app.status_message = match &app.current_route {
        Some(route) => format!("Loading {}...", route.name),
        None => String::from("Loading..."),
    };
    Effect::SpawnNavigation(fragment)
}
