//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the shell,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Event Loop
//!
//! ```text
//! keys ──▶ TuiEvent ──▶ Action ──▶ update() ──▶ Effect::SpawnNavigation
//!                                    ▲                     │
//!                                    │            tokio::spawn(navigate_path)
//!                                    └── mpsc ◀── Action::NavigationFinished
//! ```
//!
//! Navigations run as spawned tasks so a slow bundle fetch never blocks
//! input; the lifecycle manager discards stale ones. Modules may also
//! change the document on their own (timers), so the loop redraws whenever
//! the document revision moves.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::sync::mpsc;
use std::time::Duration;

use crate::core::action::{Action, Effect, update};
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{AddressBar, AddressEvent, nav_entries};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub address_bar: AddressBar,
    /// Highlighted sidebar entry, moved with Up/Down.
    pub nav_selected: Option<usize>,
    /// Document revision last drawn.
    pub drawn_revision: Option<u64>,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            address_bar: AddressBar::new(),
            nav_selected: None,
            drawn_revision: None,
        }
    }
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the interactive shell until the user quits, starting at `initial`.
pub async fn run(mut app: App, initial: &str) -> std::io::Result<()> {
    let mut tui = TuiState::new();
    let mut terminal = ratatui::init();

    // Channel for actions from navigation tasks
    let (tx, rx) = mpsc::channel();

    dispatch(&mut app, Action::Navigate(initial.to_string()), &tx);
    let mut needs_redraw = true;

    loop {
        let revision = app.document.snapshot().revision;
        if tui.drawn_revision != Some(revision) {
            needs_redraw = true;
        }
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            tui.drawn_revision = Some(revision);
            needs_redraw = false;
        }

        let first_event = poll_event_timeout(POLL_INTERVAL);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let mut should_quit = false;
        for event in first_event.into_iter().chain(std::iter::from_fn(poll_event_immediate)) {
            let action = match event {
                TuiEvent::Resize => continue,
                TuiEvent::Quit | TuiEvent::ForceQuit => Some(Action::Quit),
                TuiEvent::Back => Some(Action::Back),
                TuiEvent::Reset => Some(Action::ResetContext),
                TuiEvent::NavUp | TuiEvent::NavDown => {
                    move_selection(&app, &mut tui, event == TuiEvent::NavDown);
                    None
                }
                other => match tui.address_bar.handle_event(&other) {
                    Some(AddressEvent::Submit(fragment)) => {
                        tui.nav_selected = None;
                        Some(Action::Navigate(fragment))
                    }
                    _ => None,
                },
            };
            if let Some(action) = action
                && dispatch(&mut app, action, &tx) == Effect::Quit
            {
                should_quit = true;
                break;
            }
        }

        if should_quit {
            break;
        }

        // Results from navigation tasks
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            dispatch(&mut app, action, &tx);
        }
    }

    ratatui::restore();
    app.lifecycle.teardown().await;
    info!("Shell closed");
    Ok(())
}

/// Applies `action` and starts whatever its effect asks for.
fn dispatch(app: &mut App, action: Action, tx: &mpsc::Sender<Action>) -> Effect {
    let effect = update(app, action);
    if let Effect::SpawnNavigation(fragment) = &effect {
        spawn_navigation(app, fragment.clone(), tx.clone());
    }
    effect
}

fn move_selection(app: &App, tui: &mut TuiState, down: bool) {
    let entries = nav_entries(app.router());
    if entries.is_empty() {
        return;
    }
    let last = entries.len() - 1;
    let next = match (tui.nav_selected, down) {
        (None, true) => 0,
        (None, false) => last,
        (Some(i), true) => (i + 1).min(last),
        (Some(i), false) => i.saturating_sub(1),
    };
    tui.nav_selected = Some(next);
    tui.address_bar.set(&entries[next].href);
}

fn spawn_navigation(app: &App, fragment: String, tx: mpsc::Sender<Action>) {
    info!("Spawning navigation to {fragment}");
    let lifecycle = app.lifecycle.clone();
    tokio::spawn(async move {
        let result = lifecycle
            .navigate_path(&fragment)
            .await
            .map_err(|e| e.to_string());
        if tx.send(Action::NavigationFinished { fragment, result }).is_err() {
            warn!("Failed to report navigation result: receiver dropped");
        }
    });
}
