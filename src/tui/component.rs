use ratatui::Frame;
use ratatui::layout::Rect;

/// A piece of the shell that draws itself.
///
/// Components receive their data as struct fields ("props") filled in by
/// the caller right before rendering, and may keep presentation state of
/// their own between frames.
pub trait Component {
    /// Render the component into the given area.
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that consumes terminal events.
pub trait EventHandler {
    /// The high-level event this component emits.
    type Event;

    /// Handle a low-level `TuiEvent` and optionally return a high-level event.
    fn handle_event(&mut self, event: &super::event::TuiEvent) -> Option<Self::Event>;
}
