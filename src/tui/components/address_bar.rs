//! # AddressBar Component
//!
//! One-line fragment entry. Typing edits the buffer, Enter submits it as a
//! navigation. The buffer is internal state; `placeholder` is a prop showing
//! the current fragment while the buffer is empty.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressEvent {
    /// Enter pressed with a non-empty buffer.
    Submit(String),
    Changed,
}

#[derive(Default)]
pub struct AddressBar {
    pub buffer: String,
    pub placeholder: String,
}

impl AddressBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the buffer, e.g. with the href of the selected nav entry.
    pub fn set(&mut self, text: &str) {
        self.buffer = text.to_string();
    }
}

impl EventHandler for AddressBar {
    type Event = AddressEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<AddressEvent> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.push(*c);
                Some(AddressEvent::Changed)
            }
            TuiEvent::Paste(text) => {
                self.buffer.extend(text.chars().filter(|c| !c.is_control()));
                Some(AddressEvent::Changed)
            }
            TuiEvent::Backspace => self.buffer.pop().map(|_| AddressEvent::Changed),
            TuiEvent::Submit => {
                let fragment = self.buffer.trim().to_string();
                self.buffer.clear();
                (!fragment.is_empty()).then_some(AddressEvent::Submit(fragment))
            }
            _ => None,
        }
    }
}

impl Component for AddressBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content = if self.buffer.is_empty() {
            Span::styled(self.placeholder.clone(), Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(self.buffer.clone())
        };
        frame.render_widget(Paragraph::new(content).block(Block::bordered().title("Go to")), area);

        let cursor_x = area.x + 1 + self.buffer.chars().count() as u16;
        if cursor_x < area.right().saturating_sub(1) {
            frame.set_cursor_position(Position::new(cursor_x, area.y + 1));
        }
    }
}
