//! # TitleBar Component
//!
//! Single status line: active route, transient status, session.
//!
//! Stateless: all fields are props set by the caller before each render.
//! The text degrades by dropping the optional parts:
//!
//! 1. `"quizshell | Topics | Loading Quiz... | session 1a2b3c4d"`
//! 2. `"quizshell | Topics | Loading Quiz..."`
//! 3. `"quizshell | Topics"`

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Span;

pub struct TitleBar {
    pub route_name: String,
    /// Transient status, hidden when it just repeats the route name.
    pub status_message: String,
    pub session_id: Option<String>,
    pub navigating: bool,
}

impl TitleBar {
    pub fn new(route_name: String, status_message: String, session_id: Option<String>, navigating: bool) -> Self {
        Self {
            route_name,
            status_message,
            session_id,
            navigating,
        }
    }

    fn text(&self) -> String {
        let mut text = format!("quizshell | {}", self.route_name);
        if !self.status_message.is_empty() && self.status_message != self.route_name {
            text.push_str(" | ");
            text.push_str(&self.status_message);
        }
        if let Some(id) = &self.session_id {
            let short: String = id.chars().take(8).collect();
            text.push_str(&format!(" | session {short}"));
        }
        text
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let style = if self.navigating {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        frame.render_widget(Span::styled(self.text(), style), area);
    }
}
