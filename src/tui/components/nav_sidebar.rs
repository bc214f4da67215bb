//! # NavSidebar Component
//!
//! Passive renderer of the route table's nav entries (and footer links
//! below them). Highlights the active module and the keyboard selection.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::core::route::{RouteDescriptor, Router, normalize_path};
use crate::tui::component::Component;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub name: String,
    pub icon: String,
    pub href: String,
    pub module_id: String,
}

impl NavEntry {
    fn from_route(route: &RouteDescriptor) -> Self {
        Self {
            name: route.name.clone(),
            icon: route.icon.clone().unwrap_or_else(|| "·".to_string()),
            href: format!("#{}", normalize_path(&route.path)),
            module_id: route.module_id.clone(),
        }
    }
}

/// The entries listed in the sidebar, in route-table order.
pub fn nav_entries(router: &Router) -> Vec<NavEntry> {
    router.nav_routes().map(NavEntry::from_route).collect()
}

pub fn footer_entries(router: &Router) -> Vec<NavEntry> {
    router.footer_routes().map(NavEntry::from_route).collect()
}

pub struct NavSidebar {
    pub entries: Vec<NavEntry>,
    pub footer: Vec<NavEntry>,
    pub active_module: Option<String>,
    pub selected: Option<usize>,
}

impl Component for NavSidebar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let mut style = Style::default();
                if self.active_module.as_deref() == Some(entry.module_id.as_str()) {
                    style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
                }
                if self.selected == Some(i) {
                    style = style.bg(Color::DarkGray);
                }
                Line::from(Span::styled(format!("{} {}", entry.icon, entry.name), style))
            })
            .collect();

        if !self.footer.is_empty() {
            lines.push(Line::default());
            lines.extend(self.footer.iter().map(|entry| {
                Line::from(Span::styled(
                    entry.href.clone(),
                    Style::default().fg(Color::DarkGray),
                ))
            }));
        }

        frame.render_widget(Paragraph::new(lines).block(Block::bordered().title("Navigate")), area);
    }
}
