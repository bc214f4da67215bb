//! # MountView Component
//!
//! Renders the document's mount point as terminal text. Block-level tags
//! become line breaks, list items get a bullet, and links show their
//! target after the label (`Browse topics [#/topics]`) so the user can type
//! it into the address bar.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Wrap};

use crate::core::document::DocumentSnapshot;
use crate::tui::component::Component;

const BLOCK_TAGS: &[&str] = &[
    "br", "p", "li", "ul", "ol", "nav", "section", "main", "div", "h1", "h2", "h3", "h4", "h5", "h6",
];

pub struct MountView {
    pub snapshot: DocumentSnapshot,
}

impl Component for MountView {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let is_error = self.snapshot.mount_html.contains("module-error");
        let styles: Vec<&str> = self
            .snapshot
            .stylesheets
            .iter()
            .map(|s| s.module_id.as_str())
            .collect();
        let title = if styles.is_empty() {
            String::from("Page")
        } else {
            format!("Page [styles: {}]", styles.join(", "))
        };
        let border = if is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };

        let lines: Vec<Line> = html_to_lines(&self.snapshot.mount_html)
            .into_iter()
            .map(Line::from)
            .collect();
        let paragraph = Paragraph::new(lines)
            .block(Block::bordered().title(title).border_style(border))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Flattens mounted markup into display lines.
pub fn html_to_lines(html: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut link: Option<String> = None;
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        push_text(&mut current, &rest[..start]);
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start + 1..start + len];
        rest = &rest[start + len + 1..];

        let closing = tag.starts_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match name.as_str() {
            "a" if closing => {
                if let Some(href) = link.take() {
                    current.push_str(&format!(" [{href}]"));
                }
            }
            "a" => link = attribute(tag, "href"),
            "li" if !closing => {
                break_line(&mut lines, &mut current);
                current.push_str("• ");
            }
            name if BLOCK_TAGS.contains(&name) => break_line(&mut lines, &mut current),
            _ => {}
        }
    }
    push_text(&mut current, rest);
    break_line(&mut lines, &mut current);
    lines
}

fn push_text(line: &mut String, raw: &str) {
    let text = decode_entities(raw);
    let mut words = text.split_whitespace().peekable();
    if words.peek().is_none() {
        if !text.is_empty() && !line.is_empty() && !line.ends_with(' ') {
            line.push(' ');
        }
        return;
    }
    if text.starts_with(char::is_whitespace) && !line.is_empty() && !line.ends_with(' ') {
        line.push(' ');
    }
    line.push_str(&words.collect::<Vec<_>>().join(" "));
    if text.ends_with(char::is_whitespace) {
        line.push(' ');
    }
}

fn break_line(lines: &mut Vec<String>, current: &mut String) {
    let line = current.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
    current.clear();
}

fn attribute(tag: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let len = tag[start..].find('"')?;
    Some(decode_entities(&tag[start..start + len]))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
