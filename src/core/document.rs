//! # Document
//!
//! The surface the lifecycle manager mounts modules into: one mount point
//! for markup plus the set of injected stylesheets, each tagged with the
//! module that owns it.
//!
//! [`HeadlessDocument`] keeps everything in memory. The terminal shell
//! renders its snapshot; tests inspect it directly.

use std::sync::Mutex;

use crate::core::lock;

pub trait Document: Send + Sync {
    /// Replaces the mount point's markup.
    fn set_mount_html(&self, html: &str);

    fn mount_html(&self) -> String;

    /// Adds a stylesheet owned by `module_id`, replacing any previous one.
    fn inject_stylesheet(&self, module_id: &str, css: &str);

    /// Removes the stylesheet owned by `module_id`, if any.
    fn remove_stylesheet(&self, module_id: &str);

    /// Replaces every `{{slot}}` in the mounted markup with the escaped value.
    fn fill_slot(&self, slot: &str, value: &str) {
        let html = self.mount_html();
        self.set_mount_html(&html.replace(&format!("{{{{{slot}}}}}"), &escape_html(value)));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub module_id: String,
    pub css: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub mount_html: String,
    pub stylesheets: Vec<Stylesheet>,
    /// Bumped on every change, so renderers can skip identical frames.
    pub revision: u64,
}

#[derive(Default)]
pub struct HeadlessDocument {
    inner: Mutex<DocumentSnapshot>,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        lock(&self.inner).clone()
    }

    pub fn stylesheet_ids(&self) -> Vec<String> {
        lock(&self.inner)
            .stylesheets
            .iter()
            .map(|s| s.module_id.clone())
            .collect()
    }
}

impl Document for HeadlessDocument {
    fn set_mount_html(&self, html: &str) {
        let mut doc = lock(&self.inner);
        doc.mount_html = html.to_string();
        doc.revision += 1;
    }

    fn mount_html(&self) -> String {
        lock(&self.inner).mount_html.clone()
    }

    fn inject_stylesheet(&self, module_id: &str, css: &str) {
        let mut doc = lock(&self.inner);
        doc.stylesheets.retain(|s| s.module_id != module_id);
        doc.stylesheets.push(Stylesheet {
            module_id: module_id.to_string(),
            css: css.to_string(),
        });
        doc.revision += 1;
    }

    fn remove_stylesheet(&self, module_id: &str) {
        let mut doc = lock(&self.inner);
        let before = doc.stylesheets.len();
        doc.stylesheets.retain(|s| s.module_id != module_id);
        if doc.stylesheets.len() != before {
            doc.revision += 1;
        }
    }
}

/// The generic failure view. Always offers a way back to a working route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    pub title: String,
    pub message: String,
    pub home_href: String,
}

impl ErrorView {
    pub fn new(title: &str, message: &str, home_href: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            home_href: home_href.to_string(),
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            "<section class=\"module-error\">\n  <h2>{}</h2>\n  <p>{}</p>\n  <a class=\"go-home\" href=\"{}\">Go Home</a>\n</section>",
            escape_html(&self.title),
            escape_html(&self.message),
            escape_html(&self.home_href),
        )
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
