use async_trait::async_trait;
use serde_json::json;

use crate::core::document::escape_html;
use crate::loader::module::{ModuleContext, ModuleInitError, RouteModule};

/// Category → (slug, title) pairs.
const CATALOG: &[(&str, &[(&str, &str)])] = &[
    ("history", &[("ancient-rome", "Ancient Rome"), ("cold-war", "The Cold War")]),
    ("science", &[("cell-biology", "Cell Biology"), ("optics", "Optics")]),
    ("programming", &[("rust-ownership", "Rust Ownership"), ("sql-joins", "SQL Joins")]),
];

/// Lists topics for the `categoryId` parameter (all categories when absent).
/// Re-renders from its original markup on every `init`, so switching
/// category keeps the module mounted.
#[derive(Default)]
pub struct TopicList {
    template: Option<String>,
}

impl TopicList {
    pub fn new() -> Self {
        Self::default()
    }
}

fn topics_for(category: Option<&str>) -> Vec<(&'static str, &'static str)> {
    CATALOG
        .iter()
        .filter(|(name, _)| category.is_none_or(|c| c == *name))
        .flat_map(|(_, topics)| topics.iter().copied())
        .collect()
}

#[async_trait]
impl RouteModule for TopicList {
    async fn init(&mut self, cx: ModuleContext) -> Result<(), ModuleInitError> {
        let template = self
            .template
            .get_or_insert_with(|| cx.document.mount_html())
            .clone();

        let params = cx.state.context().params();
        let category = params.get("categoryId");
        let items: String = topics_for(category)
            .into_iter()
            .map(|(slug, title)| format!("<li><a href=\"#/quiz/{slug}\">{}</a></li>", escape_html(title)))
            .collect();
        let items = if items.is_empty() {
            "<li>No topics in this category yet.</li>".to_string()
        } else {
            items
        };

        let html = template
            .replace("{{category}}", &escape_html(category.unwrap_or("all")))
            .replace("{{topics}}", &items);
        cx.document.set_mount_html(&html);

        cx.state.update(|c| c.insert("selectedCategory", json!(category)));
        Ok(())
    }
}
