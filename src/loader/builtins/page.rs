use async_trait::async_trait;

use crate::loader::module::{ModuleContext, ModuleInitError, RouteModule};

/// Markup whose `{{name}}` slots are filled from the route parameters.
/// `{{keys}}` is the number of entries in the handoff context. Slots with no
/// value render as `-`.
#[derive(Default)]
pub struct StaticPage {
    template: Option<String>,
}

impl StaticPage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slot_names(template: &str) -> Vec<&str> {
    template
        .split("{{")
        .skip(1)
        .filter_map(|rest| rest.split_once("}}").map(|(name, _)| name))
        .collect()
}

#[async_trait]
impl RouteModule for StaticPage {
    async fn init(&mut self, cx: ModuleContext) -> Result<(), ModuleInitError> {
        let template = self
            .template
            .get_or_insert_with(|| cx.document.mount_html())
            .clone();
        cx.document.set_mount_html(&template);

        let context = cx.state.context();
        let params = context.params();
        for slot in slot_names(&template) {
            let value = match slot {
                "keys" => context.as_map().len().to_string(),
                name => params.get(name).unwrap_or("-").to_string(),
            };
            cx.document.fill_slot(slot, &value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::app_state::AppState;
    use crate::core::document::{Document, HeadlessDocument};
    use crate::core::route::RouteParams;
    use crate::core::storage::MemoryStorage;

    #[test]
    fn test_slot_names() {
        assert_eq!(slot_names("<p>{{a}} and {{b}}</p>"), vec!["a", "b"]);
        assert!(slot_names("<p>plain</p>").is_empty());
    }

    #[tokio::test]
    async fn test_fills_params_and_refills_on_reinit() {
        let document = Arc::new(HeadlessDocument::new());
        document.set_mount_html("<h2>{{pathId}}</h2><p>{{levelId}}</p>");
        let state = AppState::handle(Arc::new(MemoryStorage::new()));
        let cx = ModuleContext {
            state: state.clone(),
            document: document.clone(),
            extra: None,
        };
        let mut page = StaticPage::new();

        state.set_route_params(&[("pathId", "rust")].into_iter().collect::<RouteParams>());
        page.init(cx.clone()).await.unwrap();
        assert_eq!(document.mount_html(), "<h2>rust</h2><p>-</p>");

        state.set_route_params(&[("pathId", "rust"), ("levelId", "3")].into_iter().collect::<RouteParams>());
        page.init(cx).await.unwrap();
        assert_eq!(document.mount_html(), "<h2>rust</h2><p>3</p>");
    }
}
