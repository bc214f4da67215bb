//! Landing gallery. Rotates the featured topic on a timer task, which
//! `destroy` must stop or it would keep rewriting the next module's markup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::task::JoinHandle;

use crate::core::document::{Document, escape_html};
use crate::loader::module::{ModuleContext, ModuleInitError, RouteModule};

const FEATURED: &[&str] = &[
    "World History",
    "Rust Ownership",
    "Cell Biology",
    "Jazz Standards",
];

const ROTATE_EVERY: Duration = Duration::from_secs(3);

#[derive(Default)]
pub struct Gallery {
    template: Option<String>,
    ticker: Option<JoinHandle<()>>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }
}

fn render(template: &str, tick: usize) -> String {
    template.replace("{{featured}}", &escape_html(FEATURED[tick % FEATURED.len()]))
}

#[async_trait]
impl RouteModule for Gallery {
    async fn init(&mut self, cx: ModuleContext) -> Result<(), ModuleInitError> {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        let template = self
            .template
            .get_or_insert_with(|| cx.document.mount_html())
            .clone();
        cx.document.set_mount_html(&render(&template, 0));

        let document: Arc<dyn Document> = cx.document.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(ROTATE_EVERY);
            interval.tick().await;
            let mut tick = 0usize;
            loop {
                interval.tick().await;
                tick += 1;
                document.set_mount_html(&render(&template, tick));
            }
        }));
        Ok(())
    }

    fn destroy(self: Box<Self>) {
        if let Some(ticker) = self.ticker {
            ticker.abort();
            debug!("Gallery ticker stopped");
        }
    }
}
