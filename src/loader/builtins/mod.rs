//! Modules compiled into the binary, with their markup and styles embedded
//! from `assets/modules/`.

mod home;
mod page;
mod quiz;
mod results;
mod topic_list;

pub use home::Gallery;
pub use page::StaticPage;
pub use quiz::{IN_PROGRESS_KEY, QuizRunner};
pub use results::Results;
pub use topic_list::TopicList;

use super::fetcher::EmbeddedFetcher;
use super::module::RouteModule;
use super::registry::RegistryLoader;

pub const BUILTIN_MODULES: &[&str] = &["home", "topic-list", "quiz", "results", "learning-path", "settings"];

macro_rules! bundle {
    ($fetcher:expr, $id:literal) => {
        $fetcher
            .with_asset(
                concat!("modules/", $id, "/", $id, ".html"),
                include_str!(concat!("../../../assets/modules/", $id, "/", $id, ".html")),
            )
            .with_asset(
                concat!("modules/", $id, "/", $id, ".css"),
                include_str!(concat!("../../../assets/modules/", $id, "/", $id, ".css")),
            )
            .with_asset(
                concat!("modules/", $id, "/", $id, ".js"),
                include_str!(concat!("../../../assets/modules/", $id, "/", $id, ".js")),
            )
    };
}

/// Every built-in bundle's HTML, CSS and script.
pub fn builtin_assets() -> EmbeddedFetcher {
    let fetcher = EmbeddedFetcher::new();
    let fetcher = bundle!(fetcher, "home");
    let fetcher = bundle!(fetcher, "topic-list");
    let fetcher = bundle!(fetcher, "quiz");
    let fetcher = bundle!(fetcher, "results");
    let fetcher = bundle!(fetcher, "learning-path");
    bundle!(fetcher, "settings")
}

/// Registry of every built-in module's exports.
pub fn builtin_registry() -> RegistryLoader {
    RegistryLoader::new()
        .with("home", || Box::new(Gallery::new()) as Box<dyn RouteModule>)
        .with("topic-list", || Box::new(TopicList::new()) as Box<dyn RouteModule>)
        .with("quiz", || Box::new(QuizRunner::new()) as Box<dyn RouteModule>)
        .with("results", || Box::new(Results) as Box<dyn RouteModule>)
        .with("learning-path", || Box::new(StaticPage::new()) as Box<dyn RouteModule>)
        .with("settings", || Box::new(StaticPage::new()) as Box<dyn RouteModule>)
}
