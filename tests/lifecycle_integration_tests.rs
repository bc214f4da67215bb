use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quizshell::core::app_state::{AppState, AppStateHandle};
use quizshell::core::cache::ModuleCache;
use quizshell::core::context::{Context, Handoff, QuizHandoff, QuizQuestion};
use quizshell::core::document::{Document, HeadlessDocument};
use quizshell::core::lifecycle::{
    LifecycleOptions, LifecycleState, ModuleLifecycleManager, NavigationOutcome,
};
use quizshell::core::route::{RouteDescriptor, Router, default_routes};
use quizshell::core::storage::{FileStorage, MemoryStorage, SessionStorage};
use quizshell::loader::{
    AssetFetcher, EmbeddedFetcher, FetchError, ModuleContext, ModuleInitError, RegistryLoader,
    RouteModule, builtin_assets, builtin_registry,
};

// ============================================================================
// Fakes
// ============================================================================

/// Delays every asset of the listed modules and counts requests per path.
struct SlowFetcher {
    inner: EmbeddedFetcher,
    delays: HashMap<String, Duration>,
    requests: Mutex<HashMap<String, usize>>,
}

impl SlowFetcher {
    fn new(inner: EmbeddedFetcher, delays: &[(&str, Duration)]) -> Self {
        Self {
            inner,
            delays: delays.iter().map(|(id, d)| (id.to_string(), *d)).collect(),
            requests: Mutex::new(HashMap::new()),
        }
    }

    fn requests(&self, path: &str) -> usize {
        self.requests.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl AssetFetcher for SlowFetcher {
    fn name(&self) -> &str {
        "slow"
    }

    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        *self.requests.lock().unwrap().entry(path.to_string()).or_insert(0) += 1;
        let module_id = path.split('/').nth(1).unwrap_or_default();
        if let Some(delay) = self.delays.get(module_id) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.fetch_text(path).await
    }
}

#[derive(Clone, Default)]
struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.all().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

struct Recorder {
    module_id: String,
    events: Events,
    init_delay: Duration,
}

#[async_trait]
impl RouteModule for Recorder {
    async fn init(&mut self, _cx: ModuleContext) -> Result<(), ModuleInitError> {
        self.events.push(format!("init:{}", self.module_id));
        if !self.init_delay.is_zero() {
            tokio::time::sleep(self.init_delay).await;
        }
        Ok(())
    }

    fn destroy(self: Box<Self>) {
        self.events.push(format!("destroy:{}", self.module_id));
    }
}

fn recording_registry(events: &Events, modules: &[(&str, Duration)]) -> RegistryLoader {
    let mut registry = RegistryLoader::new();
    for (id, init_delay) in modules {
        let events = events.clone();
        let module_id = id.to_string();
        let init_delay = *init_delay;
        registry.register(id, move || {
            Box::new(Recorder {
                module_id: module_id.clone(),
                events: events.clone(),
                init_delay,
            }) as Box<dyn RouteModule>
        });
    }
    registry
}

fn bundles(ids: &[&str]) -> EmbeddedFetcher {
    ids.iter().fold(EmbeddedFetcher::new(), |fetcher, id| {
        fetcher.with_bundle(id, &format!("<main>{id}</main>"), &format!(".{id}{{}}"))
    })
}

fn manager(
    fetcher: Arc<dyn AssetFetcher>,
    registry: RegistryLoader,
    document: Arc<HeadlessDocument>,
    state: AppStateHandle,
) -> Arc<ModuleLifecycleManager> {
    Arc::new(ModuleLifecycleManager::new(
        Arc::new(Router::new(default_routes()).unwrap()),
        Arc::new(ModuleCache::new(fetcher, Arc::new(registry))),
        state,
        document,
        LifecycleOptions::default(),
    ))
}

fn memory_state() -> AppStateHandle {
    AppState::handle(Arc::new(MemoryStorage::new()))
}

// ============================================================================
// Ordering and Supersession
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_slow_stale_mount_never_clobbers_newer_one() {
    let events = Events::default();
    let document = Arc::new(HeadlessDocument::new());
    let fetcher = Arc::new(SlowFetcher::new(
        bundles(&["quiz", "settings"]),
        &[("quiz", Duration::from_millis(500))],
    ));
    let manager = manager(
        fetcher,
        recording_registry(&events, &[("quiz", Duration::ZERO), ("settings", Duration::ZERO)]),
        document.clone(),
        memory_state(),
    );

    let slow = tokio::spawn({
        let manager = manager.clone();
        async move { manager.navigate_path("#/quiz/rust").await }
    });
    // Let the quiz navigation start its fetch.
    tokio::time::sleep(Duration::from_millis(10)).await;

    let fast = manager.navigate_path("#/settings").await.unwrap();
    assert_eq!(fast, NavigationOutcome::Mounted { module_id: "settings".into() });

    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow, NavigationOutcome::Superseded);
    assert_eq!(manager.state(), LifecycleState::Active { module_id: "settings".into() });
    assert_eq!(document.mount_html(), "<main>settings</main>");
    assert_eq!(document.stylesheet_ids(), vec!["settings"]);
    assert_eq!(events.all(), vec!["init:settings"]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_init_is_released_when_superseded() {
    let events = Events::default();
    let document = Arc::new(HeadlessDocument::new());
    let manager = manager(
        Arc::new(bundles(&["quiz", "settings"])),
        recording_registry(
            &events,
            &[("quiz", Duration::from_millis(300)), ("settings", Duration::ZERO)],
        ),
        document.clone(),
        memory_state(),
    );

    let slow = tokio::spawn({
        let manager = manager.clone();
        async move { manager.navigate_path("#/quiz/rust").await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(events.all(), vec!["init:quiz"]);

    manager.navigate_path("#/settings").await.unwrap();
    assert_eq!(slow.await.unwrap().unwrap(), NavigationOutcome::Superseded);

    assert_eq!(events.all(), vec!["init:quiz", "destroy:quiz", "init:settings"]);
    assert_eq!(manager.active_module_id().as_deref(), Some("settings"));
    assert_eq!(document.stylesheet_ids(), vec!["settings"]);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_navigations_leaves_one_live_module() {
    let events = Events::default();
    let ids = ["home", "topic-list", "quiz", "results", "settings"];
    let fetcher = Arc::new(SlowFetcher::new(
        bundles(&ids),
        &[("quiz", Duration::from_millis(200)), ("home", Duration::from_millis(50))],
    ));
    let modules: Vec<(&str, Duration)> = ids.iter().map(|id| (*id, Duration::from_millis(20))).collect();
    let manager = manager(fetcher, recording_registry(&events, &modules), Arc::new(HeadlessDocument::new()), memory_state());

    let handles: Vec<_> = ["#/home", "#/quiz/a", "#/topics", "#/results", "#/quiz/b", "#/settings"]
        .into_iter()
        .map(|fragment| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.navigate_path(fragment).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(manager.active_module_id().as_deref(), Some("settings"));
    assert_eq!(events.count("init:") - events.count("destroy:"), 1);
    assert_eq!(events.all().last().map(String::as_str), Some("init:settings"));
}

#[tokio::test]
async fn test_concurrent_visits_share_one_fetch() {
    let fetcher = Arc::new(SlowFetcher::new(bundles(&["quiz"]), &[]));
    let events = Events::default();
    let cache = ModuleCache::new(
        fetcher.clone(),
        Arc::new(recording_registry(&events, &[("quiz", Duration::ZERO)])),
    );

    let (a, b) = tokio::join!(cache.get("quiz"), cache.get("quiz"));
    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    assert_eq!(fetcher.requests("modules/quiz/quiz.html"), 1);
    assert_eq!(fetcher.requests("modules/quiz/quiz.css"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_during_fetch_supersedes_mount() {
    let events = Events::default();
    let document = Arc::new(HeadlessDocument::new());
    let fetcher = Arc::new(SlowFetcher::new(
        bundles(&["quiz"]),
        &[("quiz", Duration::from_millis(500))],
    ));
    let manager = manager(
        fetcher,
        recording_registry(&events, &[("quiz", Duration::ZERO)]),
        document.clone(),
        memory_state(),
    );

    let pending = tokio::spawn({
        let manager = manager.clone();
        async move { manager.navigate_path("#/quiz/rust").await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(manager.state(), LifecycleState::Mounting { module_id: "quiz".into() });

    manager.teardown().await;
    assert_eq!(pending.await.unwrap().unwrap(), NavigationOutcome::Superseded);

    assert_eq!(manager.state(), LifecycleState::Idle);
    assert!(events.all().is_empty());
    assert!(document.stylesheet_ids().is_empty());
    assert_eq!(document.mount_html(), "");
}

#[tokio::test(start_paused = true)]
async fn test_teardown_during_init_destroys_instance_once() {
    let events = Events::default();
    let document = Arc::new(HeadlessDocument::new());
    let manager = manager(
        Arc::new(bundles(&["quiz"])),
        recording_registry(&events, &[("quiz", Duration::from_millis(300))]),
        document.clone(),
        memory_state(),
    );

    let pending = tokio::spawn({
        let manager = manager.clone();
        async move { manager.navigate_path("#/quiz/rust").await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(events.all(), vec!["init:quiz"]);

    manager.teardown().await;
    assert_eq!(pending.await.unwrap().unwrap(), NavigationOutcome::Superseded);

    assert_eq!(events.all(), vec!["init:quiz", "destroy:quiz"]);
    assert_eq!(manager.state(), LifecycleState::Idle);
    assert!(document.stylesheet_ids().is_empty());
    assert_eq!(document.mount_html(), "");

    manager.teardown().await;
    assert_eq!(events.count("destroy:quiz"), 1);
}

// ============================================================================
// Built-in Modules End to End
// ============================================================================

#[tokio::test]
async fn test_category_switch_updates_in_place() {
    let document = Arc::new(HeadlessDocument::new());
    let state = memory_state();
    let manager = manager(Arc::new(builtin_assets()), builtin_registry(), document.clone(), state.clone());

    manager.navigate_path("#/topics/history").await.unwrap();
    assert!(document.mount_html().contains("Topics: history"));
    state.update(|c| c.insert("quizData", serde_json::json!({"topic": "history", "questions": []})));
    let revision = document.snapshot().revision;

    let outcome = manager.navigate_path("#/topics/science").await.unwrap();
    assert_eq!(outcome, NavigationOutcome::Updated { module_id: "topic-list".into() });
    assert!(document.mount_html().contains("Topics: science"));
    assert!(document.mount_html().contains("#/quiz/optics"));
    assert!(document.snapshot().revision > revision);

    let context = state.context();
    assert_eq!(context.params().get("categoryId"), Some("science"));
    assert_eq!(context.get("selectedCategory"), Some(&serde_json::json!("science")));
    assert!(context.contains_key("quizData"));
}

#[tokio::test]
async fn test_quiz_handoff_reaches_results() {
    let document = Arc::new(HeadlessDocument::new());
    let state = memory_state();
    let manager = manager(Arc::new(builtin_assets()), builtin_registry(), document.clone(), state.clone());

    let quiz = QuizHandoff {
        topic: "optics".into(),
        questions: vec![
            QuizQuestion {
                prompt: "Which bends light more?".into(),
                choices: vec!["Glass".into(), "Vacuum".into()],
                answer: 0,
                explanation: None,
            },
            QuizQuestion {
                prompt: "Colour of the sky?".into(),
                choices: vec!["Blue".into(), "Green".into()],
                answer: 0,
                explanation: None,
            },
        ],
        answers: vec![Some(0), Some(1)],
        completed: true,
    };
    state.update(|c| c.set_handoff(&Handoff::Quiz(quiz))).unwrap();

    manager.navigate_path("#/quiz/optics").await.unwrap();
    assert_eq!(state.context().get("quizInProgress"), Some(&serde_json::json!(true)));

    manager.navigate_path("#/results").await.unwrap();
    assert_eq!(state.context().get("quizInProgress"), Some(&serde_json::json!(false)));
    assert!(document.mount_html().contains("optics: 1 of 2 correct"));
}

#[tokio::test]
async fn test_quiz_without_topic_shows_error_and_recovers() {
    let document = Arc::new(HeadlessDocument::new());
    let router = Router::new(vec![
        RouteDescriptor::new("/", "home", "Home"),
        RouteDescriptor::new("/quiz", "quiz", "Quiz"),
    ])
    .unwrap();
    let manager = ModuleLifecycleManager::new(
        Arc::new(router),
        Arc::new(ModuleCache::new(Arc::new(builtin_assets()), Arc::new(builtin_registry()))),
        memory_state(),
        document.clone(),
        LifecycleOptions::default(),
    );

    assert!(manager.navigate_path("#/quiz").await.is_err());
    assert_eq!(manager.state(), LifecycleState::Idle);
    assert!(document.mount_html().contains("Go Home"));

    manager.navigate_path("#/").await.unwrap();
    assert_eq!(manager.active_module_id().as_deref(), Some("home"));
    manager.teardown().await;
}

// ============================================================================
// Session Persistence
// ============================================================================

#[tokio::test]
async fn test_reload_from_session_file_restores_context() {
    let dir = std::env::temp_dir().join(format!("quizshell-it-{}", uuid::Uuid::new_v4()));
    let session_id = "reload-check";

    {
        let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::open(&dir, session_id).unwrap());
        let state = AppState::handle(storage);
        let manager = manager(Arc::new(builtin_assets()), builtin_registry(), Arc::new(HeadlessDocument::new()), state.clone());
        manager.navigate_path("#/learning-path/rust/level/2").await.unwrap();
        let mut extra = Context::new();
        extra.insert("learningPath", serde_json::json!({"pathId": "rust", "title": "Rust"}));
        state.set_context(extra);
        manager.teardown().await;
    }

    let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::open(&dir, session_id).unwrap());
    let reloaded = AppState::new(storage);
    let context = reloaded.context();
    assert_eq!(context.params().get("pathId"), Some("rust"));
    assert_eq!(context.params().get("levelId"), Some("2"));
    assert_eq!(context.learning_path().unwrap().unwrap().title, "Rust");

    let _ = std::fs::remove_dir_all(dir);
}
