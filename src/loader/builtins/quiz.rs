//! Quiz runner. Picks up the `quizData` handoff when it matches the topic
//! in the route, otherwise seeds a practice quiz for that topic.

use std::time::Instant;

use async_trait::async_trait;
use log::{info, warn};
use serde_json::json;

use crate::core::app_state::AppStateHandle;
use crate::core::context::{Handoff, QuizHandoff, QuizQuestion};
use crate::core::document::escape_html;
use crate::loader::module::{ModuleContext, ModuleInitError, RouteModule};

pub const IN_PROGRESS_KEY: &str = "quizInProgress";

#[derive(Default)]
pub struct QuizRunner {
    template: Option<String>,
    state: Option<AppStateHandle>,
    started: Option<Instant>,
}

impl QuizRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

fn practice_quiz(topic: &str) -> QuizHandoff {
    QuizHandoff {
        topic: topic.to_string(),
        questions: vec![
            QuizQuestion {
                prompt: format!("Ready to start {topic}?"),
                choices: vec!["Yes".into(), "Not yet".into()],
                answer: 0,
                explanation: None,
            },
            QuizQuestion {
                prompt: format!("How familiar are you with {topic}?"),
                choices: vec!["New to it".into(), "Some".into(), "Very".into()],
                answer: 1,
                explanation: Some("Any answer is fine for practice.".into()),
            },
        ],
        answers: Vec::new(),
        completed: false,
    }
}

#[async_trait]
impl RouteModule for QuizRunner {
    async fn init(&mut self, cx: ModuleContext) -> Result<(), ModuleInitError> {
        let context = cx.state.context();
        let topic = context
            .params()
            .get("topicId")
            .map(str::to_string)
            .ok_or_else(|| ModuleInitError("quiz needs a topic".to_string()))?;

        let quiz = match context.quiz() {
            Ok(Some(quiz)) if quiz.topic == topic => quiz,
            Ok(_) => practice_quiz(&topic),
            Err(e) => {
                warn!("Ignoring unusable quiz handoff: {e}");
                practice_quiz(&topic)
            }
        };

        let template = self
            .template
            .get_or_insert_with(|| cx.document.mount_html())
            .clone();
        let current = quiz.answers.len().min(quiz.questions.len().saturating_sub(1));
        let prompt = quiz
            .questions
            .get(current)
            .map(|q| q.prompt.as_str())
            .unwrap_or("No questions available.");
        let html = template
            .replace("{{topic}}", &escape_html(&quiz.topic))
            .replace("{{current}}", &(current + 1).to_string())
            .replace("{{total}}", &quiz.questions.len().to_string())
            .replace("{{prompt}}", &escape_html(prompt));
        cx.document.set_mount_html(&html);

        cx.state
            .update(|c| {
                c.insert(IN_PROGRESS_KEY, json!(true));
                c.set_handoff(&Handoff::Quiz(quiz))
            })
            .map_err(|e| ModuleInitError(e.to_string()))?;

        self.state = Some(cx.state.clone());
        self.started.get_or_insert_with(Instant::now);
        Ok(())
    }

    fn destroy(self: Box<Self>) {
        if let Some(state) = self.state {
            state.update(|c| c.insert(IN_PROGRESS_KEY, json!(false)));
        }
        if let Some(started) = self.started {
            info!("Quiz session lasted {:.1}s", started.elapsed().as_secs_f32());
        }
    }
}
