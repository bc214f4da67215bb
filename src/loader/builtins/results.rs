use async_trait::async_trait;

use crate::core::document::escape_html;
use crate::loader::module::{ModuleContext, ModuleInitError, RouteModule};

/// Shows the score of the last quiz handed off through the context.
#[derive(Default)]
pub struct Results;

fn summary(cx: &ModuleContext) -> String {
    match cx.state.context().quiz() {
        Ok(Some(quiz)) => format!(
            "{}: {} of {} correct",
            quiz.topic,
            quiz.score(),
            quiz.questions.len()
        ),
        Ok(None) => "No quiz taken yet.".to_string(),
        Err(_) => "Last quiz could not be read.".to_string(),
    }
}

#[async_trait]
impl RouteModule for Results {
    async fn init(&mut self, cx: ModuleContext) -> Result<(), ModuleInitError> {
        let html = cx
            .document
            .mount_html()
            .replace("{{summary}}", &escape_html(&summary(&cx)));
        cx.document.set_mount_html(&html);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::app_state::AppState;
    use crate::core::context::{Handoff, QuizHandoff, QuizQuestion};
    use crate::core::document::{Document, HeadlessDocument};
    use crate::core::storage::MemoryStorage;

    #[tokio::test]
    async fn test_summary_from_handoff() {
        let document = Arc::new(HeadlessDocument::new());
        document.set_mount_html("<p>{{summary}}</p>");
        let state = AppState::handle(Arc::new(MemoryStorage::new()));
        let quiz = QuizHandoff {
            topic: "optics".into(),
            questions: vec![QuizQuestion {
                prompt: "Speed of light?".into(),
                choices: vec!["fast".into(), "slow".into()],
                answer: 0,
                explanation: None,
            }],
            answers: vec![Some(0)],
            completed: true,
        };
        state.update(|c| c.set_handoff(&Handoff::Quiz(quiz))).unwrap();

        let cx = ModuleContext {
            state,
            document: document.clone(),
            extra: None,
        };
        Results.init(cx).await.unwrap();
        assert_eq!(document.mount_html(), "<p>optics: 1 of 1 correct</p>");
    }

    #[tokio::test]
    async fn test_summary_without_quiz() {
        let document = Arc::new(HeadlessDocument::new());
        document.set_mount_html("<p>{{summary}}</p>");
        let cx = ModuleContext {
            state: AppState::handle(Arc::new(MemoryStorage::new())),
            document: document.clone(),
            extra: None,
        };
        Results.init(cx).await.unwrap();
        assert_eq!(document.mount_html(), "<p>No quiz taken yet.</p>");
    }
}
