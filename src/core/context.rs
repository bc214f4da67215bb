//! # Handoff Context
//!
//! The payload modules pass to each other across navigations.
//!
//! The bag itself is an open JSON object, because modules are free to stash
//! whatever they need. The shapes that cross module boundaries are typed:
//! [`Handoff`] lists every known shape, each stored under its own key and
//! checked through serde when read back. A module that writes a malformed
//! `quizData` gets a `ContextError` on the reading side instead of a
//! silently-missing field.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::route::RouteParams;

/// Key holding the last-resolved route parameters.
pub const PARAMS_KEY: &str = "params";

/// An open JSON object carried between modules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

#[derive(Debug)]
pub enum ContextError {
    /// A value exists under `key` but does not have the expected shape.
    Shape { key: &'static str, source: serde_json::Error },
    Encode(serde_json::Error),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Shape { key, source } => write!(f, "context '{key}' is malformed: {source}"),
            ContextError::Encode(e) => write!(f, "context encode error: {e}"),
        }
    }
}

impl std::error::Error for ContextError {}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Route parameters last merged in, or empty if none.
    pub fn params(&self) -> RouteParams {
        self.0
            .get(PARAMS_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Replaces the `params` entry, leaving every other field alone.
    pub fn set_params(&mut self, params: &RouteParams) {
        // RouteParams is a string map; serializing it cannot fail.
        let value = serde_json::to_value(params).unwrap_or_else(|_| Value::Object(Map::new()));
        self.0.insert(PARAMS_KEY.to_string(), value);
    }

    /// Deserializes the value under `key` into `T`.
    pub fn read<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, ContextError> {
        self.0
            .get(key)
            .map(|v| serde_json::from_value(v.clone()).map_err(|source| ContextError::Shape { key, source }))
            .transpose()
    }

    pub fn write<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), ContextError> {
        let value = serde_json::to_value(value).map_err(ContextError::Encode)?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    /// Stores a typed handoff under its well-known key.
    pub fn set_handoff(&mut self, handoff: &Handoff) -> Result<(), ContextError> {
        match handoff {
            Handoff::Quiz(q) => self.write(Handoff::QUIZ_KEY, q),
            Handoff::LearningPath(p) => self.write(Handoff::LEARNING_PATH_KEY, p),
            Handoff::GameLevel(g) => self.write(Handoff::GAME_LEVEL_KEY, g),
        }
    }

    pub fn quiz(&self) -> Result<Option<QuizHandoff>, ContextError> {
        self.read(Handoff::QUIZ_KEY)
    }

    pub fn learning_path(&self) -> Result<Option<LearningPathHandoff>, ContextError> {
        self.read(Handoff::LEARNING_PATH_KEY)
    }

    pub fn game_level(&self) -> Result<Option<GameLevelHandoff>, ContextError> {
        self.read(Handoff::GAME_LEVEL_KEY)
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ============================================================================
// Known Handoff Shapes
// ============================================================================

/// Every typed payload that crosses a module boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Handoff {
    Quiz(QuizHandoff),
    LearningPath(LearningPathHandoff),
    GameLevel(GameLevelHandoff),
}

impl Handoff {
    pub const QUIZ_KEY: &'static str = "quizData";
    pub const LEARNING_PATH_KEY: &'static str = "learningPath";
    pub const GAME_LEVEL_KEY: &'static str = "gameLevel";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub prompt: String,
    pub choices: Vec<String>,
    pub answer: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A generated quiz handed from the topic picker to the quiz runner, and
/// from the runner to the results view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizHandoff {
    pub topic: String,
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub answers: Vec<Option<usize>>,
    #[serde(default)]
    pub completed: bool,
}

impl QuizHandoff {
    pub fn score(&self) -> usize {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| **a == Some(q.answer))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathHandoff {
    pub path_id: String,
    pub title: String,
    #[serde(default)]
    pub levels: Vec<String>,
    #[serde(default)]
    pub current_level: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLevelHandoff {
    pub path_id: String,
    pub level_id: String,
    #[serde(default)]
    pub lives: u8,
}
