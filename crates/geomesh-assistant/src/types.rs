//! Wire types for the OpenAI-compatible chat-completion endpoint.

use geomesh_index::ResolutionResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    pub content: Option<String>,
}

/// Error envelope returned by OpenRouter, both on non-2xx responses and
/// occasionally inside a 200.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
    pub code: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// The node a question is being asked from, passed to the model as a
/// system message.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeContext {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
}

impl NodeContext {
    pub(crate) fn system_prompt(&self) -> String {
        format!(
            "You are an offline-first learning assistant answering a student connected \
             through the '{}' community hub at ({:.4}, {:.4}), about {:.2} km away. \
             Keep answers short and suitable for school students.",
            self.name, self.latitude, self.longitude, self.distance_km
        )
    }
}

impl From<&ResolutionResult> for NodeContext {
    fn from(result: &ResolutionResult) -> Self {
        Self {
            name: result.matched_name.clone(),
            latitude: result.matched_point.latitude,
            longitude: result.matched_point.longitude,
            distance_km: result.distance_km,
        }
    }
}

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "text", rename_all = "snake_case")]
pub enum Answer {
    Online(String),
    Offline(String),
}

impl Answer {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Online(text) | Self::Offline(text) => text,
        }
    }

    #[must_use]
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline(_))
    }
}
