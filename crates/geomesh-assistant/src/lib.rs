//! Learning-assistant answers for questions asked from a mesh node.
//!
//! Online answers come from an OpenAI-compatible chat-completion API
//! (OpenRouter by default). Offline mode returns a fixed canned answer
//! without touching the network.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::AssistantClient;
pub use error::AssistantError;
pub use types::{Answer, NodeContext};

pub const OFFLINE_ANSWER: &str =
    "Offline Mode: Photosynthesis is the process by which plants convert sunlight into energy.";

/// The canned answer served when the network is unavailable or the caller
/// asked for offline mode.
#[must_use]
pub fn offline_answer() -> Answer {
    Answer::Offline(OFFLINE_ANSWER.to_owned())
}

/// Answers `question`, online through `client` unless `offline` is set.
///
/// # Errors
///
/// - [`AssistantError::EmptyQuestion`] if `question` is blank, in either mode.
/// - [`AssistantError::MissingApiKey`] when online and no client is configured.
/// - Any error from [`AssistantClient::ask`].
pub async fn answer(
    client: Option<&AssistantClient>,
    question: &str,
    context: Option<&NodeContext>,
    offline: bool,
) -> Result<Answer, AssistantError> {
    if question.trim().is_empty() {
        return Err(AssistantError::EmptyQuestion);
    }
    if offline {
        tracing::debug!("serving offline answer");
        return Ok(offline_answer());
    }
    let client = client.ok_or(AssistantError::MissingApiKey)?;
    client.ask(question, context).await.map(Answer::Online)
}
