//! HTTP client for an OpenAI-compatible chat-completion API (OpenRouter by
//! default).
//!
//! Wraps `reqwest` with bearer authentication, retry with back-off, and
//! typed response parsing. Non-2xx responses and in-band error envelopes
//! surface as [`AssistantError::Api`].

use std::time::Duration;

use geomesh_core::AssistantSettings;
use reqwest::{Client, Url};

use crate::error::AssistantError;
use crate::retry::retry_with_backoff;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ErrorEnvelope, NodeContext};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
const NO_RESPONSE: &str = "No response.";

/// Client for the chat-completion endpoint.
///
/// Use [`AssistantClient::from_settings`] in production or
/// [`AssistantClient::with_base_url`] to point at a mock server in tests.
pub struct AssistantClient {
    client: Client,
    api_key: String,
    endpoint: Url,
    model: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl AssistantClient {
    /// Creates a client pointed at OpenRouter with the default model.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, AssistantError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL, DEFAULT_MODEL)
    }

    /// Creates a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// - [`AssistantError::MissingApiKey`] if no key is configured.
    /// - [`AssistantError::InvalidBaseUrl`] if the base URL does not parse.
    /// - [`AssistantError::Http`] if the `reqwest::Client` cannot be built.
    pub fn from_settings(settings: &AssistantSettings) -> Result<Self, AssistantError> {
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or(AssistantError::MissingApiKey)?;
        Ok(
            Self::with_base_url(api_key, settings.timeout_secs, &settings.base_url, &settings.model)?
                .with_retry_policy(settings.max_retries, settings.retry_backoff_base_ms),
        )
    }

    /// Creates a client with a custom base URL and model.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`AssistantError::InvalidBaseUrl`] if `base_url` is
    /// not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
        model: &str,
    ) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("geomesh/0.1 (learning-assistant)")
            .build()?;

        let normalised = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised).map_err(|e| AssistantError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint,
            model: model.to_owned(),
            max_retries: 2,
            backoff_base_ms: 500,
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `question` to the model and returns the first choice's text.
    ///
    /// When `context` is given, it is sent as a system message ahead of the
    /// question. A response without any content yields `"No response."`.
    ///
    /// # Errors
    ///
    /// - [`AssistantError::EmptyQuestion`] if `question` is blank. No request
    ///   is made.
    /// - [`AssistantError::Api`] on a non-2xx status or an error envelope.
    /// - [`AssistantError::Http`] on network failure.
    /// - [`AssistantError::Deserialize`] if the body is not a chat response.
    pub async fn ask(
        &self,
        question: &str,
        context: Option<&NodeContext>,
    ) -> Result<String, AssistantError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }

        let system = context.map(NodeContext::system_prompt);
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: question,
        });
        let request = &ChatRequest {
            model: &self.model,
            messages,
        };

        let answer = retry_with_backoff(self.max_retries, self.backoff_base_ms, move || {
            self.send(request)
        })
        .await?;

        tracing::debug!(model = %self.model, chars = answer.len(), "assistant answered");
        Ok(answer)
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<String, AssistantError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        parse_answer(&body, status.as_u16())
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.message)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
}

fn parse_answer(body: &str, status: u16) -> Result<String, AssistantError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| AssistantError::Deserialize {
            context: "chat completion".to_owned(),
            source: e,
        })?;

    if parsed.choices.is_empty() {
        if let Some(error) = parsed.error {
            // OpenRouter sometimes reports upstream failures inside a 200.
            let code = error
                .code
                .as_ref()
                .and_then(serde_json::Value::as_u64)
                .and_then(|c| u16::try_from(c).ok())
                .unwrap_or(status);
            return Err(AssistantError::Api {
                status: code,
                message: error.message.unwrap_or_else(|| "unknown error".to_owned()),
            });
        }
    }

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_else(|| NO_RESPONSE.to_owned()))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
