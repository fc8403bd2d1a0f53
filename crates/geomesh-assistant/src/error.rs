use thiserror::Error;

/// Errors returned by the chat-completion client.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status or an error envelope.
    #[error("assistant API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no question provided")]
    EmptyQuestion,

    #[error("OPENROUTER_API_KEY is not set; use offline mode or configure a key")]
    MissingApiKey,

    #[error("invalid assistant base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
