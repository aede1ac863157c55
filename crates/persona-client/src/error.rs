use persona_spec::SchemaError;
use thiserror::Error;

/// Fallback used when the store rejects a document without explaining why.
pub const DEFAULT_STORE_FAILURE: &str = "Failed to save persona";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid client configuration: {0}")]
    Config(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Backend(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("malformed persona record: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ClientError {
    /// Message suitable for showing next to a retry prompt.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Backend(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
