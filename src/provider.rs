// src/provider.rs
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("Error code: {status} - {body}")]
    Api { status: u16, body: String },
    #[error("Failed to decode provider payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(e)
        } else {
            ProviderError::Request(e)
        }
    }
}

/// Incremental text fragments of a streamed completion. A chunk without content yields "".
pub type FragmentStream = BoxStream<'static, Result<String, ProviderError>>;

/// Provider-facing view of a single chat request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub message: String,
    pub temperature: f64,
    pub max_tokens: i64,
    pub top_p: f64,
    pub stream: bool,
}

pub enum Completion {
    Complete(String),
    Streamed(FragmentStream),
}

impl Completion {
    /// Collapses the completion into one string, draining the stream in order.
    pub async fn into_text(self) -> Result<String, ProviderError> {
        match self {
            Completion::Complete(text) => Ok(text),
            Completion::Streamed(mut fragments) => {
                let mut text = String::new();
                let mut count = 0usize;
                while let Some(fragment) = fragments.next().await {
                    text.push_str(&fragment?);
                    count += 1;
                }
                tracing::debug!("Concatenated {} streamed fragments ({} bytes)", count, text.len());
                Ok(text)
            }
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Completion::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Completion::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Name shown on the status endpoint.
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    async fn complete(&self, params: CompletionParams) -> Result<Completion, ProviderError>;
}
