use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::agent::input_types::Message;

/// Failure reported by a structured-generation provider
#[derive(Debug, Error)]
pub enum LLMError {
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an unusable response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl LLMError {
    /// The HTTP client gave up waiting on the provider
    pub fn is_timeout(&self) -> bool {
        matches!(self, LLMError::Transport { source, .. } if source.is_timeout())
    }
}

/// Interface for a stateless structured-generation provider.
/// Stateless means the provider keeps no memory between calls; everything it
/// needs arrives with the request.
#[async_trait]
pub trait StatelessLLMInterface: Send + Sync {
    /// Provider name used in logs and health output
    fn name(&self) -> &str;

    /// Model identifier sent to the provider
    fn model(&self) -> &str;

    /// Generate a JSON object constrained to `schema`.
    ///
    /// The returned value is whatever the provider produced; callers must
    /// still validate it.
    async fn structured_completion(
        &self,
        messages: Vec<Message>,
        system: &str,
        schema: &Value,
    ) -> Result<Value, LLMError>;
}
