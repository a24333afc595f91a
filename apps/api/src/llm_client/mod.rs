//! LLM Client — the single point of entry for all text-generation calls.
//!
//! ARCHITECTURAL RULE: No other module may talk to a model backend directly.
//! Enhancement code depends only on the `TextGenerator` trait.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::{Config, LlmBackend};

pub mod groq;
pub mod ollama;
pub mod prompts;
#[cfg(test)]
pub(crate) mod testing;

pub use groq::GroqClient;
pub use ollama::OllamaClient;

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("no credential or model endpoint is configured")]
    AuthMissing,

    #[error("model call timed out after {0:?}")]
    TimedOut(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned empty content")]
    EmptyContent,
}

impl InvokeError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            InvokeError::TimedOut(_) | InvokeError::Transport(_) => true,
            InvokeError::Api { status, .. } => *status == 429 || *status >= 500,
            InvokeError::AuthMissing | InvokeError::EmptyContent => false,
        }
    }

    /// Maps a reqwest failure, keeping timeouts distinct from other transport faults.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            InvokeError::TimedOut(timeout)
        } else {
            InvokeError::Transport(err.to_string())
        }
    }
}

/// Result of probing a backend for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BackendHealth {
    pub credentials_configured: bool,
    pub reachable: bool,
    pub model_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackendHealth {
    pub fn unconfigured(reason: &str) -> Self {
        Self {
            credentials_configured: false,
            reachable: false,
            model_available: false,
            error: Some(reason.to_string()),
        }
    }

    pub fn unreachable(error: String) -> Self {
        Self {
            credentials_configured: true,
            reachable: false,
            model_available: false,
            error: Some(error),
        }
    }
}

/// A text-generation backend. Carried in `AppState` as `Arc<dyn TextGenerator>`.
///
/// One call is one attempt: implementations never retry internally, and must
/// return `TimedOut` rather than run past `timeout`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, InvokeError>;

    /// False when no credential / endpoint is configured; such a backend fails every
    /// call with `AuthMissing`.
    fn is_configured(&self) -> bool;

    async fn probe(&self) -> BackendHealth;

    fn backend(&self) -> &'static str;

    fn model(&self) -> &str;
}

/// Builds the backend selected by `LLM_BACKEND`.
pub fn build_generator(config: &Config) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let generator: Arc<dyn TextGenerator> = match config.llm_backend {
        LlmBackend::Groq => Arc::new(GroqClient::new(
            config.groq_api_key.clone(),
            config.groq_base_url.clone(),
            config.groq_model.clone(),
        )?),
        LlmBackend::Ollama => Arc::new(OllamaClient::new(
            config.ollama_url.clone(),
            config.ollama_model.clone(),
        )?),
    };
    Ok(generator)
}

/// Upper bound applied to reqwest on top of the per-call `tokio::time::timeout`.
pub(crate) const CLIENT_TIMEOUT: Duration = Duration::from_secs(300);
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Truncates an error body so a misbehaving backend cannot flood the logs.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}…")
    }
}
