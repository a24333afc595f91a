//! Groq backend — OpenAI-compatible chat completions over HTTPS.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{truncate_body, BackendHealth, InvokeError, TextGenerator, CLIENT_TIMEOUT, PROBE_TIMEOUT};

const TEMPERATURE: f32 = 0.3;
const MAX_COMPLETION_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_completion_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions client for Groq (or any OpenAI-compatible endpoint).
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: Option<String>, base_url: String, model: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(CLIENT_TIMEOUT)
                .build()
                .context("Failed to build HTTP client")?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    async fn send(&self, api_key: &str, prompt: &str, timeout: Duration) -> Result<String, InvokeError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_completion_tokens: MAX_COMPLETION_TOKENS,
            top_p: 1.0,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .timeout(timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| InvokeError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate_body(&body));
            warn!("Groq API returned {}: {}", status, message);
            return Err(InvokeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| InvokeError::from_reqwest(e, timeout))?;

        if let Some(usage) = &chat.usage {
            debug!(
                "Groq call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(InvokeError::EmptyContent)
    }
}

#[async_trait]
impl TextGenerator for GroqClient {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, InvokeError> {
        let api_key = self.api_key.as_deref().ok_or(InvokeError::AuthMissing)?;

        match tokio::time::timeout(timeout, self.send(api_key, prompt, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(InvokeError::TimedOut(timeout)),
        }
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn probe(&self) -> BackendHealth {
        let Some(api_key) = self.api_key.as_deref() else {
            return BackendHealth::unconfigured("GROQ_API_KEY not set");
        };

        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(api_key)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        let response = match response.and_then(|r| r.error_for_status()) {
            Ok(r) => r,
            Err(e) => return BackendHealth::unreachable(e.to_string()),
        };

        // Some accounts do not list every model; an empty list counts as available.
        let model_available = match response.json::<ModelList>().await {
            Ok(list) => list.data.is_empty() || list.data.iter().any(|m| m.id == self.model),
            Err(_) => true,
        };

        BackendHealth {
            credentials_configured: true,
            reachable: true,
            model_available,
            error: None,
        }
    }

    fn backend(&self) -> &'static str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
