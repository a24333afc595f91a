//! Ollama backend — a local model runner reached over its HTTP API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{truncate_body, BackendHealth, InvokeError, TextGenerator, CLIENT_TIMEOUT, PROBE_TIMEOUT};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: Option<String>,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, model: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(CLIENT_TIMEOUT)
                .build()
                .context("Failed to build HTTP client")?,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            model,
        })
    }

    async fn send(&self, base_url: &str, prompt: &str, timeout: Duration) -> Result<String, InvokeError> {
        let response = self
            .client
            .post(format!("{base_url}/api/generate"))
            .timeout(timeout)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| InvokeError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Ollama returned {}: {}", status, truncate_body(&body));
            return Err(InvokeError::Api {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| InvokeError::from_reqwest(e, timeout))?;
        debug!("Ollama call succeeded: eval_count={:?}", generated.eval_count);

        if generated.response.trim().is_empty() {
            return Err(InvokeError::EmptyContent);
        }
        Ok(generated.response)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, InvokeError> {
        let base_url = self.base_url.as_deref().ok_or(InvokeError::AuthMissing)?;

        match tokio::time::timeout(timeout, self.send(base_url, prompt, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(InvokeError::TimedOut(timeout)),
        }
    }

    fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    async fn probe(&self) -> BackendHealth {
        let Some(base_url) = self.base_url.as_deref() else {
            return BackendHealth::unconfigured("OLLAMA_URL not set");
        };

        let response = self
            .client
            .get(format!("{base_url}/api/tags"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        let response = match response.and_then(|r| r.error_for_status()) {
            Ok(r) => r,
            Err(e) => return BackendHealth::unreachable(e.to_string()),
        };

        let model_available = match response.json::<TagList>().await {
            Ok(tags) => tags.models.iter().any(|m| model_matches(&m.name, &self.model)),
            Err(_) => false,
        };

        BackendHealth {
            credentials_configured: true,
            reachable: true,
            model_available,
            error: None,
        }
    }

    fn backend(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama lists untagged pulls as `name:latest`.
fn model_matches(listed: &str, wanted: &str) -> bool {
    listed == wanted || (!wanted.contains(':') && listed == format!("{wanted}:latest"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{closed_port_url, silent_server_url};

    fn local_client(base_url: String) -> OllamaClient {
        OllamaClient {
            client: Client::builder().no_proxy().build().unwrap(),
            ..OllamaClient::new(Some(base_url), "gemma3:270m".to_string()).unwrap()
        }
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out() {
        let client = local_client(silent_server_url().await);
        let timeout = Duration::from_millis(200);
        let result = client.generate("prompt", timeout).await;
        assert!(
            matches!(result, Err(InvokeError::TimedOut(t)) if t == timeout),
            "{result:?}"
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let client = local_client(closed_port_url().await);
        let result = client.generate("prompt", Duration::from_secs(5)).await;
        assert!(matches!(result, Err(InvokeError::Transport(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_missing_endpoint_fails_with_auth_missing() {
        let client = OllamaClient::new(None, "gemma3:270m".to_string()).unwrap();
        let result = client.generate("prompt", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(InvokeError::AuthMissing)));
        assert!(!client.is_configured());
    }

    #[test]
    fn test_model_matches_latest_tag() {
        assert!(model_matches("llama3:latest", "llama3"));
        assert!(model_matches("gemma3:270m", "gemma3:270m"));
        assert!(!model_matches("gemma3:1b", "gemma3:270m"));
    }

    #[test]
    fn test_generate_response_parses_non_streaming_body() {
        let json = r#"{"model":"gemma3:270m","response":"Polished text","done":true,"eval_count":12}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.response, "Polished text");
        assert_eq!(parsed.eval_count, Some(12));
    }
}
