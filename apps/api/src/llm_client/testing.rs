//! Scripted in-memory `TextGenerator` for handler and orchestrator tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;

use super::{BackendHealth, InvokeError, TextGenerator};

/// Scripted reply, chosen by the first needle found in the prompt.
pub enum Reply {
    Text(&'static str),
    Fail(fn() -> InvokeError),
    /// Sleeps until the caller's timeout, then times out.
    Hang,
    /// Sleeps for the given time, then answers.
    Slow(Duration, &'static str),
    /// Fails with a retryable error on the first call, then answers.
    FlakyOnce(&'static str),
    Panic,
}

pub struct ScriptedGenerator {
    script: Vec<(&'static str, Reply)>,
    configured: bool,
    health: BackendHealth,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<(&'static str, Reply)>) -> Self {
        Self {
            script,
            configured: true,
            health: BackendHealth {
                credentials_configured: true,
                reachable: true,
                model_available: true,
                error: None,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            health: BackendHealth::unconfigured("no credentials"),
            ..Self::new(Vec::new())
        }
    }

    /// Overrides what `probe` reports.
    pub fn with_health(mut self, health: BackendHealth) -> Self {
        self.health = health;
        self
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, InvokeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.configured {
            return Err(InvokeError::AuthMissing);
        }
        let Some((_, reply)) = self
            .script
            .iter()
            .find(|(needle, _)| prompt.contains(needle))
        else {
            return Err(InvokeError::EmptyContent);
        };
        match reply {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::Fail(make) => Err(make()),
            Reply::Hang => {
                tokio::time::sleep(timeout).await;
                Err(InvokeError::TimedOut(timeout))
            }
            Reply::Slow(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(text.to_string())
            }
            Reply::FlakyOnce(_) if call == 0 => {
                Err(InvokeError::Api {
                    status: 503,
                    message: "overloaded".to_string(),
                })
            }
            Reply::FlakyOnce(text) => Ok(text.to_string()),
            Reply::Panic => panic!("scripted panic"),
        }
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn probe(&self) -> BackendHealth {
        self.health.clone()
    }

    fn backend(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Base URL of a local server that accepts connections and never answers.
pub async fn silent_server_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

/// Base URL of a local port with nothing listening on it.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
