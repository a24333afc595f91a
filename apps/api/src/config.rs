use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_GROQ_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "gemma3:270m";

/// Which text-generation backend serves enhancement calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Groq,
    Ollama,
}

impl LlmBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(LlmBackend::Groq),
            "ollama" => Ok(LlmBackend::Ollama),
            other => bail!("LLM_BACKEND must be 'groq' or 'ollama', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// Nothing here is required: a missing credential is reported by the health
/// endpoint and by enhancement calls, not at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_backend: LlmBackend,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub groq_base_url: String,
    pub ollama_url: Option<String>,
    pub ollama_model: String,
    pub section_timeout: Duration,
    pub enhance_deadline: Duration,
    pub enhance_concurrency: usize,
    pub llm_max_attempts: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_backend = match get("LLM_BACKEND") {
            Some(raw) => LlmBackend::parse(&raw)?,
            None => LlmBackend::Groq,
        };

        let enhance_concurrency: usize = parse_or(&get, "ENHANCE_CONCURRENCY", 4)?;
        if enhance_concurrency == 0 {
            bail!("ENHANCE_CONCURRENCY must be at least 1");
        }
        let llm_max_attempts: u32 = parse_or(&get, "LLM_MAX_ATTEMPTS", 1)?;
        if llm_max_attempts == 0 {
            bail!("LLM_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Config {
            llm_backend,
            groq_api_key: get("GROQ_API_KEY").map(|k| k.trim().to_string()),
            groq_model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            groq_base_url: get("GROQ_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            // An explicitly empty OLLAMA_URL means "no local runner configured".
            ollama_url: match lookup("OLLAMA_URL") {
                Some(url) if url.trim().is_empty() => None,
                Some(url) => Some(url.trim().to_string()),
                None => Some(DEFAULT_OLLAMA_URL.to_string()),
            },
            ollama_model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            section_timeout: Duration::from_secs(parse_or(&get, "SECTION_TIMEOUT_SECS", 90)?),
            enhance_deadline: Duration::from_secs(parse_or(&get, "ENHANCE_DEADLINE_SECS", 180)?),
            enhance_concurrency,
            llm_max_attempts,
            port: parse_or(&get, "PORT", 5000)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.llm_backend, LlmBackend::Groq);
        assert!(config.groq_api_key.is_none());
        assert_eq!(config.groq_model, DEFAULT_GROQ_MODEL);
        assert_eq!(config.ollama_url.as_deref(), Some(DEFAULT_OLLAMA_URL));
        assert_eq!(config.section_timeout, Duration::from_secs(90));
        assert_eq!(config.enhance_deadline, Duration::from_secs(180));
        assert_eq!(config.enhance_concurrency, 4);
        assert_eq!(config.llm_max_attempts, 1);
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_blank_api_key_is_treated_as_missing() {
        let config = config_from(&[("GROQ_API_KEY", "   ")]).unwrap();
        assert!(config.groq_api_key.is_none());
    }

    #[test]
    fn test_backend_selection_is_case_insensitive() {
        let config = config_from(&[("LLM_BACKEND", "Ollama")]).unwrap();
        assert_eq!(config.llm_backend, LlmBackend::Ollama);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(config_from(&[("LLM_BACKEND", "openai")]).is_err());
    }

    #[test]
    fn test_empty_ollama_url_means_unconfigured() {
        let config = config_from(&[("OLLAMA_URL", "")]).unwrap();
        assert!(config.ollama_url.is_none());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = config_from(&[("PORT", "not-a-port")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        assert!(config_from(&[("ENHANCE_CONCURRENCY", "0")]).is_err());
    }
}
