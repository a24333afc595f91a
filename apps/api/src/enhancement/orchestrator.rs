//! Section Orchestrator — runs registry lookup, prompt building, the model call and
//! sanitization for one section, and fans a batch of sections out concurrently.
//!
//! Failures are recovered per section: a section whose model call fails, times out,
//! panics or misses the batch deadline keeps the user's original text. Only a batch in
//! which every section that needed the model failed is reported as an error.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::enhancement::prompt_builder::build_prompt;
use crate::enhancement::sanitizer::sanitize;
use crate::enhancement::sections::SectionRegistry;
use crate::enhancement::EnhanceError;
use crate::llm_client::{InvokeError, TextGenerator};

/// First retry waits this long; each further retry doubles it.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Model output survived sanitization.
    Enhanced,
    /// Blank input; the model was not called.
    PassThrough,
    /// The original text was kept because enhancement failed for this section.
    Fallback,
    /// Section id not in the registry; the original text was kept.
    UnknownSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnhancementRequest {
    pub section: String,
    #[serde(default)]
    pub content: String,
}

impl EnhancementRequest {
    pub fn new(section: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnhancementResult {
    pub section: String,
    pub content: String,
    pub outcome: Outcome,
}

impl EnhancementResult {
    fn kept(request: &EnhancementRequest, outcome: Outcome) -> Self {
        Self {
            section: request.section.clone(),
            content: request.content.clone(),
            outcome,
        }
    }
}

/// Results of one `enhance_all` call, in request order.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeEnhancement {
    pub batch_id: Uuid,
    pub results: Vec<EnhancementResult>,
}

impl ResumeEnhancement {
    pub fn into_contents(self) -> Vec<String> {
        self.results.into_iter().map(|r| r.content).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnhancerSettings {
    /// Timeout for a single model call.
    pub section_timeout: Duration,
    /// Cap on the total wait of one batch.
    pub deadline: Duration,
    /// Max concurrent model calls per batch.
    pub concurrency: usize,
    /// Attempts per model call; retryable failures back off exponentially.
    pub max_attempts: u32,
}

impl EnhancerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            section_timeout: config.section_timeout,
            deadline: config.enhance_deadline,
            concurrency: config.enhance_concurrency,
            max_attempts: config.llm_max_attempts,
        }
    }
}

#[derive(Clone)]
pub struct Enhancer {
    registry: Arc<SectionRegistry>,
    generator: Arc<dyn TextGenerator>,
    settings: EnhancerSettings,
}

impl Enhancer {
    pub fn new(
        registry: Arc<SectionRegistry>,
        generator: Arc<dyn TextGenerator>,
        settings: EnhancerSettings,
    ) -> Self {
        Self {
            registry,
            generator,
            settings,
        }
    }

    /// Enhances a single section.
    ///
    /// Blank content passes through without a model call. Output that sanitizes to
    /// nothing, or an empty model reply, falls back to the original text. Transport
    /// failures and missing configuration are returned as errors for the caller to map.
    pub async fn enhance_section(
        &self,
        section: &str,
        content: &str,
    ) -> Result<EnhancementResult, EnhanceError> {
        let request = EnhancementRequest::new(section, content);
        let spec = self.registry.lookup(section)?;

        let Some(prompt) = build_prompt(spec, content) else {
            return Ok(EnhancementResult::kept(&request, Outcome::PassThrough));
        };

        if !self.generator.is_configured() {
            return Err(self.unavailable());
        }

        let raw = match self.invoke(spec.id, &prompt).await {
            Ok(raw) => raw,
            Err(InvokeError::EmptyContent) => {
                warn!(section = spec.id, "model returned no content; keeping original text");
                return Ok(EnhancementResult::kept(&request, Outcome::Fallback));
            }
            Err(err) => return Err(err.into()),
        };

        let sanitized = sanitize(spec, &raw, content);
        if sanitized.fell_back {
            warn!(
                section = spec.id,
                raw_len = raw.len(),
                "model output sanitized to nothing; keeping original text"
            );
            return Ok(EnhancementResult::kept(&request, Outcome::Fallback));
        }

        debug!(
            section = spec.id,
            input_len = content.len(),
            output_len = sanitized.text.len(),
            "section enhanced"
        );
        Ok(EnhancementResult {
            section: request.section,
            content: sanitized.text,
            outcome: Outcome::Enhanced,
        })
    }

    /// Enhances a batch of sections concurrently, bounded by `concurrency`, with each
    /// model call under `section_timeout` and the whole batch under `deadline`.
    ///
    /// Dropping the returned future (e.g. the client disconnected) drops the task set,
    /// which aborts every in-flight model call.
    pub async fn enhance_all(
        &self,
        requests: Vec<EnhancementRequest>,
    ) -> Result<ResumeEnhancement, EnhanceError> {
        let batch_id = Uuid::new_v4();
        let needs_model: Vec<bool> = requests
            .iter()
            .map(|r| !r.content.trim().is_empty() && self.registry.lookup(&r.section).is_ok())
            .collect();
        let attempted = needs_model.iter().filter(|n| **n).count();

        if attempted > 0 && !self.generator.is_configured() {
            return Err(self.unavailable());
        }

        info!(%batch_id, sections = requests.len(), attempted, "enhancing sections");

        let deadline = Instant::now() + self.settings.deadline;
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut slots: Vec<Option<EnhancementResult>> = vec![None; requests.len()];
        let mut failed = 0usize;

        let mut tasks = JoinSet::new();
        for (index, request) in requests.iter().enumerate() {
            let enhancer = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let request = request.clone();
            let needs_permit = needs_model[index];
            tasks.spawn(async move {
                let _permit = if needs_permit {
                    semaphore.acquire_owned().await.ok()
                } else {
                    None
                };
                let result = enhancer
                    .enhance_section(&request.section, &request.content)
                    .await;
                (index, result)
            });
        }

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, result)))) => {
                    let request = &requests[index];
                    slots[index] = Some(match result {
                        Ok(enhanced) => enhanced,
                        Err(EnhanceError::UnknownSection(_)) => {
                            debug!(%batch_id, section = %request.section, "unknown section kept as-is");
                            EnhancementResult::kept(request, Outcome::UnknownSection)
                        }
                        Err(err) => {
                            warn!(%batch_id, section = %request.section, error = %err, "section enhancement failed; keeping original text");
                            failed += 1;
                            EnhancementResult::kept(request, Outcome::Fallback)
                        }
                    });
                }
                // Panicked task; its slot stays empty and falls back below.
                Ok(Some(Err(join_err))) => {
                    warn!(%batch_id, error = %join_err, "section task aborted");
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(%batch_id, pending = tasks.len(), "enhancement deadline reached; abandoning pending sections");
                    tasks.abort_all();
                    break;
                }
            }
        }

        let results: Vec<EnhancementResult> = slots
            .into_iter()
            .zip(&requests)
            .zip(&needs_model)
            .map(|((slot, request), needed)| {
                slot.unwrap_or_else(|| {
                    if *needed {
                        failed += 1;
                    }
                    EnhancementResult::kept(request, Outcome::Fallback)
                })
            })
            .collect();

        if attempted > 0 && failed >= attempted {
            return Err(EnhanceError::AllSectionsFailed { attempted });
        }

        info!(%batch_id, failed, "enhancement batch complete");
        Ok(ResumeEnhancement { batch_id, results })
    }

    async fn invoke(&self, section: &str, prompt: &str) -> Result<String, InvokeError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self
                .generator
                .generate(prompt, self.settings.section_timeout)
                .await
            {
                Ok(text) => return Ok(text),
                Err(err) if attempt < max_attempts && err.is_retryable() => {
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                    warn!(
                        section,
                        attempt,
                        "model call failed ({err}), retrying after {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn unavailable(&self) -> EnhanceError {
        EnhanceError::BackendUnavailable(format!(
            "{} backend is not configured",
            self.generator.backend()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::llm_client::testing::{Reply, ScriptedGenerator};

    fn settings() -> EnhancerSettings {
        EnhancerSettings {
            section_timeout: Duration::from_secs(90),
            deadline: Duration::from_secs(180),
            concurrency: 4,
            max_attempts: 1,
        }
    }

    fn enhancer_with(generator: ScriptedGenerator, settings: EnhancerSettings) -> (Enhancer, Arc<ScriptedGenerator>) {
        let generator = Arc::new(generator);
        let enhancer = Enhancer::new(
            Arc::new(SectionRegistry::standard()),
            generator.clone(),
            settings,
        );
        (enhancer, generator)
    }

    fn transport() -> InvokeError {
        InvokeError::Transport("connection reset".to_string())
    }

    #[tokio::test]
    async fn test_failed_section_keeps_original_while_others_succeed() {
        let (enhancer, _) = enhancer_with(
            ScriptedGenerator::new(vec![
                ("seasoned dev", Reply::Fail(transport)),
                ("led migrations", Reply::Text("Led database migrations.")),
                ("rust, go", Reply::Text("Rust, Go")),
                ("a compiler", Reply::Text("Built a compiler.\n\nWrote a linter.")),
            ]),
            settings(),
        );

        let batch = enhancer
            .enhance_all(vec![
                EnhancementRequest::new("summary", "seasoned dev"),
                EnhancementRequest::new("experience", "led migrations"),
                EnhancementRequest::new("skills", "rust, go"),
                EnhancementRequest::new("projects", "a compiler\n\na linter"),
            ])
            .await
            .unwrap();

        let outcomes: Vec<Outcome> = batch.results.iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                Outcome::Fallback,
                Outcome::Enhanced,
                Outcome::Enhanced,
                Outcome::Enhanced
            ]
        );
        assert_eq!(batch.results[0].content, "seasoned dev");
        assert_eq!(batch.results[1].content, "Led database migrations.");
        assert_eq!(batch.results[2].content, "Rust, Go");
        assert_eq!(batch.results[3].content, "Built a compiler.\n\nWrote a linter.");
    }

    #[tokio::test]
    async fn test_unknown_section_is_returned_unchanged() {
        let (enhancer, generator) = enhancer_with(
            ScriptedGenerator::new(vec![("seasoned dev", Reply::Text("Seasoned developer."))]),
            settings(),
        );

        let batch = enhancer
            .enhance_all(vec![
                EnhancementRequest::new("not-a-section", "keep me"),
                EnhancementRequest::new("summary", "seasoned dev"),
            ])
            .await
            .unwrap();

        assert_eq!(batch.results[0].outcome, Outcome::UnknownSection);
        assert_eq!(batch.results[0].section, "not-a-section");
        assert_eq!(batch.results[0].content, "keep me");
        assert_eq!(batch.results[1].content, "Seasoned developer.");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_sections_pass_through_without_model_calls() {
        let (enhancer, generator) = enhancer_with(ScriptedGenerator::new(Vec::new()), settings());

        let registry = SectionRegistry::standard();
        for id in registry.ids() {
            let result = enhancer.enhance_section(id, "").await.unwrap();
            assert_eq!(result.outcome, Outcome::PassThrough);
            assert_eq!(result.content, "");
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_section_times_out_and_falls_back() {
        let (enhancer, _) = enhancer_with(
            ScriptedGenerator::new(vec![
                ("seasoned dev", Reply::Hang),
                ("led migrations", Reply::Text("Led database migrations.")),
            ]),
            settings(),
        );

        let batch = enhancer
            .enhance_all(vec![
                EnhancementRequest::new("summary", "seasoned dev"),
                EnhancementRequest::new("experience", "led migrations"),
            ])
            .await
            .unwrap();

        assert_eq!(batch.results[0].outcome, Outcome::Fallback);
        assert_eq!(batch.results[0].content, "seasoned dev");
        assert_eq!(batch.results[1].outcome, Outcome::Enhanced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_deadline_abandons_slow_sections() {
        let started = Instant::now();
        let (enhancer, _) = enhancer_with(
            ScriptedGenerator::new(vec![
                ("seasoned dev", Reply::Slow(Duration::from_secs(60), "Too late.")),
                ("led migrations", Reply::Text("Led database migrations.")),
            ]),
            EnhancerSettings {
                deadline: Duration::from_secs(5),
                ..settings()
            },
        );

        let batch = enhancer
            .enhance_all(vec![
                EnhancementRequest::new("summary", "seasoned dev"),
                EnhancementRequest::new("experience", "led migrations"),
            ])
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(batch.results[0].outcome, Outcome::Fallback);
        assert_eq!(batch.results[0].content, "seasoned dev");
        assert_eq!(batch.results[1].content, "Led database migrations.");
    }

    #[tokio::test]
    async fn test_panicking_section_is_isolated() {
        let (enhancer, _) = enhancer_with(
            ScriptedGenerator::new(vec![
                ("seasoned dev", Reply::Panic),
                ("led migrations", Reply::Text("Led database migrations.")),
            ]),
            settings(),
        );

        let batch = enhancer
            .enhance_all(vec![
                EnhancementRequest::new("summary", "seasoned dev"),
                EnhancementRequest::new("experience", "led migrations"),
            ])
            .await
            .unwrap();

        assert_eq!(batch.results[0].outcome, Outcome::Fallback);
        assert_eq!(batch.results[0].content, "seasoned dev");
        assert_eq!(batch.results[1].outcome, Outcome::Enhanced);
    }

    #[tokio::test]
    async fn test_every_section_failing_is_an_error() {
        let (enhancer, _) = enhancer_with(
            ScriptedGenerator::new(vec![
                ("seasoned dev", Reply::Fail(transport)),
                ("led migrations", Reply::Fail(transport)),
            ]),
            settings(),
        );

        let err = enhancer
            .enhance_all(vec![
                EnhancementRequest::new("summary", "seasoned dev"),
                EnhancementRequest::new("experience", "led migrations"),
                EnhancementRequest::new("skills", ""),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, EnhanceError::AllSectionsFailed { attempted: 2 }));
    }

    #[tokio::test]
    async fn test_unconfigured_backend_is_unavailable() {
        let (enhancer, generator) = enhancer_with(ScriptedGenerator::unconfigured(), settings());

        let err = enhancer
            .enhance_all(vec![EnhancementRequest::new("summary", "seasoned dev")])
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::BackendUnavailable(_)));

        let err = enhancer
            .enhance_section("summary", "seasoned dev")
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::BackendUnavailable(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

        // Nothing to enhance, so nothing is unavailable.
        let batch = enhancer
            .enhance_all(vec![EnhancementRequest::new("summary", "  ")])
            .await
            .unwrap();
        assert_eq!(batch.results[0].outcome, Outcome::PassThrough);
    }

    #[tokio::test]
    async fn test_single_section_errors_are_typed() {
        let (enhancer, _) = enhancer_with(
            ScriptedGenerator::new(vec![("seasoned dev", Reply::Fail(transport))]),
            settings(),
        );

        let err = enhancer
            .enhance_section("summary", "seasoned dev")
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::Upstream(InvokeError::Transport(_))));

        let err = enhancer
            .enhance_section("not-a-section", "text")
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::UnknownSection(_)));
    }

    #[tokio::test]
    async fn test_empty_or_unusable_model_output_falls_back() {
        let (enhancer, _) = enhancer_with(
            ScriptedGenerator::new(vec![
                ("seasoned dev", Reply::Fail(|| InvokeError::EmptyContent)),
                ("led migrations", Reply::Text("[Company Name] <N>")),
            ]),
            settings(),
        );

        let result = enhancer.enhance_section("summary", "seasoned dev").await.unwrap();
        assert_eq!(result.outcome, Outcome::Fallback);
        assert_eq!(result.content, "seasoned dev");

        let result = enhancer
            .enhance_section("experience", "led migrations")
            .await
            .unwrap();
        assert_eq!(result.outcome, Outcome::Fallback);
        assert_eq!(result.content, "led migrations");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_failure_is_retried_when_attempts_allow() {
        let (enhancer, generator) = enhancer_with(
            ScriptedGenerator::new(vec![("seasoned dev", Reply::FlakyOnce("Seasoned developer."))]),
            EnhancerSettings {
                max_attempts: 3,
                ..settings()
            },
        );

        let result = enhancer.enhance_section("summary", "seasoned dev").await.unwrap();
        assert_eq!(result.outcome, Outcome::Enhanced);
        assert_eq!(result.content, "Seasoned developer.");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_does_not_retry() {
        let (enhancer, generator) = enhancer_with(
            ScriptedGenerator::new(vec![("seasoned dev", Reply::FlakyOnce("Seasoned developer."))]),
            settings(),
        );

        let err = enhancer
            .enhance_section("summary", "seasoned dev")
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::Upstream(InvokeError::Api { status: 503, .. })));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrency_of_one_still_completes_in_order() {
        let (enhancer, _) = enhancer_with(
            ScriptedGenerator::new(vec![
                ("seasoned dev", Reply::Text("Seasoned developer.")),
                ("led migrations", Reply::Text("Led database migrations.")),
                ("rust, go", Reply::Text("Rust, Go")),
            ]),
            EnhancerSettings {
                concurrency: 1,
                ..settings()
            },
        );

        let batch = enhancer
            .enhance_all(vec![
                EnhancementRequest::new("skills", "rust, go"),
                EnhancementRequest::new("summary", "seasoned dev"),
                EnhancementRequest::new("experience", "led migrations"),
            ])
            .await
            .unwrap();

        let sections: Vec<&str> = batch.results.iter().map(|r| r.section.as_str()).collect();
        assert_eq!(sections, vec!["skills", "summary", "experience"]);
        assert!(batch.results.iter().all(|r| r.outcome == Outcome::Enhanced));
    }
}
