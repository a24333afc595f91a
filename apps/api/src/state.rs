use std::sync::Arc;

use crate::config::Config;
use crate::enhancement::orchestrator::EnhancerSettings;
use crate::enhancement::{Enhancer, SectionRegistry};
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Backend selected by `LLM_BACKEND`; also probed by `/health`.
    pub generator: Arc<dyn TextGenerator>,
    /// Immutable after startup.
    pub registry: Arc<SectionRegistry>,
    pub enhancer: Enhancer,
}

impl AppState {
    pub fn new(config: &Config, generator: Arc<dyn TextGenerator>) -> Self {
        let registry = Arc::new(SectionRegistry::standard());
        let enhancer = Enhancer::new(
            Arc::clone(&registry),
            Arc::clone(&generator),
            EnhancerSettings::from_config(config),
        );
        Self {
            generator,
            registry,
            enhancer,
        }
    }
}
