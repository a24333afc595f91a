// Section enhancement: registry → prompt → model call → sanitizer, per section.
// All model calls go through llm_client::TextGenerator; nothing here speaks HTTP to a backend.

pub mod handlers;
pub mod orchestrator;
pub mod prompt_builder;
pub mod sanitizer;
pub mod sections;

use thiserror::Error;

use crate::errors::AppError;
use crate::llm_client::InvokeError;

pub use orchestrator::{EnhancementRequest, EnhancementResult, Enhancer, Outcome};
pub use sections::SectionRegistry;

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("enhancement unavailable: {0}")]
    BackendUnavailable(String),

    #[error("model call failed: {0}")]
    Upstream(InvokeError),

    #[error("all {attempted} sections failed to enhance")]
    AllSectionsFailed { attempted: usize },
}

impl From<InvokeError> for EnhanceError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::AuthMissing => EnhanceError::BackendUnavailable(err.to_string()),
            other => EnhanceError::Upstream(other),
        }
    }
}

impl From<EnhanceError> for AppError {
    fn from(err: EnhanceError) -> Self {
        match err {
            EnhanceError::UnknownSection(section) => AppError::UnknownSection(section),
            EnhanceError::BackendUnavailable(reason) => AppError::BackendUnavailable(reason),
            EnhanceError::Upstream(_) | EnhanceError::AllSectionsFailed { .. } => {
                AppError::Upstream(err.to_string())
            }
        }
    }
}
