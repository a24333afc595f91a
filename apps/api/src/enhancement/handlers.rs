//! Axum route handlers for the Enhancement API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enhancement::{EnhancementRequest, EnhancementResult};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub validation: Option<ValidationData>,
}

/// Optional fields the form wants checked alongside the enhancement.
#[derive(Debug, Default, Deserialize)]
pub struct ValidationData {
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub success: bool,
    pub enhanced_content: String,
    pub section: String,
}

#[derive(Debug, Deserialize)]
pub struct EnhanceAllRequest {
    pub sections: Vec<EnhancementRequest>,
}

#[derive(Debug, Serialize)]
pub struct EnhanceAllResponse {
    pub success: bool,
    pub batch_id: Uuid,
    pub results: Vec<EnhancementResult>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /enhance
///
/// Enhances one section. A model failure here fails the request, since the single
/// section is the whole batch.
pub async fn handle_enhance(
    State(state): State<AppState>,
    Json(request): Json<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>, AppError> {
    let section = request.section.unwrap_or_default();
    let content = request.content.unwrap_or_default();
    if section.trim().is_empty() || content.trim().is_empty() {
        return Err(AppError::Validation(
            "Missing section name or content".to_string(),
        ));
    }

    if let Some(phone) = request
        .validation
        .and_then(|v| v.phone)
        .filter(|p| !p.trim().is_empty())
    {
        validate_phone(&phone)?;
    }

    let result = state.enhancer.enhance_section(&section, &content).await?;

    Ok(Json(EnhanceResponse {
        success: true,
        enhanced_content: result.content,
        section: result.section,
    }))
}

/// POST /api/enhance-all
///
/// Enhances several sections concurrently. Individual failures keep the original
/// text and are reported per section through `outcome`.
pub async fn handle_enhance_all(
    State(state): State<AppState>,
    Json(request): Json<EnhanceAllRequest>,
) -> Result<Json<EnhanceAllResponse>, AppError> {
    if request.sections.is_empty() {
        return Err(AppError::Validation("sections cannot be empty".to_string()));
    }
    if request.sections.iter().any(|s| s.section.trim().is_empty()) {
        return Err(AppError::Validation(
            "every entry needs a section name".to_string(),
        ));
    }

    let batch = state.enhancer.enhance_all(request.sections).await?;

    Ok(Json(EnhanceAllResponse {
        success: true,
        batch_id: batch.batch_id,
        results: batch.results,
    }))
}

/// Phone numbers must carry 10 to 20 digits, country code included.
fn validate_phone(phone: &str) -> Result<(), AppError> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if digits < 10 {
        Err(AppError::Validation(
            "Phone number must have at least 10 digits (including country code)".to_string(),
        ))
    } else if digits > 20 {
        Err(AppError::Validation(
            "Phone number cannot exceed 20 digits (including country code)".to_string(),
        ))
    } else {
        Ok(())
    }
}
