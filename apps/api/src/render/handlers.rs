//! Axum route handlers for document generation.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::models::resume::ResumeData;
use crate::render::document::ResumeDocument;
use crate::render::{
    docx::render_docx, docx_filename, pdf::render_pdf, pdf_filename, RenderError,
    DOCX_CONTENT_TYPE, PDF_CONTENT_TYPE,
};
use crate::state::AppState;

/// POST /api/generate
///
/// Builds a DOCX from the payload. Content is enhanced unless `enhance` is false.
pub async fn handle_generate_docx(
    State(state): State<AppState>,
    Json(mut data): Json<ResumeData>,
) -> Result<Response, AppError> {
    if data.enhance.unwrap_or(true) {
        enhance_resume(&state, &mut data).await?;
    }

    let document = ResumeDocument::from_resume(&data);
    let filename = docx_filename(&document.theme);
    let bytes = render_blocking(document, |doc| render_docx(&doc)).await?;

    info!(bytes = bytes.len(), %filename, "DOCX generated");
    attachment(bytes, DOCX_CONTENT_TYPE, &filename)
}

/// POST /api/generate-pdf
///
/// Builds a PDF from the payload. Content is enhanced only when `enhance` is true.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    Json(mut data): Json<ResumeData>,
) -> Result<Response, AppError> {
    if data.enhance.unwrap_or(false) {
        enhance_resume(&state, &mut data).await?;
    }

    let document = ResumeDocument::from_resume(&data);
    let filename = pdf_filename(&data.personal_info.full_name);
    let bytes = render_blocking(document, |doc| render_pdf(&doc)).await?;

    info!(bytes = bytes.len(), %filename, "PDF generated");
    attachment(bytes, PDF_CONTENT_TYPE, &filename)
}

async fn enhance_resume(state: &AppState, data: &mut ResumeData) -> Result<(), AppError> {
    let enhanced = state
        .enhancer
        .enhance_all(data.enhancement_requests())
        .await?;
    data.apply_enhancements(enhanced.into_contents());
    Ok(())
}

async fn render_blocking<F>(document: ResumeDocument, render: F) -> Result<Vec<u8>, AppError>
where
    F: FnOnce(ResumeDocument) -> Result<Vec<u8>, RenderError> + Send + 'static,
{
    let bytes = tokio::task::spawn_blocking(move || render(document))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(bytes)
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
