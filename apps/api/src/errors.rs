use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Enhancement unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Upstream model error: {0}")]
    Upstream(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UnknownSection(_) => StatusCode::BAD_REQUEST,
            AppError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Render(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::UnknownSection(section) => {
                ("UNKNOWN_SECTION", format!("Unknown section '{section}'"))
            }
            AppError::BackendUnavailable(reason) => {
                tracing::warn!("Enhancement unavailable: {reason}");
                (
                    "BACKEND_UNAVAILABLE",
                    "Enhancement is unavailable: the model backend is not configured".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream model error: {msg}");
                (
                    "UPSTREAM_ERROR",
                    "The model backend failed to enhance the content".to_string(),
                )
            }
            AppError::Render(msg) => {
                tracing::error!("Render error: {msg}");
                (
                    "RENDER_ERROR",
                    "The document could not be generated".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
            "code": code,
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_of(AppError::Validation("content is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "content is required");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::UnknownSection("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::BackendUnavailable("no key".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Upstream("reset".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Render("zip".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_not_leaked() {
        let (status, body) =
            body_of(AppError::Internal(anyhow::anyhow!("secret stack detail"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("secret"));
    }
}
