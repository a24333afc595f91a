use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm_client::BackendHealth;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    /// Backend reachable, but the configured model is not available.
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    fn from_probe(health: &BackendHealth) -> Self {
        if !health.credentials_configured || !health.reachable {
            HealthStatus::Unhealthy
        } else if !health.model_available {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
    pub model: String,
    #[serde(flatten)]
    pub probe: BackendHealth,
    pub sections: Vec<&'static str>,
    pub checked_at: DateTime<Utc>,
}

/// GET /health
/// Probes the model backend. Unhealthy is reported with 503, degraded with 200.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let probe = state.generator.probe().await;
    let status = HealthStatus::from_probe(&probe);
    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };

    (
        code,
        Json(HealthResponse {
            status,
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            backend: state.generator.backend(),
            model: state.generator.model().to_string(),
            probe,
            sections: state.registry.ids().to_vec(),
            checked_at: Utc::now(),
        }),
    )
}
