pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::enhancement::handlers as enhancement;
use crate::render::handlers as render;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Enhancement API
        .route("/enhance", post(enhancement::handle_enhance))
        .route("/api/enhance-all", post(enhancement::handle_enhance_all))
        // Document API
        .route("/api/generate", post(render::handle_generate_docx))
        .route("/api/generate-pdf", post(render::handle_generate_pdf))
        .with_state(state)
}
