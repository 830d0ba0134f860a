pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::letter::handlers;
use crate::state::AppState;

/// Headroom on top of two max-size uploads for the text field and multipart framing.
const BODY_LIMIT_HEADROOM: usize = 5 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = (state.config.max_upload_bytes as usize)
        .saturating_mul(2)
        .saturating_add(BODY_LIMIT_HEADROOM);

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/generate-cover-letter",
            post(handlers::handle_generate_cover_letter)
                .fallback(handlers::handle_method_not_allowed),
        )
        .route(
            "/api/generate-pdf",
            post(handlers::handle_generate_pdf).fallback(handlers::handle_method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
