use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::render::RenderError;

/// Summary reported for every failure inside the generation pipeline.
pub const PIPELINE_FAILURE: &str = "Failed to generate cover letter";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Server misconfigured: {0}")]
    ServerMisconfigured(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] LlmError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ServerMisconfigured(_)
            | AppError::Upstream(_)
            | AppError::Render(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details) = match &self {
            AppError::MethodNotAllowed => ("Method not allowed".to_string(), None),
            AppError::BadRequest(msg) => (msg.clone(), None),
            AppError::ServerMisconfigured(msg) => {
                tracing::error!("Server misconfigured: {msg}");
                (msg.clone(), None)
            }
            AppError::Upstream(e) => {
                tracing::error!("LLM error: {e}");
                (PIPELINE_FAILURE.to_string(), Some(e.to_string()))
            }
            AppError::Render(e) => {
                tracing::error!("Render error: {e}");
                (PIPELINE_FAILURE.to_string(), Some(e.to_string()))
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {e}");
                (PIPELINE_FAILURE.to_string(), Some(e.to_string()))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                ("Server error".to_string(), Some(e.to_string()))
            }
        };

        let body = match details {
            Some(details) => json!({ "error": error, "details": details }),
            None => json!({ "error": error }),
        };

        (status, Json(body)).into_response()
    }
}
