//! Axum route handlers for the cover letter API.

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::letter::form::{read_submission, FormError};
use crate::letter::pipeline::{generate_cover_letter, CoverLetterResponse};
use crate::state::AppState;

const FORM_PARSE_FAILURE: &str = "Failed to parse form data";

/// POST /api/generate-cover-letter
///
/// The credential is checked before the body is touched, so a misconfigured
/// server answers 500 without parsing anything. The multipart body is
/// extracted by hand for the same reason.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let Some(api_key) = state.config.gemini_api_key.clone() else {
        return Err(AppError::ServerMisconfigured(
            "Gemini API key not configured".to_string(),
        ));
    };

    let mut multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|rejection| {
            warn!("Multipart rejected: {rejection}");
            AppError::BadRequest(FORM_PARSE_FAILURE.to_string())
        })?;

    let submission = read_submission(
        &mut multipart,
        &state.config.upload_dir,
        state.config.max_upload_bytes,
    )
    .await
    .map_err(|e| match e {
        FormError::Io(io) => {
            AppError::Internal(anyhow::Error::new(io).context("failed to spool upload"))
        }
        other => {
            warn!("Form parse failed: {other}");
            AppError::BadRequest(FORM_PARSE_FAILURE.to_string())
        }
    })?;

    let response = generate_cover_letter(&state, &api_key, submission).await?;
    Ok(Json(response))
}

/// POST /api/generate-pdf
///
/// Server-side LaTeX compilation is not offered; the client is told how to
/// compile the downloaded markup locally.
pub async fn handle_generate_pdf() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(json!({
            "error": "PDF generation not available",
            "message": "PDF generation requires LaTeX to be installed on the server. Please download the LaTeX file and compile it locally using pdflatex, xelatex, or lualatex.",
            "instructions": [
                "1. Download the LaTeX file",
                "2. Install LaTeX on your system (TeX Live, MiKTeX, etc.)",
                "3. Run: pdflatex cover-letter.tex",
                "4. The PDF will be generated in the same directory"
            ]
        })),
    )
}

/// Fallback for any non-POST method on the API routes.
pub async fn handle_method_not_allowed() -> Result<(), AppError> {
    Err(AppError::MethodNotAllowed)
}
