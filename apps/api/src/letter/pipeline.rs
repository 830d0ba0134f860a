//! Cover letter generation: orchestrates the full request pipeline.
//!
//! Flow: validate → resolve inputs → compose prompt → LLM generate →
//!       normalize markup → render PDF → base64 encode → respond.
//!
//! Strictly linear: one submission yields exactly one prompt, one draft,
//! one HTML document and one PDF. Nothing is shared across requests.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::letter::form::Submission;
use crate::letter::inputs::{resolve, DefaultResource};
use crate::letter::normalizer::normalize;
use crate::letter::prompts::build_cover_letter_prompt;
use crate::state::AppState;

/// Success payload returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterResponse {
    /// The generated LaTeX markup, for preview and download.
    pub cover_letter: String,
    /// The rendered PDF, base64-encoded.
    pub pdf_data: String,
}

/// Resume and template text after defaults have been applied.
#[derive(Debug, Clone)]
pub struct ResolvedInputs {
    pub resume: String,
    pub sample_template: String,
}

/// Runs the full generation pipeline for one validated request.
///
/// Steps:
/// 1. reject a missing or empty job description (no upstream call)
/// 2. resolve resume + template (upload or default; uploads deleted after read)
/// 3. build_cover_letter_prompt()
/// 4. generator.generate()
/// 5. normalize() → HTML
/// 6. renderer.render() → PDF bytes
/// 7. base64 encode
pub async fn generate_cover_letter(
    state: &AppState,
    api_key: &str,
    submission: Submission,
) -> Result<CoverLetterResponse, AppError> {
    let request_id = Uuid::new_v4();
    run(state, api_key, submission)
        .instrument(info_span!("cover_letter", %request_id))
        .await
}

async fn run(
    state: &AppState,
    api_key: &str,
    submission: Submission,
) -> Result<CoverLetterResponse, AppError> {
    let Submission {
        job_description,
        resume,
        sample_cover_letter,
    } = submission;

    // Step 1: Validate. Unread uploads are dropped here, which deletes them.
    let job_description = match job_description {
        Some(jd) if !jd.is_empty() => jd,
        _ => {
            return Err(AppError::BadRequest(
                "Job description is required".to_string(),
            ))
        }
    };

    // Step 2: Resolve inputs. Both are resolved before either error surfaces,
    // so every uploaded temp file is read and deleted even if the first fails.
    let resume = resolve(state.inputs.as_ref(), resume, DefaultResource::Resume).await;
    let sample_template = resolve(
        state.inputs.as_ref(),
        sample_cover_letter,
        DefaultResource::CoverLetterTemplate,
    )
    .await;
    let inputs = ResolvedInputs {
        resume: resume?,
        sample_template: sample_template?,
    };

    // Step 3: Prompt
    let prompt = build_cover_letter_prompt(
        &inputs.resume,
        &job_description,
        &inputs.sample_template,
    );

    // Step 4: Generate
    info!("Requesting cover letter draft ({} prompt chars)", prompt.len());
    let cover_letter = state.generator.generate(&prompt, api_key).await?;
    info!("Draft received ({} chars)", cover_letter.len());

    // Step 5: Normalize
    let html = normalize(&cover_letter);

    // Step 6: Render
    let pdf = state.renderer.render(&html).await?;

    // Step 7: Encode
    let pdf_data = STANDARD.encode(&pdf);
    info!("Cover letter ready ({} PDF bytes)", pdf.len());

    Ok(CoverLetterResponse {
        cover_letter,
        pdf_data,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
