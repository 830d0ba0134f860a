//! LLM client: the single point of entry for all Gemini API calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! All LLM interactions MUST go through the `TextGenerator` trait.
//!
//! Model: gemini-1.5-pro (hardcoded, do not make configurable to prevent drift)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";
/// The model used for all LLM calls.
pub const MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error: {status} {reason}{}", detail_suffix(.detail))]
    Api {
        status: u16,
        reason: String,
        detail: Option<String>,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid response from Gemini API")]
    InvalidResponse,
}

/// Narrow seam over the remote text-generation service.
/// The pipeline only ever sees this trait, so tests can swap in fakes.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, api_key: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if the response has one.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini `generateContent` client. One attempt per call: no retry, no streaming.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
}

impl Default for LlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClient {
    pub fn new() -> Self {
        Self::with_endpoint(format!("{GEMINI_API_BASE}/{MODEL}:generateContent"))
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Makes a raw call to the Gemini API, returning the full response object.
    ///
    /// The key travels in a header and transport errors are stripped of their
    /// URL, so error text never carries the credential.
    pub async fn call(
        &self,
        prompt: &str,
        api_key: &str,
    ) -> Result<GenerateContentResponse, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(redact)?;

        let status = response.status();
        let body = response.text().await.map_err(redact)?;

        if !status.is_success() {
            warn!("Gemini API returned {}", status);
            let detail = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .ok();
            return Err(LlmError::Api {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                detail,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(parsed)
    }
}

fn redact(err: reqwest::Error) -> LlmError {
    LlmError::Http(err.without_url())
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str, api_key: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, api_key).await?;
        let text = response.text().ok_or(LlmError::InvalidResponse)?;
        Ok(strip_code_fences(text).to_string())
    }
}

/// Strips a surrounding ```latex ... ``` (or bare ``` ... ```) fence from LLM output.
/// Text without a leading fence is returned untouched.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("latex", "tex", ...) on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) if !rest[..idx].contains(char::is_whitespace) => &rest[idx + 1..],
        _ => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    use super::*;
    use crate::errors::AppError;

    #[test]
    fn test_strip_code_fences_with_latex_tag() {
        let input = "```latex\n\\opening{Hi,}\n```";
        assert_eq!(strip_code_fences(input), "\\opening{Hi,}");
    }

    #[test]
    fn test_strip_code_fences_without_tag() {
        let input = "```\n\\closing{Bye,}\n```";
        assert_eq!(strip_code_fences(input), "\\closing{Bye,}");
    }

    #[test]
    fn test_strip_code_fences_no_fences_is_untouched() {
        let input = "\\documentclass{letter}\n\n";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hello" }],
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"contents": [{"parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn test_response_text_extracts_first_candidate_part() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "first"}, {"text": "second"}], "role": "model"}},
                {"content": {"parts": [{"text": "other"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 40}
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("first"));
        assert_eq!(response.usage_metadata.unwrap().candidates_token_count, 40);
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_candidate_without_content_has_no_text() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_api_error_message_includes_status_and_detail() {
        let err = LlmError::Api {
            status: 429,
            reason: "Too Many Requests".to_string(),
            detail: Some("Resource has been exhausted".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Gemini API error: 429 Too Many Requests (Resource has been exhausted)"
        );
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        // Nothing listens on port 1, so the connect fails.
        let client = LlmClient::with_endpoint(format!(
            "http://127.0.0.1:1/v1beta/models/{MODEL}:generateContent"
        ));

        let err = client.generate("p", "SECRET-KEY-123").await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"));

        let response = AppError::Upstream(err).into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("Failed to generate cover letter"));
        assert!(!body.contains("SECRET-KEY-123"));
    }

    #[test]
    fn test_api_error_message_without_detail() {
        let err = LlmError::Api {
            status: 500,
            reason: "Internal Server Error".to_string(),
            detail: None,
        };
        assert_eq!(err.to_string(), "Gemini API error: 500 Internal Server Error");
    }
}
