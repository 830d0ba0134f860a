use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default per-file upload limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
///
/// The Gemini key is optional at startup: a missing key is reported per request
/// as a misconfiguration instead of preventing the server from booting.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Directory holding `default-resume.txt` and `default-cover-letter.tex`.
    pub defaults_dir: PathBuf,
    /// Where multipart uploads are spooled before being read.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub chrome_executable: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            defaults_dir: optional_env("DEFAULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(bundled_defaults_dir),
            upload_dir: optional_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_upload_bytes: match optional_env("MAX_UPLOAD_BYTES") {
                Some(raw) => raw
                    .parse::<u64>()
                    .context("MAX_UPLOAD_BYTES must be a positive integer")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
            chrome_executable: optional_env("CHROME_EXECUTABLE").map(PathBuf::from),
        })
    }
}

/// The `defaults/` directory shipped next to this crate's manifest.
pub fn bundled_defaults_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("defaults")
}

/// Reads an env var, treating empty values the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
