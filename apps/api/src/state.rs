use std::sync::Arc;

use crate::config::Config;
use crate::letter::inputs::InputStore;
use crate::llm_client::TextGenerator;
use crate::render::DocumentRenderer;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything is immutable and behind `Arc`, so concurrent requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Gemini client in production; swapped for fakes in tests.
    pub generator: Arc<dyn TextGenerator>,
    /// Headless Chromium in production.
    pub renderer: Arc<dyn DocumentRenderer>,
    /// Bundled defaults + spooled uploads.
    pub inputs: Arc<dyn InputStore>,
}
