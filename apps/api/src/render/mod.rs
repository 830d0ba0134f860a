//! Document rendering: styled HTML → A4 PDF bytes via headless Chromium.
//!
//! The pipeline depends only on the `DocumentRenderer` trait. `ChromiumRenderer`
//! launches a fresh browser per render and always tears it down, even when the
//! render itself fails.

use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A4 paper, in inches (the unit Chrome's print API expects).
pub const A4_WIDTH_IN: f64 = 8.27;
pub const A4_HEIGHT_IN: f64 = 11.69;
/// Uniform page margin, in inches.
pub const PAGE_MARGIN_IN: f64 = 1.0;

const BROWSER_ARGS: [&str; 4] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-gpu",
    "--disable-dev-shm-usage",
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to configure browser: {0}")]
    Config(String),

    #[error("Failed to launch browser: {0}")]
    Launch(#[source] CdpError),

    #[error("Browser error: {0}")]
    Cdp(#[from] CdpError),

    #[error("Renderer produced an empty document")]
    EmptyOutput,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Print settings applied to every rendered page.
pub fn pdf_params() -> PrintToPdfParams {
    PrintToPdfParams {
        paper_width: Some(A4_WIDTH_IN),
        paper_height: Some(A4_HEIGHT_IN),
        margin_top: Some(PAGE_MARGIN_IN),
        margin_bottom: Some(PAGE_MARGIN_IN),
        margin_left: Some(PAGE_MARGIN_IN),
        margin_right: Some(PAGE_MARGIN_IN),
        print_background: Some(true),
        ..Default::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
}

impl ChromiumRenderer {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    fn browser_config(&self) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .new_headless_mode()
            .args(BROWSER_ARGS.to_vec());
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(RenderError::Config)
    }

    async fn launch(&self) -> Result<BrowserSession, RenderError> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(RenderError::Launch)?;

        // The CDP handler must be polled for the browser to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!("Headless browser launched");
        Ok(BrowserSession {
            browser,
            handler_task,
        })
    }
}

#[async_trait]
impl DocumentRenderer for ChromiumRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let session = self.launch().await?;
        render_in_session(session, html).await
    }
}

/// One live renderer instance, good for a single print.
#[async_trait]
trait PrintSession: Send + Sync + Sized {
    async fn print(&self, html: &str) -> Result<Vec<u8>, RenderError>;

    /// Releases the instance. Failures are logged, never returned.
    async fn close(self);
}

/// Prints once, then closes the session whether or not the print succeeded.
async fn render_in_session<S: PrintSession>(
    session: S,
    html: &str,
) -> Result<Vec<u8>, RenderError> {
    let result = session.print(html).await;
    session.close().await;

    let pdf = result?;
    if pdf.is_empty() {
        return Err(RenderError::EmptyOutput);
    }
    info!("Rendered PDF ({} bytes)", pdf.len());
    Ok(pdf)
}

/// A launched browser plus the task driving its CDP connection.
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl PrintSession for BrowserSession {
    async fn print(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let page = self.browser.new_page("about:blank").await?;
        page.set_content(html).await?;
        let pdf = page.pdf(pdf_params()).await?;
        Ok(pdf)
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close headless browser cleanly: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to reap headless browser process: {e}");
        }
        if let Err(e) = self.handler_task.await {
            warn!("Browser handler task ended abnormally: {e}");
        }
        debug!("Headless browser closed");
    }
}
