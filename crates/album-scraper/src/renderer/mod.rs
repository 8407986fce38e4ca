//! Renderer abstraction for browser-based page acquisition.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide), and
//! [`render_page`], which owns the renderer for the duration of one
//! acquisition and always shuts it down.

pub mod chromium;

use crate::error::AcquisitionError;
use crate::model::Readiness;
use crate::progress::{Progress, ProgressEventKind};
use crate::acquisition::Page;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

/// Selector whose presence means the listing has rendered.
pub const LISTING_MARKER: &str = ".albumBlock";

/// Scrolls to the bottom so lazy-loaded blocks materialize.
pub const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Result of navigating to a URL.
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// Timing knobs for one rendered acquisition.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub navigation_timeout: Duration,
    /// Wait for [`LISTING_MARKER`], then for document readiness.
    pub marker_timeout: Duration,
    pub settle_delay: Duration,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, AcquisitionError>;
    /// Shut down the browser engine and release its process.
    async fn shutdown(self: Box<Self>) -> Result<(), AcquisitionError>;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(
        &mut self,
        url: &str,
        timeout: Duration,
    ) -> Result<NavigationResult, AcquisitionError>;
    /// Poll for `selector` until it matches or `timeout` passes.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, AcquisitionError>;
    /// Poll until `document.readyState` is `complete` or `timeout` passes.
    async fn wait_for_ready(&self, timeout: Duration) -> Result<bool, AcquisitionError>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value, AcquisitionError>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String, AcquisitionError>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<(), AcquisitionError>;
}

/// Render `url` with `renderer`, then shut the renderer down.
///
/// Shutdown runs whatever the render produced; a failed shutdown is logged
/// and never replaces the render outcome.
pub async fn render_page(
    renderer: Box<dyn Renderer>,
    url: &str,
    opts: &RenderOptions,
    progress: &mut Progress,
) -> Result<Page, AcquisitionError> {
    let outcome = render_with(renderer.as_ref(), url, opts, progress).await;

    if let Err(e) = renderer.shutdown().await {
        warn!("browser shutdown failed: {e}");
    }

    outcome
}

async fn render_with(
    renderer: &dyn Renderer,
    url: &str,
    opts: &RenderOptions,
    progress: &mut Progress,
) -> Result<Page, AcquisitionError> {
    let mut ctx = renderer.new_context().await?;
    let outcome = drive_context(&mut *ctx, url, opts, progress).await;

    if let Err(e) = ctx.close().await {
        warn!("closing browser tab failed: {e}");
    }

    outcome
}

async fn drive_context(
    ctx: &mut dyn RenderContext,
    url: &str,
    opts: &RenderOptions,
    progress: &mut Progress,
) -> Result<Page, AcquisitionError> {
    let nav = ctx.navigate(url, opts.navigation_timeout).await?;
    info!(%url, load_time_ms = nav.load_time_ms, "page loaded");

    let readiness = if ctx.wait_for_selector(LISTING_MARKER, opts.marker_timeout).await? {
        Readiness::Marker
    } else {
        warn!(
            "listing marker {LISTING_MARKER} absent after {:?}, reading page once the document is ready",
            opts.marker_timeout
        );
        progress.emit(ProgressEventKind::Warning {
            message: format!("Timeout waiting for {LISTING_MARKER}"),
        });
        if !ctx.wait_for_ready(opts.marker_timeout).await? {
            warn!("document never reported readyState=complete");
        }
        Readiness::DocumentReady
    };

    progress.emit(ProgressEventKind::Scrolling);
    ctx.execute_js(SCROLL_SCRIPT).await?;
    tokio::time::sleep(opts.settle_delay).await;

    let html = ctx.get_html().await?;

    Page {
        url: url.to_string(),
        final_url: nav.final_url,
        status: None,
        readiness,
        html,
    }
    .ensure_content()
}
