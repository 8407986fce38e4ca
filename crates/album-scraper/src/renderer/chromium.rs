//! Chromium-based renderer using chromiumoxide.

use super::{render_page, NavigationResult, RenderContext, RenderOptions, Renderer};
use crate::acquisition::{Page, PageSource};
use crate::config::{BrowserOptions, USER_AGENT};
use crate::error::AcquisitionError;
use crate::progress::{Progress, ProgressEventKind};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Known install locations, in the order they are tried.
///
/// The explicit path comes first, then container and distro paths, `PATH`
/// lookups, platform install directories and a local `drivers/` folder.
/// Only paths that exist are returned; duplicates are dropped.
pub fn browser_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(p) = explicit {
        if p.exists() {
            candidates.push(p.to_path_buf());
        } else {
            warn!("configured browser {} does not exist", p.display());
        }
    }

    // Container images (Alpine ships chromium-browser)
    for p in ["/usr/bin/chromium-browser", "/usr/bin/chromium"] {
        candidates.push(PathBuf::from(p));
    }

    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            candidates.push(path);
        }
    }

    if cfg!(target_os = "macos") {
        candidates.push(PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        ));
        candidates.push(PathBuf::from(
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ));
    }
    if cfg!(target_os = "windows") {
        candidates.push(PathBuf::from(
            "C:/Program Files/Google/Chrome/Application/chrome.exe",
        ));
        candidates.push(PathBuf::from(
            "C:/Program Files (x86)/Google/Chrome/Application/chrome.exe",
        ));
    }

    for p in ["drivers/chrome", "drivers/chrome.exe", "chrome", "chrome.exe"] {
        candidates.push(PathBuf::from(p));
    }

    let mut seen = Vec::new();
    candidates
        .into_iter()
        .filter(|p| p.is_file())
        .filter(|p| {
            let key = p.canonicalize().unwrap_or_else(|_| p.clone());
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        })
        .collect()
}

/// Polls the CDP handler; aborted when the renderer goes away.
struct HandlerTask(JoinHandle<()>);

impl Drop for HandlerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Chromium-based renderer.
///
/// Owns the browser process. [`Renderer::shutdown`] closes it gracefully;
/// dropping the renderer without shutdown kills it instead.
pub struct ChromiumRenderer {
    browser: Option<Browser>,
    _handler: HandlerTask,
}

impl ChromiumRenderer {
    async fn launch_with(
        executable: Option<&Path>,
        opts: &BrowserOptions,
    ) -> Result<Self, String> {
        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-plugins")
            .arg("--disable-background-networking")
            .arg("--disable-software-rasterizer")
            .arg("--blink-settings=imagesEnabled=false")
            .arg(format!("--user-agent={USER_AGENT}"))
            .request_timeout(opts.navigation_timeout);

        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        if !opts.sandbox {
            builder = builder.no_sandbox();
        }

        let config = builder
            .build()
            .map_err(|e| format!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| e.to_string())?;

        // Spawn the handler task
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler: {e}");
                }
            }
        });

        Ok(Self {
            browser: Some(browser),
            _handler: HandlerTask(handler),
        })
    }
}

/// Starts a browser from `executable`, or from the engine's own detection
/// when it is `None`.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(
        &self,
        executable: Option<&Path>,
        opts: &BrowserOptions,
    ) -> Result<Box<dyn Renderer>, String>;
}

/// Launches headless Chromium through chromiumoxide.
pub struct ChromiumLauncher;

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(
        &self,
        executable: Option<&Path>,
        opts: &BrowserOptions,
    ) -> Result<Box<dyn Renderer>, String> {
        Ok(Box::new(ChromiumRenderer::launch_with(executable, opts).await?))
    }
}

/// Try each candidate in order, then the launcher's own detection.
///
/// Returns the first renderer that starts and a description of its binary.
pub async fn launch_first(
    launcher: &dyn BrowserLauncher,
    candidates: &[PathBuf],
    opts: &BrowserOptions,
) -> Result<(Box<dyn Renderer>, String), AcquisitionError> {
    let mut failures = Vec::new();

    for path in candidates {
        match launcher.launch(Some(path.as_path()), opts).await {
            Ok(renderer) => return Ok((renderer, path.display().to_string())),
            Err(e) => {
                warn!("could not launch {}: {e}", path.display());
                failures.push(format!("{}: {e}", path.display()));
            }
        }
    }

    match launcher.launch(None, opts).await {
        Ok(renderer) => Ok((renderer, "auto-detected".to_string())),
        Err(e) => {
            failures.push(format!("auto-detect: {e}"));
            Err(AcquisitionError::ProcessLaunch(format!(
                "Chrome/Chromium not found or not launchable. Install it, add it to PATH \
                 or pass --chrome. Tried: {}",
                failures.join("; ")
            )))
        }
    }
}

impl Drop for ChromiumRenderer {
    fn drop(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            warn!("browser dropped without shutdown, killing process");
            if let Ok(rt) = tokio::runtime::Handle::try_current() {
                rt.spawn(async move {
                    if let Some(Err(e)) = browser.kill().await {
                        warn!("killing browser failed: {e}");
                    }
                });
            }
        }
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, AcquisitionError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| AcquisitionError::ProcessLaunch("browser already shut down".into()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AcquisitionError::Network(format!("failed to create new page: {e}")))?;

        Ok(Box::new(ChromiumContext { page }))
    }

    async fn shutdown(mut self: Box<Self>) -> Result<(), AcquisitionError> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        let closed = browser.close().await;
        // Reap the child whether or not the CDP close went through.
        let waited = browser.wait().await;

        closed.map_err(|e| AcquisitionError::ProcessLaunch(format!("browser close failed: {e}")))?;
        waited.map_err(|e| AcquisitionError::ProcessLaunch(format!("browser wait failed: {e}")))?;
        info!("browser closed");
        Ok(())
    }
}

/// Re-run `check` every [`POLL_INTERVAL`] until it returns true.
///
/// `Ok(false)` once `timeout` passes. An oversized timeout means no
/// deadline.
async fn poll_until<F, Fut>(timeout: Duration, mut check: F) -> Result<bool, AcquisitionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, AcquisitionError>>,
{
    let polled = tokio::time::timeout(timeout, async {
        loop {
            if check().await? {
                return Ok::<(), AcquisitionError>(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await;

    match polled {
        Ok(Ok(())) => Ok(true),
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(false),
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: CdpPage,
}

impl ChromiumContext {
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, AcquisitionError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| AcquisitionError::Network(format!("JS execution failed: {e}")))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(
        &mut self,
        url: &str,
        timeout: Duration,
    ) -> Result<NavigationResult, AcquisitionError> {
        let start = Instant::now();

        let loaded = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, CdpError>(())
        };
        let result = tokio::time::timeout(timeout, loaded).await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(())) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => Err(AcquisitionError::Network(format!("navigation failed: {e}"))),
            Err(_) => Err(AcquisitionError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, AcquisitionError> {
        let page = &self.page;
        poll_until(timeout, move || async move {
            Ok::<_, AcquisitionError>(page.find_element(selector).await.is_ok())
        })
        .await
    }

    async fn wait_for_ready(&self, timeout: Duration) -> Result<bool, AcquisitionError> {
        let ctx = self;
        poll_until(timeout, move || async move {
            let state = ctx.evaluate("document.readyState").await?;
            Ok::<_, AcquisitionError>(state.as_str() == Some("complete"))
        })
        .await
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value, AcquisitionError> {
        self.evaluate(script).await
    }

    async fn get_html(&self) -> Result<String, AcquisitionError> {
        let html = self.evaluate("document.documentElement.outerHTML").await?;
        Ok(html.as_str().unwrap_or_default().to_string())
    }

    async fn close(self: Box<Self>) -> Result<(), AcquisitionError> {
        self.page
            .close()
            .await
            .map_err(|e| AcquisitionError::Network(format!("closing page failed: {e}")))
    }
}

/// Rendered acquisition: launch a browser, render, always release it.
pub struct RenderedSource {
    options: BrowserOptions,
    launcher: Box<dyn BrowserLauncher>,
}

impl RenderedSource {
    pub fn new(options: BrowserOptions) -> Self {
        Self::with_launcher(options, Box::new(ChromiumLauncher))
    }

    pub fn with_launcher(options: BrowserOptions, launcher: Box<dyn BrowserLauncher>) -> Self {
        Self { options, launcher }
    }
}

#[async_trait]
impl PageSource for RenderedSource {
    fn name(&self) -> &'static str {
        "rendered"
    }

    async fn acquire(
        &self,
        url: &str,
        timeout: Duration,
        progress: &mut Progress,
    ) -> Result<Page, AcquisitionError> {
        progress.emit(ProgressEventKind::Fetching {
            url: url.to_string(),
            strategy: self.name().to_string(),
        });

        let candidates = browser_candidates(self.options.executable.as_deref());
        let (renderer, executable) =
            launch_first(self.launcher.as_ref(), &candidates, &self.options).await?;
        info!(%executable, "browser launched");
        progress.emit(ProgressEventKind::BrowserLaunched { executable });

        let opts = RenderOptions {
            navigation_timeout: self.options.navigation_timeout,
            marker_timeout: timeout,
            settle_delay: self.options.settle_delay,
        };
        render_page(renderer, url, &opts, progress).await
    }
}
