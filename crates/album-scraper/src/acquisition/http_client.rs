//! Static acquisition: one HTTP GET through reqwest.
//!
//! Not a browser. No scripts run, so the page must ship its listing markup
//! in the initial response.

use super::{Page, PageSource};
use crate::config::USER_AGENT;
use crate::error::AcquisitionError;
use crate::model::Readiness;
use crate::progress::{Progress, ProgressEventKind};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;
use tracing::{debug, info};

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// HTTP page source. The inner client keeps its connection pool across
/// calls, which is safe because calls are strictly sequential.
#[derive(Clone)]
pub struct StaticSource {
    client: reqwest::Client,
}

impl StaticSource {
    /// Create a client with a browser-like header set and a hard timeout.
    pub fn new(timeout: Duration) -> Result<Self, AcquisitionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        // gzip/deflate are negotiated by reqwest itself
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| AcquisitionError::Network(describe(&e)))?;

        Ok(Self { client })
    }

    /// Perform a single GET. Non-2xx statuses are errors.
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, AcquisitionError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                AcquisitionError::Timeout {
                    url: url.to_string(),
                    timeout,
                }
            } else {
                AcquisitionError::Network(describe(&e))
            }
        };

        let r = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_err)?;

        let status = r.status();
        let final_url = r.url().to_string();
        debug!(%url, %final_url, status = status.as_u16(), "GET complete");

        if !status.is_success() {
            return Err(AcquisitionError::Status {
                url: final_url,
                status: status.as_u16(),
            });
        }

        let body = r.text().await.map_err(map_err)?;

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl PageSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
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
        info!(%url, "fetching page");

        let resp = self.get(url, timeout).await?;
        Page {
            url: resp.url,
            final_url: resp.final_url,
            status: Some(resp.status),
            readiness: Readiness::NotChecked,
            html: resp.body,
        }
        .ensure_content()
    }
}

/// reqwest's top-level message hides the cause; append the source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
