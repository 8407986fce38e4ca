// Copyright 2026 album-scraper contributors
// SPDX-License-Identifier: Apache-2.0

//! Page acquisition.
//!
//! A [`PageSource`] turns a URL into a [`Page`]: the HTML to parse plus what
//! the acquirer learned while fetching it. Two sources exist, the static
//! HTTP fetcher in [`http_client`] and the Chromium-backed
//! [`crate::renderer::chromium::RenderedSource`].

pub mod http_client;

use crate::config::{ScrapeConfig, Strategy};
use crate::error::AcquisitionError;
use crate::model::Readiness;
use crate::progress::Progress;
use crate::renderer::chromium::RenderedSource;
use async_trait::async_trait;
use std::time::Duration;

pub use http_client::StaticSource;

/// Raw HTML of one acquired page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Requested URL.
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    /// HTTP status, when the acquirer sees one.
    pub status: Option<u16>,
    pub readiness: Readiness,
    pub html: String,
}

impl Page {
    /// Reject pages with nothing to parse.
    pub fn ensure_content(self) -> Result<Self, AcquisitionError> {
        if self.html.trim().is_empty() {
            return Err(AcquisitionError::NoContent { url: self.url });
        }
        Ok(self)
    }
}

/// Something that can fetch a listing page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Short name for logs and progress output.
    fn name(&self) -> &'static str;

    /// Acquire `url`, giving up after `timeout`.
    async fn acquire(
        &self,
        url: &str,
        timeout: Duration,
        progress: &mut Progress,
    ) -> Result<Page, AcquisitionError>;
}

/// Build the source selected by `config.strategy`.
pub fn source_for(config: &ScrapeConfig) -> Result<Box<dyn PageSource>, AcquisitionError> {
    match config.strategy {
        Strategy::Static => Ok(Box::new(StaticSource::new(config.timeout)?)),
        Strategy::Rendered => Ok(Box::new(RenderedSource::new(config.browser.clone()))),
    }
}
