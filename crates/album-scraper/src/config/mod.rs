// Copyright 2026 album-scraper contributors
// SPDX-License-Identifier: Apache-2.0

//! Scrape configuration and its defaults.
//!
//! Everything is resolved from command-line arguments; there are no config
//! files and no application environment variables.

use crate::error::AcquisitionError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Listing page scraped when no target is given.
pub const DEFAULT_URL: &str = "https://www.albumoftheyear.org/search/?q=time";

/// Search endpoint used by `--query`.
pub const SEARCH_ENDPOINT: &str = "https://www.albumoftheyear.org/search/";

/// Output file written in verbose mode.
pub const DEFAULT_OUTPUT: &str = "albums_data.json";

/// Browser identity sent by both strategies.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                              AppleWebKit/537.36 (KHTML, like Gecko) \
                              Chrome/120.0.0.0 Safari/537.36";

/// Wait for lazy-loaded content after scrolling.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Upper bound on the initial navigation in the rendered strategy.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// How a page is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Drive a headless Chromium and read the rendered DOM.
    #[default]
    Rendered,
    /// Plain HTTP GET and offline HTML parsing.
    Static,
}

impl Strategy {
    /// Marker wait for `Rendered`, whole-request timeout for `Static`.
    pub fn default_timeout(self) -> Duration {
        match self {
            Self::Rendered => Duration::from_secs(10),
            Self::Static => Duration::from_secs(30),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rendered => write!(f, "rendered"),
            Self::Static => write!(f, "static"),
        }
    }
}

/// Browser launch settings for the rendered strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Explicit binary, tried before any discovered location.
    pub executable: Option<PathBuf>,
    /// Chromium's own sandbox. Containers usually need it off.
    pub sandbox: bool,
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            executable: None,
            sandbox: true,
            navigation_timeout: NAVIGATION_TIMEOUT,
            settle_delay: SETTLE_DELAY,
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    pub url: String,
    pub strategy: Strategy,
    pub timeout: Duration,
    /// Narrate progress on stdout and write `output`. Otherwise print one
    /// JSON line.
    pub verbose: bool,
    pub output: PathBuf,
    pub browser: BrowserOptions,
    /// Resolve relative `album_url`/`image_url` against the page URL.
    pub absolute_urls: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        let strategy = Strategy::default();
        Self {
            url: DEFAULT_URL.to_string(),
            strategy,
            timeout: strategy.default_timeout(),
            verbose: true,
            output: PathBuf::from(DEFAULT_OUTPUT),
            browser: BrowserOptions::default(),
            absolute_urls: false,
        }
    }
}

/// Build the search-results URL for `term` on the default site.
pub fn search_url(term: &str) -> Result<String, AcquisitionError> {
    let url = Url::parse_with_params(SEARCH_ENDPOINT, &[("q", term.trim())]).map_err(|e| {
        AcquisitionError::InvalidUrl {
            url: SEARCH_ENDPOINT.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(url.into())
}

/// Parse `raw` as an absolute http(s) URL.
pub fn validate_url(raw: &str) -> Result<Url, AcquisitionError> {
    let invalid = |reason: String| AcquisitionError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}
