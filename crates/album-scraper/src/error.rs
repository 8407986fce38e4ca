// Copyright 2026 album-scraper contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for acquisition, enumeration and extraction.

use crate::model::{DebugInfo, Field, ScrapeResult};
use std::time::Duration;

/// Failures while obtaining the page document.
#[derive(thiserror::Error, Debug)]
pub enum AcquisitionError {
    #[error("Timeout after {timeout:?} waiting for {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("Request error: {0}")]
    Network(String),

    #[error("Request error: HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Browser launch failed: {0}")]
    ProcessLaunch(String),

    #[error("No content returned for {url}")]
    NoContent { url: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl AcquisitionError {
    /// Diagnostics worth surfacing alongside the message.
    pub fn debug_info(&self) -> Option<DebugInfo> {
        match self {
            Self::Status { url, status } => Some(DebugInfo {
                response_status: Some(*status),
                final_url: Some(url.clone()),
                ..Default::default()
            }),
            _ => None,
        }
    }
}

/// The document loaded but held no listing fragments.
#[derive(thiserror::Error, Debug)]
pub enum EnumerationError {
    #[error("No album blocks found")]
    NoBlocks { debug_info: DebugInfo },
}

/// A single fragment could not be extracted. Always recovered by skipping
/// the fragment.
#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("invalid selector `{selector}` for {field}: {reason}")]
    Selector {
        field: Field,
        selector: String,
        reason: String,
    },
}

/// Pipeline-level failure: anything that turns a run into a `Failure`.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Enumeration(#[from] EnumerationError),
}

impl ScrapeError {
    pub fn debug_info(&self) -> Option<DebugInfo> {
        match self {
            Self::Acquisition(e) => e.debug_info(),
            Self::Enumeration(EnumerationError::NoBlocks { debug_info }) => {
                Some(debug_info.clone())
            }
        }
    }
}

impl From<ScrapeError> for ScrapeResult {
    fn from(err: ScrapeError) -> Self {
        let debug_info = err.debug_info();
        ScrapeResult::failure(err.to_string(), debug_info)
    }
}
