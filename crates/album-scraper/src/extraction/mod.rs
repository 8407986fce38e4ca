// Copyright 2026 album-scraper contributors
// SPDX-License-Identifier: Apache-2.0

//! Parse acquired HTML and locate listing fragments.
//!
//! Both acquisition strategies end in the same place: a string of HTML that
//! is parsed here with the `scraper` crate (html5ever underneath) and
//! queried with CSS selectors.

pub mod rules;

use crate::acquisition::Page;
use crate::error::EnumerationError;
use crate::model::{DebugInfo, Readiness};
use scraper::{ElementRef, Html, Selector};

pub use rules::{FieldExtractor, Rule, RuleSet};

/// Length of the raw HTML excerpt carried in failure diagnostics.
pub const HTML_SAMPLE_CHARS: usize = 500;

/// A parsed page plus what the acquirer reported about it.
pub struct Document {
    html: Html,
    pub url: String,
    pub final_url: String,
    pub status: Option<u16>,
    pub readiness: Readiness,
    sample: String,
}

impl Document {
    /// Parse an acquired page.
    pub fn parse(page: Page) -> Self {
        let html = Html::parse_document(&page.html);
        Self {
            html,
            sample: html_sample(&page.html),
            url: page.url,
            final_url: page.final_url,
            status: page.status,
            readiness: page.readiness,
        }
    }

    /// Parse HTML that did not come from an acquirer, e.g. a saved page.
    pub fn from_html(url: &str, source: &str) -> Self {
        Self::parse(Page {
            url: url.to_string(),
            final_url: url.to_string(),
            status: None,
            readiness: Readiness::NotChecked,
            html: source.to_string(),
        })
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Trimmed `<title>` text, if any.
    pub fn title(&self) -> Option<String> {
        let sel = Selector::parse("title").ok()?;
        let title = self.html.select(&sel).next()?;
        let text = title.text().collect::<String>();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Whether `selector` matches anywhere in the document.
    pub fn contains(&self, selector: &str) -> bool {
        Selector::parse(selector)
            .map(|sel| self.html.select(&sel).next().is_some())
            .unwrap_or(false)
    }

    /// Diagnostics for a page that yielded nothing.
    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            page_title: Some(self.title().unwrap_or_else(|| "No title".to_string())),
            response_status: self.status,
            final_url: Some(self.final_url.clone()),
            readiness: Some(self.readiness),
            html_sample: Some(self.sample.clone()),
        }
    }
}

/// All elements matching `block_selector`, in document order.
///
/// An empty result is an error: the page loaded but its layout has no
/// listing, which is distinct from a search that found nothing to list.
pub fn enumerate<'a>(
    doc: &'a Document,
    block_selector: &str,
) -> Result<Vec<ElementRef<'a>>, EnumerationError> {
    let blocks: Vec<ElementRef<'a>> = match Selector::parse(block_selector) {
        Ok(sel) => doc.html.select(&sel).collect(),
        Err(e) => {
            tracing::warn!("listing selector {block_selector:?} does not parse: {e}");
            Vec::new()
        }
    };

    if blocks.is_empty() {
        return Err(EnumerationError::NoBlocks {
            debug_info: doc.debug_info(),
        });
    }
    Ok(blocks)
}

/// First [`HTML_SAMPLE_CHARS`] characters, cut on a char boundary.
fn html_sample(source: &str) -> String {
    source.trim().chars().take(HTML_SAMPLE_CHARS).collect()
}
