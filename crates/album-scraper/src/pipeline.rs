// Copyright 2026 album-scraper contributors
// SPDX-License-Identifier: Apache-2.0

//! Acquire → enumerate → extract → assemble.
//!
//! [`Pipeline::run`] always produces a [`ScrapeResult`]. Acquisition and
//! enumeration errors short-circuit to `Failure`; per-fragment extraction
//! errors only drop that fragment.

use crate::acquisition::{self, PageSource};
use crate::config::{validate_url, ScrapeConfig};
use crate::error::{AcquisitionError, ScrapeError};
use crate::extraction::{enumerate, Document, FieldExtractor};
use crate::model::{AlbumRecord, ScrapeResult};
use crate::progress::{Progress, ProgressEventKind};
use scraper::ElementRef;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// One configured scrape.
pub struct Pipeline {
    source: Box<dyn PageSource>,
    extractor: FieldExtractor,
    timeout: Duration,
    absolute_urls: bool,
}

impl Pipeline {
    pub fn new(source: Box<dyn PageSource>, extractor: FieldExtractor, timeout: Duration) -> Self {
        Self {
            source,
            extractor,
            timeout,
            absolute_urls: false,
        }
    }

    /// Pipeline for `config`, using the default rule set.
    pub fn from_config(config: &ScrapeConfig) -> Result<Self, AcquisitionError> {
        let source = acquisition::source_for(config)?;
        Ok(Self::new(source, FieldExtractor::default(), config.timeout)
            .with_absolute_urls(config.absolute_urls))
    }

    pub fn with_absolute_urls(mut self, absolute_urls: bool) -> Self {
        self.absolute_urls = absolute_urls;
        self
    }

    /// Scrape `url`. Never panics on network or layout problems.
    pub async fn run(&self, url: &str, progress: &mut Progress) -> ScrapeResult {
        match self.try_run(url, progress).await {
            Ok(result) => result,
            Err(e) => {
                warn!("scrape of {url} failed: {e}");
                e.into()
            }
        }
    }

    async fn try_run(
        &self,
        url: &str,
        progress: &mut Progress,
    ) -> Result<ScrapeResult, ScrapeError> {
        validate_url(url)?;
        let page = self.source.acquire(url, self.timeout, progress).await?;
        let doc = Document::parse(page);
        process_document(&doc, &self.extractor, self.absolute_urls, progress)
    }
}

/// Enumerate and extract an already parsed document.
pub fn process_document(
    doc: &Document,
    extractor: &FieldExtractor,
    absolute_urls: bool,
    progress: &mut Progress,
) -> Result<ScrapeResult, ScrapeError> {
    let blocks = enumerate(doc, extractor.rules().block)?;
    info!(count = blocks.len(), "album blocks found");
    progress.emit(ProgressEventKind::BlocksFound {
        count: blocks.len(),
    });

    if doc.contains(extractor.rules().more_results) {
        progress.emit(ProgressEventKind::MoreResultsAvailable);
    }

    let base = if absolute_urls {
        Url::parse(&doc.final_url).ok()
    } else {
        None
    };

    Ok(assemble(extractor, &blocks, base.as_ref(), progress))
}

/// Extract each fragment independently and keep the identifiable records,
/// in fragment order.
pub fn assemble(
    extractor: &FieldExtractor,
    fragments: &[ElementRef<'_>],
    base: Option<&Url>,
    progress: &mut Progress,
) -> ScrapeResult {
    let mut records = Vec::with_capacity(fragments.len());

    for (index, fragment) in fragments.iter().enumerate() {
        let record = match extractor.extract(*fragment) {
            Ok(record) => record,
            Err(e) => {
                warn!(index, "skipping album block: {e}");
                progress.emit(ProgressEventKind::BlockSkipped {
                    index,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !record.is_identifiable() {
            debug!(index, "album block has neither artist nor album, skipped");
            continue;
        }

        let record = match base {
            Some(base) => resolve_urls(record, base),
            None => record,
        };
        progress.emit(ProgressEventKind::AlbumExtracted {
            index,
            label: record.label(),
        });
        records.push(record);
    }

    progress.emit(ProgressEventKind::Completed {
        albums: records.len(),
    });
    ScrapeResult::Success(records)
}

/// Make `album_url` and `image_url` absolute against `base`.
pub fn resolve_urls(record: AlbumRecord, base: &Url) -> AlbumRecord {
    let resolve = |href: Option<String>| {
        href.map(|h| base.join(&h).map(String::from).unwrap_or(h))
    };
    AlbumRecord {
        image_url: resolve(record.image_url),
        album_url: resolve(record.album_url),
        ..record
    }
}
