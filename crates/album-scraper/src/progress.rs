// Copyright 2026 album-scraper contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and the channel that carries them.
//!
//! The pipeline and the acquirers emit `ProgressEvent`s while a scrape runs.
//! Verbose mode subscribes and narrates them; silent mode passes no sender,
//! so emitting is a no-op.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A progress event emitted during a scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// Acquisition of `url` has begun.
    Fetching { url: String, strategy: String },
    /// A browser binary was launched.
    BrowserLaunched { executable: String },
    /// The page was scrolled to trigger lazy-loaded content.
    Scrolling,
    /// The page links to further results which are not followed.
    MoreResultsAvailable,
    /// Listing fragments located in the document.
    BlocksFound { count: usize },
    /// A record was extracted and kept.
    AlbumExtracted { index: usize, label: String },
    /// A fragment failed extraction and was skipped.
    BlockSkipped { index: usize, reason: String },
    /// Extraction finished.
    Completed { albums: usize },
    /// A non-fatal warning occurred.
    Warning { message: String },
}

impl fmt::Display for ProgressEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching { url, strategy } => write!(f, "Loading page ({strategy}): {url}"),
            Self::BrowserLaunched { executable } => write!(f, "Using browser: {executable}"),
            Self::Scrolling => write!(f, "Scrolling to load all content..."),
            Self::MoreResultsAvailable => write!(
                f,
                "Found 'View More' button - it links to a different page, \
                 only albums from this page are collected"
            ),
            Self::BlocksFound { count } => write!(f, "Found {count} album blocks"),
            Self::AlbumExtracted { index, label } => {
                write!(f, "Extracted album {}: {label}", index + 1)
            }
            Self::BlockSkipped { index, reason } => {
                write!(f, "Error processing album block {}: {reason}", index + 1)
            }
            Self::Completed { albums } => write!(f, "\nSuccessfully scraped {albums} albums"),
            Self::Warning { message } => write!(f, "Warning: {message}"),
        }
    }
}

/// Sender handle for emitting progress events.
///
/// Unbounded so that a burst of per-album events emitted between two await
/// points never lags the listener on a single-threaded runtime.
pub type ProgressSender = tokio::sync::mpsc::UnboundedSender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>;

/// Create a new progress channel.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Sequenced emitter around an optional sender.
#[derive(Debug, Default)]
pub struct Progress {
    tx: Option<ProgressSender>,
    seq: u64,
}

impl Progress {
    pub fn new(tx: Option<ProgressSender>) -> Self {
        Self { tx, seq: 0 }
    }

    /// An emitter that drops every event.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Emit an event, ignoring a closed or absent listener.
    pub fn emit(&mut self, event: ProgressEventKind) {
        if let Some(ref sender) = self.tx {
            self.seq += 1;
            let _ = sender.send(ProgressEvent {
                seq: self.seq,
                event,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_serialization() {
        let event = ProgressEvent {
            seq: 1,
            event: ProgressEventKind::BlocksFound { count: 42 },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("BlocksFound"));
        assert!(json.contains("42"));

        let parsed: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.seq, 1);
        assert_eq!(parsed.event, ProgressEventKind::BlocksFound { count: 42 });
    }

    #[test]
    fn test_emit_sequences_events() {
        let (tx, mut rx) = channel();
        let mut progress = Progress::new(Some(tx));
        progress.emit(ProgressEventKind::Scrolling);
        progress.emit(ProgressEventKind::Completed { albums: 3 });

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!((first.seq, second.seq), (1, 2));
        assert_eq!(second.event, ProgressEventKind::Completed { albums: 3 });
    }

    #[test]
    fn test_emit_with_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);
        // Should not panic
        Progress::new(Some(tx)).emit(ProgressEventKind::Scrolling);
    }

    #[test]
    fn test_silent_is_noop() {
        let mut progress = Progress::silent();
        progress.emit(ProgressEventKind::Warning {
            message: "test".to_string(),
        });
        assert_eq!(progress.seq, 0);
    }

    #[test]
    fn test_display_uses_one_based_index() {
        let event = ProgressEventKind::AlbumExtracted {
            index: 0,
            label: "Foo - Bar".into(),
        };
        assert_eq!(event.to_string(), "Extracted album 1: Foo - Bar");
    }
}
