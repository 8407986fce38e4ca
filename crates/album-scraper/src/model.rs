// Copyright 2026 album-scraper contributors
// SPDX-License-Identifier: Apache-2.0

//! Records and results produced by a scrape.
//!
//! The JSON shapes here are the program's output contract: an array of
//! [`AlbumRecord`] on success, or an `{"error": ..., "debug_info": ...}`
//! object on failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One album entry lifted from a listing page.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRecord {
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub release_date: Option<String>,
    pub record_type: Option<String>,
    pub image_url: Option<String>,
    pub album_url: Option<String>,
}

impl AlbumRecord {
    /// A record is worth keeping only if it names an artist or an album.
    pub fn is_identifiable(&self) -> bool {
        self.artist_name.is_some() || self.album_name.is_some()
    }

    /// `Artist - Album`, with `Unknown` standing in for missing halves.
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.artist_name.as_deref().unwrap_or("Unknown"),
            self.album_name.as_deref().unwrap_or("Unknown"),
        )
    }

    /// Fields in serialized order, for field-by-field printing.
    pub fn fields(&self) -> [(Field, Option<&str>); 6] {
        [
            (Field::ArtistName, self.artist_name.as_deref()),
            (Field::AlbumName, self.album_name.as_deref()),
            (Field::ReleaseDate, self.release_date.as_deref()),
            (Field::RecordType, self.record_type.as_deref()),
            (Field::ImageUrl, self.image_url.as_deref()),
            (Field::AlbumUrl, self.album_url.as_deref()),
        ]
    }
}

/// Names of the extractable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ArtistName,
    AlbumName,
    ReleaseDate,
    RecordType,
    ImageUrl,
    AlbumUrl,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ArtistName => "artist_name",
            Self::AlbumName => "album_name",
            Self::ReleaseDate => "release_date",
            Self::RecordType => "record_type",
            Self::ImageUrl => "image_url",
            Self::AlbumUrl => "album_url",
        };
        f.write_str(name)
    }
}

/// How an acquirer decided the page was ready to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// The listing marker appeared in the rendered DOM.
    Marker,
    /// The marker never appeared; the page was read once the document
    /// reported itself complete.
    DocumentReady,
    /// Static fetches have no readiness signal.
    NotChecked,
}

/// Diagnostic payload attached to a failed scrape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness: Option<Readiness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_sample: Option<String>,
}

/// Outcome of one pipeline run.
///
/// Serializes untagged: `Success` becomes a bare JSON array, `Failure`
/// becomes an object with an `error` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeResult {
    Success(Vec<AlbumRecord>),
    Failure {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        debug_info: Option<DebugInfo>,
    },
}

impl ScrapeResult {
    pub fn failure(message: impl Into<String>, debug_info: Option<DebugInfo>) -> Self {
        Self::Failure {
            error: message.into(),
            debug_info,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Records on success, `None` on failure.
    pub fn records(&self) -> Option<&[AlbumRecord]> {
        match self {
            Self::Success(records) => Some(records),
            Self::Failure { .. } => None,
        }
    }

    /// Error message on failure, `None` on success.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}
