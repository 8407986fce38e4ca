// Copyright 2026 album-scraper contributors
// SPDX-License-Identifier: Apache-2.0

//! Album listing scraper for albumoftheyear.org search pages.
//!
//! A page is acquired either by driving a headless Chromium
//! ([`renderer::chromium::RenderedSource`]) or by a plain HTTP GET
//! ([`acquisition::StaticSource`]). Both feed the same extractor, and every
//! run ends in a [`model::ScrapeResult`]: an array of records or an error
//! object.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod renderer;

pub use config::{ScrapeConfig, Strategy};
pub use model::{AlbumRecord, ScrapeResult};
pub use pipeline::Pipeline;
