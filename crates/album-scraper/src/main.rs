// Copyright 2026 album-scraper contributors
// SPDX-License-Identifier: Apache-2.0

use album_scraper::cli::{self, Args};
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_filter()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!("album-scraper v{}", env!("CARGO_PKG_VERSION"));

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            // A bad --query still answers with the usual error object
            let result: album_scraper::ScrapeResult =
                album_scraper::error::ScrapeError::from(e).into();
            println!("{}", cli::output::to_compact_json(&result)?);
            return Ok(ExitCode::from(cli::exit_status(args.is_verbose(), &result)));
        }
    };

    Ok(ExitCode::from(cli::execute(&config).await?))
}
