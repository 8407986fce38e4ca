//! Command-line arguments and the two output modes of the binary.
//!
//! With no target the scraper narrates its progress, saves indented JSON
//! and prints a short sample. Given a URL (or `--query`) it prints exactly
//! one compact JSON line on stdout for a calling process to parse.

pub mod output;

use crate::config::{
    search_url, BrowserOptions, ScrapeConfig, Strategy, DEFAULT_OUTPUT, DEFAULT_URL,
};
use crate::error::{AcquisitionError, ScrapeError};
use crate::model::ScrapeResult;
use crate::pipeline::Pipeline;
use crate::progress::{self, Progress, ProgressReceiver};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "album-scraper",
    about = "Scrape album listings from an albumoftheyear.org search page",
    version,
    after_help = "Without URL or --query, scrapes the default search, narrates progress and \
                  saves the result to a file.\nWith a target, prints one JSON line on stdout."
)]
pub struct Args {
    /// Search results page to scrape
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Search term; scrapes the site's search page for it
    #[arg(long, value_name = "TERM", conflicts_with = "url")]
    pub query: Option<String>,

    /// How the page is acquired
    #[arg(long, value_enum, default_value_t = Strategy::Rendered)]
    pub strategy: Strategy,

    /// Seconds to wait: listing marker for rendered, whole request for static
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// File written in verbose mode
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Browser executable, tried before any discovered one
    #[arg(long, value_name = "PATH")]
    pub chrome: Option<PathBuf>,

    /// Launch the browser without its sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Resolve album and image URLs against the page URL
    #[arg(long)]
    pub absolute_urls: bool,

    /// Narrate and save to a file even when a target is given
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print only the JSON line even without a target
    #[arg(short, long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// Narrate unless a target was given, with explicit flags winning.
    pub fn is_verbose(&self) -> bool {
        if self.verbose {
            return true;
        }
        if self.quiet {
            return false;
        }
        self.url.is_none() && self.query.is_none()
    }

    /// Directive used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> String {
        match &self.log_level {
            Some(level) => level.clone(),
            None if self.is_verbose() => "info".to_string(),
            None => "warn".to_string(),
        }
    }

    /// Resolve the arguments into a [`ScrapeConfig`].
    pub fn to_config(&self) -> Result<ScrapeConfig, AcquisitionError> {
        let url = match (&self.url, &self.query) {
            (Some(url), _) => url.clone(),
            (None, Some(term)) => search_url(term)?,
            (None, None) => DEFAULT_URL.to_string(),
        };
        let timeout = self
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.strategy.default_timeout());

        Ok(ScrapeConfig {
            url,
            strategy: self.strategy,
            timeout,
            verbose: self.is_verbose(),
            output: self.output.clone(),
            browser: BrowserOptions {
                executable: self.chrome.clone(),
                sandbox: !self.no_sandbox,
                ..BrowserOptions::default()
            },
            absolute_urls: self.absolute_urls,
        })
    }
}

/// Process exit status for `result`: silent runs always answer with JSON
/// and succeed, verbose runs fail on a `Failure`.
pub fn exit_status(verbose: bool, result: &ScrapeResult) -> u8 {
    if verbose && !result.is_success() {
        1
    } else {
        0
    }
}

/// Run one scrape in the mode `config` asks for and return the exit status.
pub async fn execute(config: &ScrapeConfig) -> Result<u8> {
    if config.verbose {
        run_verbose(config).await
    } else {
        run_silent(config).await
    }
}

/// Run the pipeline, turning a setup error into a `Failure` like any other.
pub async fn scrape(config: &ScrapeConfig, progress: &mut Progress) -> ScrapeResult {
    match Pipeline::from_config(config) {
        Ok(pipeline) => pipeline.run(&config.url, progress).await,
        Err(e) => ScrapeError::from(e).into(),
    }
}

async fn run_silent(config: &ScrapeConfig) -> Result<u8> {
    let result = scrape(config, &mut Progress::silent()).await;
    println!("{}", output::to_compact_json(&result)?);
    Ok(exit_status(false, &result))
}

async fn run_verbose(config: &ScrapeConfig) -> Result<u8> {
    println!("Starting Album of the Year scraper ({})...", config.strategy);

    let (tx, rx) = progress::channel();
    let scraping = async move {
        let mut progress = Progress::new(Some(tx));
        scrape(config, &mut progress).await
    };
    let (result, ()) = tokio::join!(scraping, narrate(rx));

    match &result {
        ScrapeResult::Success(records) => {
            output::write_pretty(&config.output, &result)?;
            println!("Data saved to {}", config.output.display());
            output::write_sample(&mut std::io::stdout().lock(), records)?;
        }
        ScrapeResult::Failure { error, debug_info } => {
            println!("Error: {error}");
            if let Some(info) = debug_info {
                println!("{}", serde_json::to_string_pretty(info)?);
            }
        }
    }
    Ok(exit_status(true, &result))
}

/// Print progress events until the scrape drops its sender.
async fn narrate(mut rx: ProgressReceiver) {
    while let Some(event) = rx.recv().await {
        println!("{}", event.event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("album-scraper").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_no_target_is_verbose_default_run() {
        let args = parse(&[]);
        assert!(args.is_verbose());
        assert_eq!(args.log_filter(), "info");

        let config = args.to_config().unwrap();
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.strategy, Strategy::Rendered);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.output, PathBuf::from("albums_data.json"));
        assert!(config.browser.sandbox);
    }

    #[test]
    fn test_url_target_is_silent() {
        let args = parse(&["https://www.albumoftheyear.org/search/?q=kid"]);
        assert!(!args.is_verbose());
        assert_eq!(args.log_filter(), "warn");
        assert_eq!(
            args.to_config().unwrap().url,
            "https://www.albumoftheyear.org/search/?q=kid"
        );
    }

    #[test]
    fn test_query_builds_search_url() {
        let config = parse(&["--query", "kid a"]).to_config().unwrap();
        assert_eq!(config.url, "https://www.albumoftheyear.org/search/?q=kid+a");
        assert!(!config.verbose);
    }

    #[test]
    fn test_query_conflicts_with_url() {
        let res = Args::try_parse_from(["album-scraper", "https://example.com", "--query", "x"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_explicit_mode_flags_win() {
        assert!(parse(&["https://example.com", "--verbose"]).is_verbose());
        assert!(!parse(&["--quiet"]).is_verbose());
        assert!(Args::try_parse_from(["album-scraper", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_exit_status_by_mode() {
        let failure = ScrapeResult::failure("No album blocks found", None);
        let empty = ScrapeResult::Success(vec![]);
        assert_eq!(exit_status(false, &failure), 0);
        assert_eq!(exit_status(true, &failure), 1);
        assert_eq!(exit_status(true, &empty), 0);
    }

    #[test]
    fn test_static_strategy_timeout_and_overrides() {
        let config = parse(&["--strategy", "static"]).to_config().unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));

        let config = parse(&[
            "--strategy",
            "static",
            "--timeout",
            "5",
            "--chrome",
            "/opt/chrome",
            "--no-sandbox",
            "--absolute-urls",
            "--log-level",
            "debug",
        ]);
        assert_eq!(config.log_filter(), "debug");
        let config = config.to_config().unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.browser.executable, Some(PathBuf::from("/opt/chrome")));
        assert!(!config.browser.sandbox);
        assert!(config.absolute_urls);
    }
}
