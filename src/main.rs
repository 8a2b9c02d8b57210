//! docsift main entry point
//!
//! This is the command-line interface for crawling a site into Markdown and
//! cleaning the resulting documents.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use docsift::cleaner::CleaningPipeline;
use docsift::config::{load_config_with_hash, Config};
use docsift::crawler::{CrawlRequest, Crawler};
use docsift::output::{print_cleaning_results, print_crawl_report};
use docsift::LogReporter;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// docsift: crawl a documentation site into Markdown and clean it up
///
/// `crawl` fetches every page reachable from a start URL within the same
/// site and writes one Markdown file per page. `clean` sends Markdown files
/// through a chat-completion service to strip navigation and boilerplate.
#[derive(Parser, Debug)]
#[command(name = "docsift")]
#[command(version)]
#[command(about = "Crawl a site into Markdown and clean the documents", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and write one Markdown file per page
    Crawl {
        /// Starting URL
        url: String,

        /// Output directory
        #[arg(short, long, default_value = "./out")]
        out: PathBuf,

        /// Extra request header, as `Name:Value` (repeatable)
        #[arg(long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
        headers: Vec<(String, String)>,

        /// Cookie, as `name=value` (repeatable)
        #[arg(long = "cookie", value_name = "NAME=VALUE", value_parser = parse_cookie)]
        cookies: Vec<(String, String)>,
    },

    /// Clean a Markdown file, or every Markdown file under a directory
    Clean {
        /// File or directory to clean
        path: PathBuf,

        /// API key for the rewrite service (overrides the config file)
        #[arg(long, env = "DOCSIFT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_ref())?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    match cli.command {
        Command::Crawl {
            url,
            out,
            headers,
            cookies,
        } => handle_crawl(&config, url, out, headers, cookies, cancel).await,
        Command::Clean { path, api_key } => handle_clean(config, path, api_key, cancel).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docsift=info,warn"),
            1 => EnvFilter::new("docsift=debug,info"),
            2 => EnvFilter::new("docsift=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Cancels `token` on Ctrl-C so the current run stops at its next checkpoint
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            token.cancel();
        }
    });
}

/// Handles the `crawl` subcommand
async fn handle_crawl(
    config: &Config,
    url: String,
    out: PathBuf,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut request = CrawlRequest::new(url, out);
    if !headers.is_empty() {
        request = request.with_headers(headers.into_iter().collect::<BTreeMap<_, _>>());
    }
    if !cookies.is_empty() {
        request = request.with_cookies(cookies.into_iter().collect::<BTreeMap<_, _>>());
    }

    let crawler = Crawler::new(&config.crawler).with_cancellation(cancel);
    let report = crawler
        .crawl(&request)
        .await
        .with_context(|| format!("Crawl of {} failed", request.start_url))?;

    print_crawl_report(&report);
    Ok(())
}

/// Handles the `clean` subcommand
async fn handle_clean(
    mut config: Config,
    path: PathBuf,
    api_key: Option<String>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    if let Some(key) = api_key {
        config.rewrite.api_key = key;
    }

    let pipeline = CleaningPipeline::from_config(&config.rewrite)
        .context("Cannot build the rewrite client (set --api-key or DOCSIFT_API_KEY)")?
        .with_cancellation(cancel);

    if path.is_dir() {
        let results = pipeline.clean_directory(&path, &LogReporter).await?;
        print_cleaning_results(&results);
        if results.iter().any(|r| !r.success) {
            bail!("Some files could not be cleaned");
        }
    } else {
        let result = pipeline.clean_file(&path, &LogReporter).await;
        print_cleaning_results(std::slice::from_ref(&result));
        if !result.success {
            bail!("{}", result.detail);
        }
    }

    Ok(())
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    split_pair(s, ':')
}

fn parse_cookie(s: &str) -> Result<(String, String), String> {
    split_pair(s, '=')
}

fn split_pair(s: &str, separator: char) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once(separator)
        .ok_or_else(|| format!("expected KEY{}VALUE, got '{}'", separator, s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty name in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
