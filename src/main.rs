//! yp-harvest main entry point
//!
//! This is the command-line interface for the yp-harvest listing scraper.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yp_harvest::config::{load_config_with_hash, validate, Config};
use yp_harvest::crawler::crawl;
use yp_harvest::output::print_report;

/// yp-harvest: a proxied business-directory harvester
///
/// Crawls Yellow Pages search results page by page with a pool of
/// concurrent workers, rotating through a proxy list, and writes every
/// listing found to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "yp-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A proxied business-directory harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Search term, e.g. "Handyman"
    #[arg(short = 'Q', long)]
    query: Option<String>,

    /// Location, e.g. "All States" or a postcode
    #[arg(short, long)]
    location: Option<String>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Proxy list file, one host:port per line
    #[arg(short, long, value_name = "FILE")]
    proxies: Option<PathBuf>,

    /// Output CSV path (defaults to <query>_<date>.csv)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(query) = &self.query {
            config.target.query = query.clone();
        }
        if let Some(location) = &self.location {
            config.target.location = location.clone();
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(proxies) = &self.proxies {
            config.input.proxy_list = proxies.clone();
        }
        if let Some(output) = &self.output {
            config.output.csv_path = Some(output.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let report = crawl(config).await.context("crawl failed")?;
    if report.failed_workers > 0 {
        tracing::warn!("{} workers failed, see log above", report.failed_workers);
    }
    print_report(&report);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("yp_harvest=info,warn"),
            1 => EnvFilter::new("yp_harvest=debug,info"),
            2 => EnvFilter::new("yp_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== yp-harvest Dry Run ===\n");

    println!("Target:");
    println!("  Base URL: {}", config.target.base_url);
    println!("  Query: {}", config.target.query);
    println!("  Location: {}", config.target.location);

    println!("\nCrawler:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Start page: {}", config.crawler.start_page);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    match config.crawler.max_attempts() {
        Some(max) => println!("  Max attempts per page: {}", max),
        None => println!("  Max attempts per page: unbounded"),
    }
    println!(
        "  Retry proxy policy: {:?}",
        config.crawler.retry_proxy_policy
    );

    println!("\nInput:");
    println!("  Proxy list: {}", config.input.proxy_list.display());

    println!("\nOutput:");
    match &config.output.csv_path {
        Some(path) => println!("  CSV: {}", path.display()),
        None => println!("  CSV directory: {}", config.output.output_dir.display()),
    }

    println!("\n✓ Configuration is valid");
}
