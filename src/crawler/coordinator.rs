//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the shared crawl state together and supervises the
//! workers:
//! - Creating the CSV sink, proxy pool and page allocator
//! - Spawning a fixed number of workers
//! - Collecting worker reports and logging worker failures
//! - Flushing the sink once every worker has stopped

use crate::config::{validate, Config};
use crate::crawler::allocator::PageAllocator;
use crate::crawler::classifier::PageProfile;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::worker::{CrawlContext, Worker, WorkerSettings};
use crate::output::{resolve_output_path, CrawlReport, CsvSink, DiagnosticDump, RecordSink};
use crate::proxy::{load_proxy_list, ProxyPool};
use crate::{ConfigError, HarvestError};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Main crawler coordinator structure
pub struct Coordinator {
    context: Arc<CrawlContext>,
    sink: Arc<CsvSink>,
    workers: usize,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// Loads the proxy list named in the config and creates (or truncates)
    /// the output CSV.
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Invalid config, unreadable or empty proxy
    ///   list, or the output file could not be created
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::new(&config.target, config.crawler.fetch_timeout())?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Creates a coordinator with a caller-supplied fetcher
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self, HarvestError> {
        let proxies = load_proxy_list(&config.input.proxy_list)?;
        Self::with_proxies(config, proxies, fetcher)
    }

    /// Creates a coordinator from an already loaded proxy list
    pub fn with_proxies(
        config: Config,
        proxies: Vec<String>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, HarvestError> {
        validate(&config)?;
        if proxies.is_empty() {
            return Err(ConfigError::ProxyList("proxy list is empty".to_string()).into());
        }

        let csv_path = resolve_output_path(
            &config.output,
            &config.target.query,
            chrono::Local::now().date_naive(),
        );
        let sink = Arc::new(CsvSink::create(&csv_path)?);
        tracing::info!("Writing listings to {}", csv_path.display());

        let dump = match &config.output.diagnostics_dir {
            Some(dir) => DiagnosticDump::new(dir),
            None => DiagnosticDump::in_temp_dir(),
        };

        let context = CrawlContext {
            pool: Arc::new(ProxyPool::new(proxies)),
            allocator: Arc::new(PageAllocator::new(config.crawler.start_page)),
            fetcher,
            sink: sink.clone(),
            profile: PageProfile::from_target(&config.target),
            target: config.target,
            dump,
            settings: WorkerSettings::from_config(&config.crawler),
        };

        Ok(Self {
            context: Arc::new(context),
            sink,
            workers: config.crawler.workers,
        })
    }

    /// Path of the CSV file being written
    pub fn output_path(&self) -> &Path {
        self.sink.path()
    }

    /// Runs every worker to completion
    ///
    /// A worker that fails or panics is logged and counted; the others keep
    /// going. The sink is flushed once after the last worker stops.
    pub async fn run(self) -> Result<CrawlReport, HarvestError> {
        let start_time = Instant::now();
        tracing::info!(
            "Starting {} workers for '{}' in '{}' with {} proxies",
            self.workers,
            self.context.target.query,
            self.context.target.location,
            self.context.pool.len()
        );

        let mut tasks = JoinSet::new();
        for id in 0..self.workers {
            let worker = Worker::new(id, Arc::clone(&self.context));
            tasks.spawn(async move { (id, worker.run().await) });
        }

        let mut report = CrawlReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(worker_report))) => report.workers.push(worker_report),
                Ok((id, Err(e))) => {
                    tracing::error!("Worker {} failed: {}", id, e);
                    report.failed_workers += 1;
                }
                Err(e) => {
                    tracing::error!("Worker task aborted: {}", e);
                    report.failed_workers += 1;
                }
            }
        }

        self.sink.flush()?;
        if self.context.pool.is_closed() {
            tracing::error!("Crawl ended early: every proxy was discarded");
        }
        report.workers.sort_by_key(|w| w.worker_id);
        report.elapsed = start_time.elapsed();

        tracing::info!(
            "Crawl completed: {} listings from {} pages in {:?} ({} rows in {})",
            report.total_records(),
            report.total_pages(),
            report.elapsed,
            self.sink.records_written(),
            self.sink.path().display()
        );

        Ok(report)
    }
}

/// Runs a complete crawl from configuration
///
/// # Example
///
/// ```no_run
/// use yp_harvest::config::load_config;
/// use yp_harvest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_crawl(config).await?;
/// println!("{} listings", report.total_records());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport, HarvestError> {
    Coordinator::new(config)?.run().await
}
