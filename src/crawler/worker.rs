//! Crawl worker
//!
//! Each worker loops over one page at a time:
//! - Fetch the page through its current proxy
//! - Classify the response
//! - Write listings and move to a fresh page number, or
//! - Rotate the proxy and retry the same page, or
//! - Stop once the site reports there are no more results

use crate::config::{CrawlerConfig, RetryProxyPolicy, TargetConfig};
use crate::crawler::allocator::PageAllocator;
use crate::crawler::classifier::{classify, CrawlOutcome, PageProfile, RetryReason};
use crate::crawler::fetcher::{page_url, Fetcher};
use crate::output::{DiagnosticDump, RecordSink, WorkerReport};
use crate::proxy::ProxyPool;
use crate::HarvestError;
use std::sync::Arc;
use std::time::Duration;

/// Retry behavior shared by all workers
#[derive(Debug, Clone, Default)]
pub struct WorkerSettings {
    /// Attempts per page before giving up on it; `None` retries forever
    pub max_attempts: Option<u32>,

    /// Pause before retrying the same page
    pub retry_delay: Duration,

    /// What to do with a proxy after a retryable failure
    pub retry_proxy_policy: RetryProxyPolicy,
}

impl WorkerSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts(),
            retry_delay: config.retry_delay(),
            retry_proxy_policy: config.retry_proxy_policy,
        }
    }
}

/// Everything the workers of one crawl share
pub struct CrawlContext {
    pub pool: Arc<ProxyPool>,
    pub allocator: Arc<PageAllocator>,
    pub fetcher: Arc<dyn Fetcher>,
    pub sink: Arc<dyn RecordSink>,
    pub target: TargetConfig,
    pub profile: PageProfile,
    pub dump: DiagnosticDump,
    pub settings: WorkerSettings,
}

/// One crawl worker
pub struct Worker {
    id: usize,
    context: Arc<CrawlContext>,
}

impl Worker {
    pub fn new(id: usize, context: Arc<CrawlContext>) -> Self {
        Self { id, context }
    }

    /// Runs until this worker sees the end of results
    ///
    /// Fetch and parse failures are handled here and never end the loop.
    /// The held proxy goes back to the pool on every exit path.
    ///
    /// # Returns
    ///
    /// * `Ok(WorkerReport)` - The worker reached the end of results
    /// * `Err(HarvestError)` - The sink failed, or the pool closed after
    ///   every proxy was discarded
    pub async fn run(self) -> Result<WorkerReport, HarvestError> {
        let ctx = &*self.context;
        let mut report = WorkerReport {
            worker_id: self.id,
            ..Default::default()
        };

        let mut page = ctx.allocator.next();
        let mut lease = ctx.pool.lease().await?;
        let mut attempts: u32 = 0;

        tracing::debug!("Worker {} starting on page {}", self.id, page);

        loop {
            let url = page_url(&ctx.target, page)?;
            attempts += 1;

            let fetched = ctx.fetcher.fetch(&url, lease.proxy()).await;
            let outcome = classify(fetched, url.as_str(), &ctx.profile, &ctx.dump);

            match outcome {
                CrawlOutcome::Success(listings) => {
                    for listing in &listings {
                        ctx.sink.write(listing)?;
                    }
                    report.pages_completed += 1;
                    report.records_written += listings.len() as u64;
                    tracing::debug!(
                        "Worker {} wrote {} listings from page {}",
                        self.id,
                        listings.len(),
                        page
                    );

                    page = ctx.allocator.next();
                    attempts = 0;
                    continue;
                }

                CrawlOutcome::EndOfResults => {
                    tracing::debug!("Worker {} reached end of results on page {}", self.id, page);
                    report.end_page = Some(page);
                    break;
                }

                CrawlOutcome::Blocked => {
                    report.blocked += 1;
                    tracing::debug!(
                        "Got captcha for {} on page {}, trying new proxy",
                        lease.proxy(),
                        page
                    );
                    lease.release();
                }

                CrawlOutcome::Retryable(reason) => {
                    report.retries += 1;
                    log_retry(&reason, lease.proxy(), page);

                    match ctx.settings.retry_proxy_policy {
                        RetryProxyPolicy::Return => lease.release(),
                        RetryProxyPolicy::Discard => {
                            lease.discard();
                        }
                    }
                }
            }

            if ctx.settings.max_attempts.is_some_and(|max| attempts >= max) {
                tracing::warn!(
                    "Worker {} giving up on page {} after {} attempts",
                    self.id,
                    page,
                    attempts
                );
                report.pages_abandoned += 1;
                page = ctx.allocator.next();
                attempts = 0;
            } else if !ctx.settings.retry_delay.is_zero() {
                tokio::time::sleep(ctx.settings.retry_delay).await;
            }

            lease = ctx.pool.lease().await?;
        }

        tracing::debug!("Shutting down worker {}", self.id);
        Ok(report)
    }
}

fn log_retry(reason: &RetryReason, proxy: &str, page: u64) {
    match reason {
        RetryReason::Transport(e) if e.is_expected() => {
            tracing::debug!("Fetch of page {} via {} failed: {}", page, proxy, e);
        }
        RetryReason::Transport(e) => {
            tracing::warn!("Unexpected failure on page {} via {}: {}", page, proxy, e);
        }
        // already reported when the page was classified
        RetryReason::EmptyPage { .. } => {}
    }
}
