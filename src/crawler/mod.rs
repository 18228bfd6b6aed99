//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Page number allocation shared across workers
//! - HTTP fetching through rotating proxies
//! - HTML parsing and listing extraction
//! - Response classification and the per-worker retry loop
//! - Overall crawl coordination

mod allocator;
mod classifier;
mod coordinator;
mod fetcher;
mod parser;
mod worker;

pub use allocator::PageAllocator;
pub use classifier::{classify, classify_document, CrawlOutcome, PageProfile, RetryReason};
pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{page_url, FetchError, Fetcher, HttpFetcher};
pub use parser::ListingDocument;
pub use worker::{CrawlContext, Worker, WorkerSettings};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::HarvestError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the proxy list
/// 2. Create the output CSV
/// 3. Spawn the configured number of workers
/// 4. Wait for every worker to reach the end of results
/// 5. Flush the output and report totals
pub async fn crawl(config: Config) -> Result<CrawlReport, HarvestError> {
    run_crawl(config).await
}
