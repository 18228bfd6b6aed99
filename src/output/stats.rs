//! Run statistics collected from workers

use std::time::Duration;

/// What a single worker did before it stopped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker index within the run
    pub worker_id: usize,

    /// Pages that yielded listings
    pub pages_completed: u64,

    /// Listing rows written to the sink
    pub records_written: u64,

    /// Attempts answered with the bot-protection page
    pub blocked: u64,

    /// Attempts that failed and were retried on the same page
    pub retries: u64,

    /// Pages given up on after hitting the attempt limit
    pub pages_abandoned: u64,

    /// Page number on which the worker saw the end of results
    pub end_page: Option<u64>,
}

/// Aggregated outcome of a whole crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Reports from workers that finished normally
    pub workers: Vec<WorkerReport>,

    /// Workers that returned an error or panicked
    pub failed_workers: usize,
}

impl CrawlReport {
    pub fn total_records(&self) -> u64 {
        self.workers.iter().map(|w| w.records_written).sum()
    }

    pub fn total_pages(&self) -> u64 {
        self.workers.iter().map(|w| w.pages_completed).sum()
    }

    pub fn total_blocked(&self) -> u64 {
        self.workers.iter().map(|w| w.blocked).sum()
    }

    pub fn total_retries(&self) -> u64 {
        self.workers.iter().map(|w| w.retries).sum()
    }

    pub fn total_abandoned(&self) -> u64 {
        self.workers.iter().map(|w| w.pages_abandoned).sum()
    }

    /// Lowest page on which any worker saw the end of results
    pub fn first_end_page(&self) -> Option<u64> {
        self.workers.iter().filter_map(|w| w.end_page).min()
    }
}

/// Formats a duration as `M mins and S sec`; hours count as minutes
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{} mins and {} sec", total / 60, total % 60)
}

/// Prints the end-of-run summary to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Harvest Summary ===\n");
    println!("  Listings written: {}", report.total_records());
    println!("  Pages with listings: {}", report.total_pages());
    println!("  Blocked attempts: {}", report.total_blocked());
    println!("  Retried attempts: {}", report.total_retries());
    if report.total_abandoned() > 0 {
        println!("  Abandoned pages: {}", report.total_abandoned());
    }
    if let Some(page) = report.first_end_page() {
        println!("  Results ended at page: {}", page);
    }
    if report.failed_workers > 0 {
        println!("  Failed workers: {}", report.failed_workers);
    }
    println!();
    println!("Process finished in: {}", format_elapsed(report.elapsed));
}
