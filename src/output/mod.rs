//! Output module for persisting harvested listings
//!
//! This module handles:
//! - Writing listings to the CSV sink
//! - Dumping anomalous pages for later inspection
//! - Recording per-worker and whole-run statistics

mod csv_sink;
mod diagnostics;
pub mod stats;
mod traits;

pub use csv_sink::{output_file_name, CsvSink};
pub use diagnostics::DiagnosticDump;
pub use stats::{format_elapsed, print_report, CrawlReport, WorkerReport};
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::config::OutputConfig;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Resolves the CSV path for a run
///
/// An explicit `csv-path` wins; otherwise the file is named after the query
/// and date inside `output-dir`.
pub fn resolve_output_path(config: &OutputConfig, query: &str, date: NaiveDate) -> PathBuf {
    match &config.csv_path {
        Some(path) => path.clone(),
        None => config.output_dir.join(output_file_name(query, date)),
    }
}
