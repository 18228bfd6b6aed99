//! CSV file sink

use crate::listing::{Listing, LISTING_FIELDS};
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use chrono::NaiveDate;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Thread-safe CSV writer for listings
///
/// The header row is written once, when the sink is created, so even a run
/// that finds nothing leaves a well-formed file behind.
pub struct CsvSink {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
    records_written: AtomicU64,
}

impl CsvSink {
    /// Creates the output file, replacing any existing file at `path`
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(LISTING_FIELDS)?;
        writer.flush()?;

        tracing::debug!("Created CSV sink at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
            records_written: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of listing rows written so far (excluding the header)
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }
}

impl RecordSink for CsvSink {
    fn write(&self, listing: &Listing) -> OutputResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| OutputError::Poisoned(e.to_string()))?;
        writer.write_record(listing.to_row())?;
        self.records_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn flush(&self) -> OutputResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| OutputError::Poisoned(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }
}

/// Builds the default output file name for a search
///
/// Non-alphanumeric characters in the query become `_` and the date is
/// appended, e.g. `Handyman_Services_2024-05-01.csv`.
pub fn output_file_name(query: &str, date: NaiveDate) -> String {
    let stem: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}.csv", stem, date.format("%Y-%m-%d"))
}
