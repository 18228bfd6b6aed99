//! Record sink trait and output error types

use crate::listing::Listing;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sink lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Append-only destination for extracted listings
///
/// Implementations must be safe to call from many workers at once; each
/// `write` lands as one complete row.
pub trait RecordSink: Send + Sync {
    /// Appends a single listing
    fn write(&self, listing: &Listing) -> OutputResult<()>;

    /// Pushes buffered rows to durable storage
    fn flush(&self) -> OutputResult<()>;
}
