//! Response classification
//!
//! Decides what a worker should do with the result of one fetch attempt.
//! The block-page check always runs before listing extraction, so a captcha
//! page can never be mistaken for the end of results.

use crate::config::TargetConfig;
use crate::crawler::fetcher::FetchError;
use crate::crawler::parser::ListingDocument;
use crate::listing::Listing;
use crate::output::DiagnosticDump;
use std::path::PathBuf;

/// Page signatures used to classify a fetched body
#[derive(Debug, Clone)]
pub struct PageProfile {
    /// Exact title of the bot-protection page
    pub block_page_title: String,

    /// Text shown in the search message box past the last page
    pub no_results_marker: String,
}

impl PageProfile {
    pub fn from_target(target: &TargetConfig) -> Self {
        Self {
            block_page_title: target.block_page_title.clone(),
            no_results_marker: target.no_results_marker.clone(),
        }
    }
}

impl Default for PageProfile {
    fn default() -> Self {
        Self::from_target(&TargetConfig::default())
    }
}

/// Why an attempt should be repeated on the same page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// The request itself failed
    Transport(FetchError),

    /// The page parsed but had neither listings nor a no-results message
    EmptyPage {
        /// Where the body was saved, if saving succeeded
        diagnostic: Option<PathBuf>,
    },
}

/// Result of one page-fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// At least one listing was extracted
    Success(Vec<Listing>),

    /// The site served its bot-protection page
    Blocked,

    /// The site reports there are no results on this page
    EndOfResults,

    /// Nothing usable; try the same page again
    Retryable(RetryReason),
}

impl CrawlOutcome {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Blocked => "blocked",
            Self::EndOfResults => "end_of_results",
            Self::Retryable(_) => "retryable",
        }
    }
}

/// Classifies a page body without side effects
///
/// An empty page comes back as `Retryable(EmptyPage { diagnostic: None })`;
/// [`classify`] is the variant that also saves the body.
pub fn classify_document(body: &str, listing_url: &str, profile: &PageProfile) -> CrawlOutcome {
    let document = ListingDocument::parse(body);

    if document.title().as_deref() == Some(profile.block_page_title.as_str()) {
        return CrawlOutcome::Blocked;
    }

    let listings = document.listings(listing_url);
    if !listings.is_empty() {
        return CrawlOutcome::Success(listings);
    }

    if document.has_no_results_message(&profile.no_results_marker) {
        return CrawlOutcome::EndOfResults;
    }

    CrawlOutcome::Retryable(RetryReason::EmptyPage { diagnostic: None })
}

/// Classifies the result of a fetch attempt
///
/// Transport failures are retryable. A body with no listings and no
/// no-results message is also retryable, and is saved through `dump` so the
/// page can be inspected later.
///
/// # Arguments
///
/// * `fetched` - Body of the response, or why there was none
/// * `listing_url` - URL of the page, stamped on every listing
/// * `profile` - Markers of the block page and the end of results
/// * `dump` - Where empty pages are saved
///
/// # Returns
///
/// The outcome that decides the worker's next step.
pub fn classify(
    fetched: Result<String, FetchError>,
    listing_url: &str,
    profile: &PageProfile,
    dump: &DiagnosticDump,
) -> CrawlOutcome {
    let body = match fetched {
        Ok(body) => body,
        Err(e) => return CrawlOutcome::Retryable(RetryReason::Transport(e)),
    };

    match classify_document(&body, listing_url, profile) {
        CrawlOutcome::Retryable(RetryReason::EmptyPage { .. }) => {
            let diagnostic = dump.capture(&body);
            match &diagnostic {
                Some(path) => tracing::warn!(
                    "Got 0 listings for {}, page saved to {}",
                    listing_url,
                    path.display()
                ),
                None => tracing::warn!("Got 0 listings for {}", listing_url),
            }
            CrawlOutcome::Retryable(RetryReason::EmptyPage { diagnostic })
        }
        outcome => outcome,
    }
}
