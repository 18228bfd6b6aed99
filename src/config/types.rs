use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for yp-harvest
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What a worker does with its proxy after a retryable failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryProxyPolicy {
    /// Put the proxy back at the tail of the pool
    #[default]
    Return,
    /// Drop the proxy for the rest of the run
    Discard,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// First page number handed out by the allocator
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u64,

    /// Per-request timeout in seconds
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Attempts allowed per page before it is abandoned (0 = unbounded)
    #[serde(rename = "max-attempts-per-page", default)]
    pub max_attempts_per_page: u32,

    /// Delay before retrying the same page (milliseconds)
    #[serde(rename = "retry-delay-ms", default)]
    pub retry_delay_ms: u64,

    /// Proxy handling after a retryable failure
    #[serde(rename = "retry-proxy-policy", default)]
    pub retry_proxy_policy: RetryProxyPolicy,
}

impl CrawlerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Attempt limit, `None` when retries are unbounded
    pub fn max_attempts(&self) -> Option<u32> {
        (self.max_attempts_per_page > 0).then_some(self.max_attempts_per_page)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            start_page: default_start_page(),
            fetch_timeout_secs: default_fetch_timeout(),
            max_attempts_per_page: 0,
            retry_delay_ms: 0,
            retry_proxy_policy: RetryProxyPolicy::Return,
        }
    }
}

/// Search target and page signatures
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Search listings endpoint
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Value of the `referredBy` query parameter
    #[serde(rename = "referred-by", default = "default_referred_by")]
    pub referred_by: String,

    /// Search term (`clue`)
    #[serde(default = "default_query")]
    pub query: String,

    /// Location filter (`locationClue`), a region name or a postcode
    #[serde(default = "default_location")]
    pub location: String,

    /// Exact `<title>` of the bot-protection page
    #[serde(rename = "block-page-title", default = "default_block_page_title")]
    pub block_page_title: String,

    /// Text in the search message box when a page has no results
    #[serde(rename = "no-results-marker", default = "default_no_results_marker")]
    pub no_results_marker: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            referred_by: default_referred_by(),
            query: default_query(),
            location: default_location(),
            block_page_title: default_block_page_title(),
            no_results_marker: default_no_results_marker(),
            user_agent: default_user_agent(),
        }
    }
}

/// Input files
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Path to the proxy list, one `host:port` per line
    #[serde(rename = "proxy-list", default = "default_proxy_list")]
    pub proxy_list: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            proxy_list: default_proxy_list(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory for the generated CSV file name
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Explicit CSV path; overrides the name derived from the query
    #[serde(rename = "csv-path", default)]
    pub csv_path: Option<PathBuf>,

    /// Where anomalous pages are dumped; defaults to the system temp dir
    #[serde(rename = "diagnostics-dir", default)]
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            csv_path: None,
            diagnostics_dir: None,
        }
    }
}

fn default_workers() -> usize {
    100
}

fn default_start_page() -> u64 {
    1
}

fn default_fetch_timeout() -> u64 {
    15
}

fn default_base_url() -> String {
    "https://www.yellowpages.com.au/search/listings".to_string()
}

fn default_referred_by() -> String {
    "www.yellowpages.com.au".to_string()
}

fn default_query() -> String {
    "Handyman".to_string()
}

fn default_location() -> String {
    "All States".to_string()
}

fn default_block_page_title() -> String {
    "Yellow Pages® | Data Protection".to_string()
}

fn default_no_results_marker() -> String {
    "No results found for".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; rv:68.0) Gecko/20100101 Firefox/68.0".to_string()
}

fn default_proxy_list() -> PathBuf {
    PathBuf::from("proxies.txt")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
