//! Integration tests for the crawler
//!
//! These tests use wiremock as the forward proxy every request goes through
//! and run the full crawl cycle end-to-end against it.

use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yp_harvest::config::{Config, TargetConfig};
use yp_harvest::crawler::{page_url, Coordinator, FetchError, Fetcher, HttpFetcher};

const TARGET_BASE: &str = "http://listings.test/search/listings";

fn listing_block(name: &str, postcode: &str, phone: &str) -> String {
    format!(
        r##"<div class="listing listing-search listing-data"
                 data-full-name="{name}" data-postcode="{postcode}">
            <p class="listing-heading"><a href="/{postcode}">{name} services</a></p>
            <p class="listing-address">1 Main St NSW {postcode}</p>
            <span class="contact-text">{phone}</span>
            <a class="contact-email" data-email="info@{postcode}.example" href="#">Email</a>
        </div>"##
    )
}

fn results_page(blocks: &[String]) -> String {
    format!(
        "<html><head><title>Handyman in All States</title></head><body>{}</body></html>",
        blocks.join("\n")
    )
}

fn end_page() -> String {
    r#"<html><head><title>Handyman in All States</title></head><body>
        <div class="search-result-message">No results found for Handyman in All States</div>
        </body></html>"#
        .to_string()
}

fn block_page() -> String {
    r#"<html><head><title>Yellow Pages® | Data Protection</title></head>
        <body>Please verify you are a human</body></html>"#
        .to_string()
}

/// Creates a test configuration that routes every request through `proxy`
fn create_test_config(dir: &Path, proxy: &str, workers: usize) -> Config {
    let proxy_list = dir.join("proxies.txt");
    std::fs::write(&proxy_list, format!("# test proxy\n{}\n", proxy))
        .expect("Failed to write proxy list");

    let mut config = Config::default();
    config.crawler.workers = workers;
    config.crawler.fetch_timeout_secs = 5;
    config.target.base_url = TARGET_BASE.to_string();
    config.input.proxy_list = proxy_list;
    config.output.csv_path = Some(dir.join("listings.csv"));
    config.output.diagnostics_dir = Some(dir.join("dumps"));
    config
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(query_param("pageNumber", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_end_of_results(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(end_page()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_through_proxy() {
    // Start the mock proxy
    let proxy = MockServer::start().await;

    mount_page(
        &proxy,
        "1",
        results_page(&[
            listing_block("Acme Handyman", "2000", "02 9999 0000"),
            listing_block("Bolt Repairs", "3000", "03 8888 0000"),
        ]),
    )
    .await;
    mount_page(
        &proxy,
        "2",
        results_page(&[listing_block("Cobalt Fixes", "4000", "07 7777 0000")]),
    )
    .await;
    mount_end_of_results(&proxy).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(dir.path(), &proxy.uri(), 3);

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let csv_path = coordinator.output_path().to_path_buf();
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.failed_workers, 0);
    assert_eq!(report.workers.len(), 3);
    assert_eq!(report.total_records(), 3);
    assert_eq!(report.total_pages(), 2);
    assert_eq!(report.first_end_page(), Some(3));

    let content = std::fs::read_to_string(&csv_path).expect("Failed to read CSV");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines[0],
        "business_name,description,post_code,address,ph,email,website,listing_url"
    );
    assert_eq!(lines.len(), 4);

    for name in ["Acme Handyman", "Bolt Repairs", "Cobalt Fixes"] {
        assert_eq!(
            lines.iter().filter(|l| l.starts_with(name)).count(),
            1,
            "expected exactly one row for {}",
            name
        );
    }
    assert!(content.contains("info@2000.example"));
    assert!(content.contains("pageNumber=2"));
}

#[tokio::test]
async fn test_blocked_page_is_retried() {
    let proxy = MockServer::start().await;

    // The first request for page 1 hits the block page, the retry succeeds
    Mock::given(method("GET"))
        .and(query_param("pageNumber", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(block_page()))
        .up_to_n_times(1)
        .mount(&proxy)
        .await;
    mount_page(
        &proxy,
        "1",
        results_page(&[listing_block("Acme Handyman", "2000", "02 9999 0000")]),
    )
    .await;
    mount_end_of_results(&proxy).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(dir.path(), &proxy.uri(), 1);

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let csv_path = coordinator.output_path().to_path_buf();
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.total_blocked(), 1);
    assert_eq!(report.total_records(), 1);
    assert_eq!(report.first_end_page(), Some(2));

    let content = std::fs::read_to_string(&csv_path).expect("Failed to read CSV");
    assert_eq!(content.lines().count(), 2);
}

#[tokio::test]
async fn test_empty_page_is_dumped_and_retried() {
    let proxy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("pageNumber", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .up_to_n_times(1)
        .mount(&proxy)
        .await;
    mount_page(
        &proxy,
        "1",
        results_page(&[listing_block("Acme Handyman", "2000", "02 9999 0000")]),
    )
    .await;
    mount_end_of_results(&proxy).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(dir.path(), &proxy.uri(), 1);

    let report = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(report.total_retries(), 1);
    assert_eq!(report.total_records(), 1);

    let dumps: Vec<_> = std::fs::read_dir(dir.path().join("dumps"))
        .expect("Failed to read dump dir")
        .collect();
    assert_eq!(dumps.len(), 1);
}

#[tokio::test]
async fn test_fetcher_returns_body() {
    let proxy = MockServer::start().await;
    mount_end_of_results(&proxy).await;

    let target = TargetConfig {
        base_url: TARGET_BASE.to_string(),
        ..TargetConfig::default()
    };
    let fetcher = HttpFetcher::new(&target, Duration::from_secs(5)).expect("Failed to build fetcher");
    let url = page_url(&target, 1).expect("Failed to build URL");

    let body = fetcher.fetch(&url, &proxy.uri()).await.expect("Fetch failed");
    assert!(body.contains("No results found for"));
}

#[tokio::test]
async fn test_fetcher_reports_status() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&proxy)
        .await;

    let target = TargetConfig {
        base_url: TARGET_BASE.to_string(),
        ..TargetConfig::default()
    };
    let fetcher = HttpFetcher::new(&target, Duration::from_secs(5)).expect("Failed to build fetcher");
    let url = page_url(&target, 1).expect("Failed to build URL");

    let result = fetcher.fetch(&url, &proxy.uri()).await;
    assert_eq!(result, Err(FetchError::Status(503)));
}

#[tokio::test]
async fn test_fetcher_times_out() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(end_page())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&proxy)
        .await;

    let target = TargetConfig {
        base_url: TARGET_BASE.to_string(),
        ..TargetConfig::default()
    };
    let fetcher =
        HttpFetcher::new(&target, Duration::from_millis(300)).expect("Failed to build fetcher");
    let url = page_url(&target, 1).expect("Failed to build URL");

    let result = fetcher.fetch(&url, &proxy.uri()).await;
    assert_eq!(result, Err(FetchError::Timeout));
}

#[tokio::test]
async fn test_fetcher_unreachable_proxy() {
    let target = TargetConfig {
        base_url: TARGET_BASE.to_string(),
        ..TargetConfig::default()
    };
    let fetcher = HttpFetcher::new(&target, Duration::from_secs(5)).expect("Failed to build fetcher");
    let url = page_url(&target, 1).expect("Failed to build URL");

    let result = fetcher.fetch(&url, "http://127.0.0.1:1").await;
    assert!(
        matches!(result, Err(FetchError::Connect(_))),
        "expected connect error, got {:?}",
        result
    );
}
