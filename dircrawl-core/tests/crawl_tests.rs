// Tests for crawl functionality

mod common;

use chrono::Utc;
use common::*;
use dircrawl_core::crawl::{
    CrawlOptions, DEFAULT_OUTPUT_ROOT, DEFAULT_START_URL, execute_crawl, extract_url_path,
    generate_crawl_report,
};
use dircrawl_core::error::CrawlError;
use dircrawl_core::explore::{CrawlSummary, LeafReport, SkippedNode};
use dircrawl_core::sink::ArtifactFormat;
use dircrawl_scanner::{ScrapeError, SiteProfile};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::MockServer;

// ============================================================================
// URL Path Extraction Tests
// ============================================================================

#[test]
fn test_extract_url_path_root() {
    assert_eq!(extract_url_path("http://example.com/"), "/");
    assert_eq!(extract_url_path("http://example.com"), "/");
}

#[test]
fn test_extract_url_path_drops_query_and_fragment() {
    assert_eq!(
        extract_url_path("https://example.com/kb5/fsd/results.page?id=7#top"),
        "/kb5/fsd/results.page"
    );
}

#[test]
fn test_extract_url_path_not_a_url() {
    assert_eq!(extract_url_path("category.page?id=1"), "category.page?id=1");
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_options_defaults() {
    let options = CrawlOptions::new(Url::parse(DEFAULT_START_URL).unwrap());
    assert_eq!(options.output_root, PathBuf::from(DEFAULT_OUTPUT_ROOT));
    assert_eq!(options.wait_timeout, Duration::from_millis(5000));
    assert_eq!(options.page_delay, Duration::from_millis(1000));
    assert_eq!(options.max_depth, 16);
    assert_eq!(options.max_pages, 500);
    assert_eq!(options.formats, ArtifactFormat::all());
    assert!(!options.show_progress_bars);
}

// ============================================================================
// Execution
// ============================================================================

fn options_for(server: &MockServer, out: PathBuf) -> CrawlOptions {
    let mut options = CrawlOptions::new(url_for(server, "home.page", "root"));
    options.output_root = out;
    options.http = http_config();
    options.wait_timeout = Duration::from_millis(200);
    options.page_delay = Duration::ZERO;
    options
}

#[tokio::test]
async fn test_execute_crawl_writes_selected_formats() {
    let server = MockServer::start().await;
    mount(
        &server,
        "home.page",
        "root",
        category_page(&[("Health & Wellbeing", "category.page?id=h")]),
    )
    .await;
    mount(&server, "category.page", "h", listing_page(&["gp", "dentist"])).await;

    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("Exploration");
    let mut options = options_for(&server, out.clone());
    options.formats = vec![ArtifactFormat::Json];

    let messages = Arc::new(Mutex::new(Vec::new()));
    let messages_clone = messages.clone();
    let callback = Arc::new(move |msg: String| messages_clone.lock().unwrap().push(msg));

    let summary = execute_crawl(options, Some(callback)).await.unwrap();

    let leaf = out.join("Health & Wellbeing");
    assert!(leaf.join("data.json").is_file());
    assert!(!leaf.join("data.csv").exists());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(leaf.join("data.json")).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[1]["Title"], "dentist");

    assert_eq!(summary.records_written(), 2);
    let messages = messages.lock().unwrap();
    assert!(messages.iter().any(|m| m == "Scraping Health & Wellbeing"));
}

#[tokio::test]
async fn test_invalid_profile_fails_before_any_request() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    let mut options = options_for(&server, temp_dir.path().join("out"));
    options.profile = SiteProfile {
        listing_item: "li[[".to_string(),
        ..SiteProfile::default()
    };

    let result = execute_crawl(options, None).await;

    assert!(matches!(
        result,
        Err(CrawlError::Scrape(ScrapeError::SelectorError { .. }))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(!temp_dir.path().join("out").exists());
}

// ============================================================================
// Report
// ============================================================================

fn sample_summary() -> CrawlSummary {
    let mut summary = CrawlSummary::new(
        &Url::parse(DEFAULT_START_URL).unwrap(),
        PathBuf::from("Wigan_Exploration"),
    );
    summary.categories_visited = 3;
    summary.leaves.push(LeafReport {
        category: "Dentists".to_string(),
        url: "https://directory.test/kb5/fsd/results.page?id=4".to_string(),
        path: PathBuf::from("Wigan_Exploration/Health/Dentists"),
        records: 12,
        pages: 2,
        stop_reason: "no next-page control".to_string(),
        artifacts: vec![
            PathBuf::from("Wigan_Exploration/Health/Dentists/data.csv"),
            PathBuf::from("Wigan_Exploration/Health/Dentists/data.json"),
        ],
    });
    summary.skipped.push(SkippedNode {
        url: "https://directory.test/kb5/fsd/category.page?id=9".to_string(),
        reason: "already visited".to_string(),
    });
    summary.finished_at = Some(Utc::now());
    summary
}

#[test]
fn test_generate_crawl_report() {
    let report = generate_crawl_report(&sample_summary());

    assert!(report.contains("Categories visited: 3"));
    assert!(report.contains("Leaves scraped: 1"));
    assert!(report.contains("Records written: 12"));
    assert!(report.contains("Artifacts written: 2"));
    assert!(report.contains("Skipped: 1"));
    assert!(report.contains("Wigan_Exploration/Health/Dentists"));
    assert!(report.contains("/kb5/fsd/category.page"));
    assert!(report.contains("already visited"));
}

#[test]
fn test_report_omits_empty_sections() {
    let summary = CrawlSummary::new(
        &Url::parse(DEFAULT_START_URL).unwrap(),
        PathBuf::from("out"),
    );
    let report = generate_crawl_report(&summary);

    assert!(report.contains("Leaves scraped: 0"));
    assert!(!report.contains("## Leaves"));
    assert!(!report.contains("## Skipped"));
}
