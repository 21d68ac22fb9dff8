use crate::error::CrawlError;
use crate::explore::{CategoryExplorer, CrawlProgressCallback, CrawlSummary};
use crate::sink::{ArtifactFormat, FsSink};
use colored::Colorize;
use dircrawl_scanner::{
    HttpConfig, HttpFetcher, HttpSessionFactory, Paginator, RecordExtractor, SiteProfile,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

pub const DEFAULT_START_URL: &str = "https://directory.wigan.gov.uk/kb5/wigan/fsd/home.page";
pub const DEFAULT_OUTPUT_ROOT: &str = "Wigan_Exploration";

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub start_url: Url,
    pub output_root: PathBuf,
    pub profile: SiteProfile,
    pub formats: Vec<ArtifactFormat>,
    pub http: HttpConfig,
    pub wait_timeout: Duration,
    pub page_delay: Duration,
    pub max_depth: usize,
    pub max_pages: usize,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    /// Options for `start_url` with every other setting at its default.
    pub fn new(start_url: Url) -> Self {
        Self {
            start_url,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            profile: SiteProfile::default(),
            formats: ArtifactFormat::all(),
            http: HttpConfig::default(),
            wait_timeout: Duration::from_millis(5000),
            page_delay: Duration::from_millis(1000),
            max_depth: 16,
            max_pages: 500,
            show_progress_bars: false,
        }
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options
/// Returns the crawl summary
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlSummary, CrawlError> {
    let CrawlOptions {
        start_url,
        output_root,
        profile,
        formats,
        http,
        wait_timeout,
        page_delay,
        max_depth,
        max_pages,
        show_progress_bars,
    } = options;

    // Bad selectors are reported before any request goes out
    let compiled = Arc::new(profile.compile()?);
    let fetcher = HttpFetcher::new(&http)?;

    let paginator = Paginator::new(HttpSessionFactory::new(http), RecordExtractor::new(compiled))
        .with_wait_timeout(wait_timeout)
        .with_page_delay(page_delay)
        .with_max_pages(max_pages);

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let pb_clone = progress_bar.clone();
    let internal_callback: CrawlProgressCallback = Arc::new(move |msg: String| {
        if let Some(ref pb) = pb_clone {
            pb.set_message(msg.clone());
        }
        if let Some(ref callback) = progress_callback {
            callback(msg);
        }
    });

    let explorer = CategoryExplorer::new(fetcher, paginator, FsSink::new(formats))
        .with_max_depth(max_depth)
        .with_progress_callback(internal_callback);

    let outcome = explorer.crawl(&start_url, output_root).await;

    if let Some(ref pb) = progress_bar {
        match outcome {
            Ok(ref summary) => pb.finish_with_message(format!(
                "Crawl complete! {} leaves, {} records",
                summary.leaves.len(),
                summary.records_written()
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    if let Ok(ref summary) = outcome {
        info!(
            "Wrote {} artifacts under {}",
            summary.artifacts_written(),
            summary.output_root.display()
        );
    }
    outcome
}

/// Generate a crawl report from a summary
pub fn generate_crawl_report(summary: &CrawlSummary) -> String {
    let mut report = String::new();
    report.push_str(&format!("{}\n\n", "━".repeat(52)));
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Start URL: {}\n", summary.root_url));
    report.push_str(&format!("  Output root: {}\n", summary.output_root.display()));
    report.push_str(&format!("  Categories visited: {}\n", summary.categories_visited));
    report.push_str(&format!("  Leaves scraped: {}\n", summary.leaves.len()));
    report.push_str(&format!("  Records written: {}\n", summary.records_written()));
    report.push_str(&format!("  Artifacts written: {}\n", summary.artifacts_written()));
    report.push_str(&format!("  Skipped: {}\n", summary.skipped.len()));
    if let Some(finished) = summary.finished_at {
        let elapsed = finished - summary.started_at;
        report.push_str(&format!("  Duration: {}s\n", elapsed.num_seconds()));
    }

    report.push_str(&format!("\n{}\n\n", "━".repeat(52)));

    if !summary.leaves.is_empty() {
        report.push_str("## Leaves\n");
        for leaf in &summary.leaves {
            let count = if leaf.records == 0 {
                format!("{:>5}", leaf.records).yellow()
            } else {
                format!("{:>5}", leaf.records).green()
            };
            report.push_str(&format!(
                "  {} {} {}\n",
                count,
                leaf.path.display(),
                format!("({} pages, {})", leaf.pages, leaf.stop_reason).bright_black()
            ));
        }
        report.push('\n');
    }

    if !summary.skipped.is_empty() {
        report.push_str("## Skipped\n");
        for skipped in &summary.skipped {
            report.push_str(&format!(
                "  {} {} {}\n",
                "✗".red(),
                extract_url_path(&skipped.url),
                skipped.reason.bright_black()
            ));
        }
        report.push('\n');
    }

    report
}
