use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use dircrawl_core::crawl::{CrawlOptions, execute_crawl, generate_crawl_report};
use dircrawl_core::sink::ArtifactFormat;
use dircrawl_scanner::{HttpConfig, SiteProfile};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;
use url::Url;

// Helper functions for crawl handler

/// Log level for the given `-v` count and `-q` flag
pub fn log_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::WARN;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init_tracing(level: Level) {
    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Parse a start URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<Url> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
    {
        return Some(url);
    }

    Url::parse(&format!("https://{}", line)).ok()
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::full(raw).map_or_else(|_| raw.into(), |p| p.into_owned()))
}

pub fn parse_formats(raw: &str) -> anyhow::Result<Vec<ArtifactFormat>> {
    ArtifactFormat::parse_list(raw).map_err(|e| anyhow!(e))
}

/// Load the site profile, falling back to the built-in selectors
pub fn load_profile(path: Option<&Path>) -> anyhow::Result<SiteProfile> {
    match path {
        None => Ok(SiteProfile::default()),
        Some(path) => {
            let expanded = expand_path(&path.to_string_lossy());
            SiteProfile::from_json_file(&expanded)
                .with_context(|| format!("Failed to load profile {}", expanded.display()))
        }
    }
}

/// Resolve `crawl` arguments into crawl options
pub fn build_crawl_options(sub_matches: &ArgMatches) -> anyhow::Result<CrawlOptions> {
    let raw_url = sub_matches
        .get_one::<String>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;
    let start_url =
        parse_url_line(raw_url).ok_or_else(|| anyhow!("Invalid start URL '{}'", raw_url))?;

    let mut options = CrawlOptions::new(start_url);

    if let Some(output) = sub_matches.get_one::<String>("output") {
        options.output_root = expand_path(output);
    }
    if let Some(format) = sub_matches.get_one::<String>("format") {
        options.formats = parse_formats(format)?;
    }
    options.profile = load_profile(sub_matches.get_one::<PathBuf>("profile").map(PathBuf::as_path))?;

    let defaults = HttpConfig::default();
    options.http = HttpConfig {
        timeout: sub_matches
            .get_one::<u64>("timeout")
            .map_or(defaults.timeout, |s| Duration::from_secs(*s)),
        retries: sub_matches.get_one::<u32>("retries").copied().unwrap_or(defaults.retries),
        ..defaults
    };

    if let Some(ms) = sub_matches.get_one::<u64>("wait-ms") {
        options.wait_timeout = Duration::from_millis(*ms);
    }
    if let Some(ms) = sub_matches.get_one::<u64>("delay-ms") {
        options.page_delay = Duration::from_millis(*ms);
    }
    if let Some(depth) = sub_matches.get_one::<usize>("max-depth") {
        options.max_depth = *depth;
    }
    if let Some(pages) = sub_matches.get_one::<usize>("max-pages") {
        options.max_pages = *pages;
    }

    Ok(options)
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let mut options = build_crawl_options(sub_matches)?;
    options.show_progress_bars = !quiet;

    if !quiet {
        print_divider();
        println!("{}", "  DIRCRAWL".bright_white().bold());
        print_divider();
        println!(
            "{} Start: {}",
            "→".blue(),
            options.start_url.as_str().bright_white()
        );
        println!(
            "{} Output: {}",
            "→".blue(),
            options.output_root.display().to_string().bright_white()
        );
        println!(
            "{} Page delay: {}ms, wait: {}ms, max depth: {}",
            "→".blue(),
            options.page_delay.as_millis(),
            options.wait_timeout.as_millis(),
            options.max_depth
        );
        println!();
    }

    let summary = execute_crawl(options, None)
        .await
        .context("Crawl failed")?;

    if !quiet {
        println!("\n{} Crawl complete!\n", "✓".green().bold());
        print!("{}", generate_crawl_report(&summary));
    }
    Ok(())
}
