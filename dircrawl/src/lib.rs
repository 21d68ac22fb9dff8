pub mod commands;
pub mod handlers;

pub use handlers::{build_crawl_options, handle_crawl, log_level, parse_url_line};

// Re-export crawl functionality from dircrawl-core
pub use dircrawl_core::crawl::{CrawlOptions, execute_crawl, extract_url_path, generate_crawl_report};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
