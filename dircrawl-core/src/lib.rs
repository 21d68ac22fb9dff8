pub mod crawl;
pub mod error;
pub mod explore;
pub mod namespace;
pub mod sink;

pub use crawl::{CrawlOptions, execute_crawl, generate_crawl_report};
pub use error::CrawlError;
pub use explore::{CategoryExplorer, CategoryNode, CrawlProgressCallback, CrawlSummary};
pub use namespace::{StorageNamespace, sanitize_name};
pub use sink::{ArtifactFormat, FsSink, OutputSink};
