// Depth-first exploration of a directory's category tree

use crate::error::CrawlError;
use crate::namespace::{StorageNamespace, is_usable_segment, sanitize_name};
use crate::sink::OutputSink;
use chrono::{DateTime, Utc};
use dircrawl_scanner::extract::resolve_href;
use dircrawl_scanner::normalize::collapse_whitespace;
use dircrawl_scanner::{CompiledProfile, HttpFetcher, Paginator, SessionFactory, normalize};
use futures::future::{BoxFuture, FutureExt};
use scraper::Html;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

/// Callback for human-readable progress messages.
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A taxonomy entry found on its parent's page.
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub name: String,
    pub source_url: Url,
    pub namespace: StorageNamespace,
}

/// Name and target of one category-container element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    pub name: String,
    pub href: String,
    pub url: Option<Url>,
}

/// Whether the page lists any category containers at all. A page without them is a leaf.
pub fn has_category_containers(document: &Html, profile: &CompiledProfile) -> bool {
    document.select(&profile.category_container).next().is_some()
}

/// Category links on a page, in document order. Containers without a link are ignored.
pub fn parse_category_links(
    document: &Html,
    base: &Url,
    profile: &CompiledProfile,
) -> Vec<CategoryLink> {
    document
        .select(&profile.category_container)
        .filter_map(|container| container.select(&profile.category_link).next())
        .map(|anchor| {
            let name = normalize(collapse_whitespace(&anchor.text().collect::<String>()));
            let href = anchor.value().attr("href").unwrap_or_default().to_string();
            let url = resolve_href(base, &href);
            CategoryLink { name, href, url }
        })
        .collect()
}

/// A leaf whose records reached the sink.
#[derive(Debug, Clone, Serialize)]
pub struct LeafReport {
    pub category: String,
    pub url: String,
    pub path: PathBuf,
    pub records: usize,
    pub pages: usize,
    pub stop_reason: String,
    pub artifacts: Vec<PathBuf>,
}

/// A node whose subtree was not crawled.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedNode {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub root_url: String,
    pub output_root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub categories_visited: usize,
    pub leaves: Vec<LeafReport>,
    pub skipped: Vec<SkippedNode>,
}

impl CrawlSummary {
    pub fn new(root_url: &Url, output_root: PathBuf) -> Self {
        Self {
            root_url: root_url.to_string(),
            output_root,
            started_at: Utc::now(),
            finished_at: None,
            categories_visited: 0,
            leaves: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn records_written(&self) -> usize {
        self.leaves.iter().map(|l| l.records).sum()
    }

    pub fn artifacts_written(&self) -> usize {
        self.leaves.iter().map(|l| l.artifacts.len()).sum()
    }

    fn skip(&mut self, url: impl ToString, reason: impl ToString) {
        self.skipped.push(SkippedNode {
            url: url.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Mutable state threaded through one crawl.
struct CrawlState {
    visited: HashSet<String>,
    claimed: HashSet<PathBuf>,
    summary: CrawlSummary,
}

fn visit_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.to_string()
}

/// Walks the category tree one node at a time and hands each leaf to the paginator.
pub struct CategoryExplorer<F: SessionFactory, K: OutputSink> {
    fetcher: HttpFetcher,
    paginator: Paginator<F>,
    sink: K,
    max_depth: usize,
    progress_callback: Option<CrawlProgressCallback>,
}

impl<F: SessionFactory, K: OutputSink> CategoryExplorer<F, K> {
    pub fn new(fetcher: HttpFetcher, paginator: Paginator<F>, sink: K) -> Self {
        Self {
            fetcher,
            paginator,
            sink,
            max_depth: 16,
            progress_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_progress_callback(mut self, callback: CrawlProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn report(&self, message: String) {
        if let Some(ref callback) = self.progress_callback {
            callback(message);
        }
    }

    /// Explore everything below `root_url`, writing artifacts under `output_root`.
    ///
    /// Only a failure to create `output_root` itself is an error; every other
    /// failure skips the affected subtree and is recorded in the summary.
    pub async fn crawl(
        &self,
        root_url: &Url,
        output_root: impl Into<PathBuf>,
    ) -> Result<CrawlSummary, CrawlError> {
        let output_root = output_root.into();
        info!("Starting crawl of {} into {}", root_url, output_root.display());

        let namespace = StorageNamespace::root(output_root.clone());
        namespace.create()?;

        let mut state = CrawlState {
            visited: HashSet::new(),
            claimed: HashSet::from([output_root.clone()]),
            summary: CrawlSummary::new(root_url, output_root),
        };

        let root = CategoryNode {
            name: "(root)".to_string(),
            source_url: root_url.clone(),
            namespace,
        };
        self.explore(root, 0, &mut state).await;

        let mut summary = state.summary;
        summary.finished_at = Some(Utc::now());
        info!(
            "Crawl complete. {} categories, {} leaves, {} records, {} skipped",
            summary.categories_visited,
            summary.leaves.len(),
            summary.records_written(),
            summary.skipped.len()
        );
        Ok(summary)
    }

    fn explore<'a>(
        &'a self,
        node: CategoryNode,
        depth: usize,
        state: &'a mut CrawlState,
    ) -> BoxFuture<'a, ()> {
        async move {
            if depth > self.max_depth {
                warn!("Not descending into {}: depth limit {} reached", node.source_url, self.max_depth);
                state.summary.skip(&node.source_url, "depth limit reached");
                return;
            }
            if !state.visited.insert(visit_key(&node.source_url)) {
                warn!("Already visited {}, skipping", node.source_url);
                state.summary.skip(&node.source_url, "already visited");
                return;
            }

            self.report(format!("Exploring {}", node.namespace.display_chain()));
            let body = match self.fetcher.fetch(&node.source_url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Failed to fetch {}: {}", node.source_url, e);
                    state.summary.skip(&node.source_url, e);
                    return;
                }
            };
            state.summary.categories_visited += 1;

            let links = {
                let document = Html::parse_document(&body);
                let profile = self.paginator.extractor().profile();
                has_category_containers(&document, profile)
                    .then(|| parse_category_links(&document, &node.source_url, profile))
            };

            let Some(links) = links else {
                info!("No categories found at {}, scraping this page directly", node.source_url);
                self.scrape_leaf(node, state).await;
                return;
            };

            if links.is_empty() {
                warn!("Categories at {} carry no links, nothing to descend into", node.source_url);
                return;
            }

            debug!("{} category links at {}", links.len(), node.source_url);
            let children = self.prepare_children(&node, depth + 1, links, state);
            for child in children {
                self.explore(child, depth + 1, state).await;
            }
        }
        .boxed()
    }

    /// Validate links and create every child namespace before any descent.
    fn prepare_children(
        &self,
        parent: &CategoryNode,
        child_depth: usize,
        links: Vec<CategoryLink>,
        state: &mut CrawlState,
    ) -> Vec<CategoryNode> {
        let mut children = Vec::with_capacity(links.len());
        let mut pending = HashSet::new();

        for link in links {
            let Some(url) = link.url else {
                warn!("Category '{}' has no usable link ({:?})", link.name, link.href);
                state.summary.skip(&link.href, format!("category '{}' has no usable link", link.name));
                continue;
            };

            let segment = sanitize_name(&link.name);
            if !is_usable_segment(&segment) {
                warn!("Category name {:?} at {} is not usable as a directory", link.name, url);
                state.summary.skip(&url, "category name unusable as a directory");
                continue;
            }

            if child_depth > self.max_depth {
                warn!("Not descending into {}: depth limit {} reached", url, self.max_depth);
                state.summary.skip(&url, "depth limit reached");
                continue;
            }

            let key = visit_key(&url);
            if state.visited.contains(&key) {
                warn!("Category '{}' points back to visited {}", link.name, url);
                state.summary.skip(&url, "already visited");
                continue;
            }
            if !pending.insert(key) {
                warn!("Category '{}' repeats a sibling link to {}", link.name, url);
                state.summary.skip(&url, "duplicate sibling link");
                continue;
            }

            let namespace = parent.namespace.child(&segment);
            if !state.claimed.insert(namespace.path().to_path_buf()) {
                let err = CrawlError::NamespaceCollision(namespace.path().to_path_buf());
                warn!("Skipping '{}': {}", link.name, err);
                state.summary.skip(&url, err);
                continue;
            }

            if let Err(e) = namespace.create() {
                error!("Skipping subtree '{}': {}", link.name, e);
                state.summary.skip(&url, e);
                continue;
            }

            children.push(CategoryNode {
                name: link.name,
                source_url: url,
                namespace,
            });
        }

        children
    }

    async fn scrape_leaf(&self, node: CategoryNode, state: &mut CrawlState) {
        self.report(format!("Scraping {}", node.namespace.display_chain()));

        let outcome = match self.paginator.traverse(&node.source_url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Failed to scrape {}: {}", node.source_url, e);
                state.summary.skip(&node.source_url, e);
                return;
            }
        };

        let pages = outcome.pages_visited;
        let stop_reason = outcome.stop_reason.to_string();
        let result = outcome.into_result(node.name.clone(), &node.source_url);

        match self.sink.write(&node.namespace, &result) {
            Ok(artifacts) => {
                info!(
                    "{}: {} records from {} pages ({})",
                    node.namespace.display_chain(),
                    result.len(),
                    pages,
                    stop_reason
                );
                state.summary.leaves.push(LeafReport {
                    category: node.name,
                    url: node.source_url.to_string(),
                    path: node.namespace.path().to_path_buf(),
                    records: result.len(),
                    pages,
                    stop_reason,
                    artifacts,
                });
            }
            Err(e) => {
                error!("Failed to write results for {}: {}", node.source_url, e);
                state.summary.skip(&node.source_url, e);
            }
        }
    }
}
