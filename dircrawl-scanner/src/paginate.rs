use crate::error::{Result, ScrapeError};
use crate::extract::{NextControl, RecordExtractor};
use crate::result::{CrawlResult, ListingRecord};
use crate::session::{PageSession, SessionFactory};
use futures::stream::{self, Stream};
use scraper::Html;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Position within one category's paginated listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub current_url: Url,
    pub page_index: usize,
    pub has_next: bool,
}

/// Why a traversal ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EmptyPage,
    MarkerTimeout,
    NoNextControl,
    NextHidden,
    NextDisabled,
    NextWithoutTarget,
    RevisitedPage,
    PageLimit,
    NavigationFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EmptyPage => write!(f, "page had no listings"),
            StopReason::MarkerTimeout => write!(f, "listing marker never appeared"),
            StopReason::NoNextControl => write!(f, "no next-page control"),
            StopReason::NextHidden => write!(f, "next-page control hidden"),
            StopReason::NextDisabled => write!(f, "next-page control disabled"),
            StopReason::NextWithoutTarget => write!(f, "next-page control has no target"),
            StopReason::RevisitedPage => write!(f, "next page already visited"),
            StopReason::PageLimit => write!(f, "page limit reached"),
            StopReason::NavigationFailed(e) => write!(f, "navigation failed: {}", e),
        }
    }
}

/// Records found on one listing page.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub index: usize,
    pub url: Url,
    pub records: Vec<ListingRecord>,
}

/// Everything a finished traversal produced.
#[derive(Debug, Clone)]
pub struct TraversalOutcome {
    pub records: Vec<ListingRecord>,
    pub pages_visited: usize,
    pub stop_reason: StopReason,
}

impl TraversalOutcome {
    pub fn into_result(self, category: String, source_url: &Url) -> CrawlResult {
        CrawlResult {
            category,
            source_url: source_url.to_string(),
            pages_visited: self.pages_visited,
            records: self.records,
        }
    }
}

/// Drives the listing pages of one leaf category to completion.
pub struct Paginator<F: SessionFactory> {
    factory: F,
    extractor: RecordExtractor,
    wait_timeout: Duration,
    page_delay: Duration,
    max_pages: usize,
}

impl<F: SessionFactory> Paginator<F> {
    pub fn new(factory: F, extractor: RecordExtractor) -> Self {
        Self {
            factory,
            extractor,
            wait_timeout: Duration::from_millis(5000),
            page_delay: Duration::from_millis(1000),
            max_pages: 500,
        }
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn extractor(&self) -> &RecordExtractor {
        &self.extractor
    }

    /// Open a session and position a cursor on the first page. Nothing is fetched yet.
    pub async fn start(&self, leaf_url: &Url) -> Result<Traversal<'_, F::Session>> {
        let session = self.factory.open().await?;

        let mut first = leaf_url.clone();
        first.set_fragment(None);

        let mut visited = HashSet::new();
        visited.insert(first.to_string());

        Ok(Traversal {
            session: Some(session),
            extractor: &self.extractor,
            cursor: PageCursor {
                current_url: first,
                page_index: 1,
                has_next: true,
            },
            visited,
            wait_timeout: self.wait_timeout,
            page_delay: self.page_delay,
            max_pages: self.max_pages,
            delay_pending: false,
            pages_visited: 0,
            stop: None,
        })
    }

    /// Collect every page of a leaf.
    ///
    /// A navigation failure on the first page is returned as an error; on a later
    /// page the records gathered so far are kept.
    pub async fn traverse(&self, leaf_url: &Url) -> Result<TraversalOutcome> {
        let mut traversal = self.start(leaf_url).await?;
        let mut records = Vec::new();

        loop {
            match traversal.next_page().await {
                Ok(Some(page)) => records.extend(page.records),
                Ok(None) => break,
                Err(e) if traversal.pages_visited() == 0 => return Err(e),
                Err(e) => {
                    warn!("Keeping {} records from {} after: {}", records.len(), leaf_url, e);
                    break;
                }
            }
        }

        Ok(TraversalOutcome {
            records,
            pages_visited: traversal.pages_visited(),
            stop_reason: traversal
                .stop_reason()
                .cloned()
                .unwrap_or(StopReason::NoNextControl),
        })
    }
}

/// A single pass over a leaf's pages. Not restartable; the session is released
/// when the pass ends or the traversal is dropped.
pub struct Traversal<'a, S: PageSession> {
    session: Option<S>,
    extractor: &'a RecordExtractor,
    cursor: PageCursor,
    visited: HashSet<String>,
    wait_timeout: Duration,
    page_delay: Duration,
    max_pages: usize,
    delay_pending: bool,
    pages_visited: usize,
    stop: Option<StopReason>,
}

enum Loaded {
    Ready,
    MarkerMissing,
    Failed(ScrapeError),
}

impl<'a, S: PageSession> Traversal<'a, S> {
    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop.as_ref()
    }

    pub fn pages_visited(&self) -> usize {
        self.pages_visited
    }

    /// Load the page under the cursor and return its records, or `None` once
    /// pagination has ended.
    pub async fn next_page(&mut self) -> Result<Option<ListingPage>> {
        if self.stop.is_some() {
            return Ok(None);
        }

        if self.delay_pending {
            self.delay_pending = false;
            tokio::time::sleep(self.page_delay).await;
        }

        let url = self.cursor.current_url.clone();
        let index = self.cursor.page_index;
        info!("Scraping page {}: {}", index, url);

        let loaded = match self.session.as_mut() {
            None => return Ok(None),
            Some(session) => match session.navigate(&url).await {
                Err(e) => Loaded::Failed(e),
                Ok(()) => {
                    let marker = &self.extractor.profile().listing_marker;
                    match tokio::time::timeout(self.wait_timeout, session.wait_for(marker)).await {
                        Ok(Ok(true)) => Loaded::Ready,
                        Ok(Ok(false)) | Err(_) => Loaded::MarkerMissing,
                        Ok(Err(e)) => Loaded::Failed(e),
                    }
                }
            },
        };

        match loaded {
            Loaded::Failed(e) => {
                warn!("Failed to load page {} ({}): {}", index, url, e);
                self.finish(StopReason::NavigationFailed(e.to_string())).await;
                return Err(e);
            }
            Loaded::MarkerMissing => {
                self.pages_visited += 1;
                self.finish(StopReason::MarkerTimeout).await;
                return Ok(None);
            }
            Loaded::Ready => self.pages_visited += 1,
        }

        let (records, next) = match self.session.as_ref() {
            Some(session) => {
                let document = Html::parse_document(session.content());
                (
                    self.extractor.extract(&document),
                    self.extractor.find_next(&document, &url),
                )
            }
            None => return Ok(None),
        };

        if records.is_empty() {
            self.finish(StopReason::EmptyPage).await;
            return Ok(None);
        }
        info!("Total listings scraped on page {}: {}", index, records.len());

        match next {
            NextControl::Target(next_url) => self.advance(next_url).await,
            NextControl::Absent => self.finish(StopReason::NoNextControl).await,
            NextControl::Hidden => self.finish(StopReason::NextHidden).await,
            NextControl::Disabled => self.finish(StopReason::NextDisabled).await,
            NextControl::MissingTarget => self.finish(StopReason::NextWithoutTarget).await,
        }

        Ok(Some(ListingPage {
            index,
            url,
            records,
        }))
    }

    async fn advance(&mut self, next_url: Url) {
        if !self.visited.insert(next_url.to_string()) {
            self.finish(StopReason::RevisitedPage).await;
            return;
        }
        if self.cursor.page_index >= self.max_pages {
            self.finish(StopReason::PageLimit).await;
            return;
        }

        debug!("Next page: {}", next_url);
        self.cursor.current_url = next_url;
        self.cursor.page_index += 1;
        self.delay_pending = true;
    }

    async fn finish(&mut self, reason: StopReason) {
        info!(
            "Pagination of {} stopped at page {}: {}",
            self.cursor.current_url, self.cursor.page_index, reason
        );
        self.cursor.has_next = false;
        self.stop = Some(reason);

        if let Some(mut session) = self.session.take()
            && let Err(e) = session.close().await
        {
            warn!("Failed to close session: {}", e);
        }
    }

    /// Flatten the remaining pages into a lazy record stream. An error ends the stream.
    pub fn into_records(self) -> impl Stream<Item = ListingRecord> + 'a
    where
        S: 'a,
    {
        stream::unfold(
            (self, VecDeque::new()),
            |(mut traversal, mut buffer)| async move {
                loop {
                    if let Some(record) = buffer.pop_front() {
                        return Some((record, (traversal, buffer)));
                    }
                    match traversal.next_page().await {
                        Ok(Some(page)) => buffer.extend(page.records),
                        Ok(None) => return None,
                        Err(e) => {
                            warn!("Record stream ended early: {}", e);
                            return None;
                        }
                    }
                }
            },
        )
    }
}

impl<S: PageSession> Drop for Traversal<'_, S> {
    fn drop(&mut self) {
        if self.session.take().is_some() {
            debug!(
                "Traversal dropped at page {}, releasing session",
                self.cursor.page_index
            );
        }
    }
}
