pub mod error;
pub mod extract;
pub mod normalize;
pub mod paginate;
pub mod result;
pub mod selectors;
pub mod session;

pub use error::ScrapeError;
pub use extract::{NextControl, RecordExtractor};
pub use normalize::{SENTINEL, normalize};
pub use paginate::{PageCursor, Paginator, StopReason, Traversal, TraversalOutcome};
pub use result::{COLUMNS, CrawlResult, ListingRecord};
pub use selectors::{CompiledProfile, SiteProfile};
pub use session::{HttpConfig, HttpFetcher, HttpSession, HttpSessionFactory, PageSession, SessionFactory};
