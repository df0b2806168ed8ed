pub mod cache;
pub mod enclosure;
pub mod error;
pub mod feed;
pub mod http;
pub mod progress;
pub mod state;
pub mod sync;

// Re-export main types for convenience
pub use cache::{CacheOutcome, FEED_CACHE_FILENAME, sync_feed_cache};
pub use enclosure::{NamingContext, SanitizeMode, build_filename, sanitize_title};
pub use error::{CacheError, DownloadError, FeedError, SyncError};
pub use feed::{Enclosure, Feed, Item, fetch_feed_text, parse_feed};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use state::{SkipReason, Verdict, decide, judge_target};
pub use sync::{SyncOptions, SyncResult, download_feed, sync_feed};
