use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::CacheOutcome;
use crate::state::SkipReason;

/// Events emitted during a feed sync for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Feed is being fetched from URL
    FetchingFeed { url: String },

    /// The local feed cache has been brought up to date
    FeedCacheSynced { path: PathBuf, outcome: CacheOutcome },

    /// Feed has been parsed successfully
    FeedParsed { feed_title: String, total_items: usize },

    /// Processing of an item begins
    ItemStarting {
        /// One-based position in traversal order
        item_number: usize,
        total_items: usize,
        item_title: String,
    },

    /// An enclosure was left alone
    EnclosureSkipped { filename: String, reason: SkipReason },

    /// An incomplete file was deleted and will be fetched again
    ReplacingIncomplete {
        filename: String,
        existing: u64,
        declared: u64,
    },

    /// A download is starting
    DownloadStarting {
        item_title: String,
        filename: String,
        item_number: usize,
        total_items: usize,
        /// Expected content length in bytes, if known
        content_length: Option<u64>,
    },

    /// Download progress update
    DownloadProgress {
        filename: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// A download completed successfully
    DownloadCompleted {
        filename: String,
        bytes_downloaded: u64,
    },

    /// A download failed; the run carries on with the next enclosure
    DownloadFailed { filename: String, error: String },

    /// Sync operation completed
    SyncCompleted {
        downloaded_count: usize,
        skipped_count: usize,
        failed_count: usize,
    },
}

/// Trait for reporting progress events during synchronization.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
