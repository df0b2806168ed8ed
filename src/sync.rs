// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};

use crate::cache::{FEED_CACHE_FILENAME, sync_feed_cache};
use crate::enclosure::{
    DownloadContext, NamingContext, SanitizeMode, build_filename, download_enclosure,
};
use crate::error::{DownloadError, SyncError};
use crate::feed::{Enclosure, Feed, fetch_feed_text, parse_feed};
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::state::{Verdict, judge_target};

/// Options for feed synchronization
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Prefix filenames with their position in the feed
    pub numbers: bool,
    /// Process and number items starting from the oldest
    pub oldest_first: bool,
    /// Directory receiving the enclosures and the feed cache
    pub output_dir: PathBuf,
    /// How item titles are made safe for filenames
    pub sanitize: SanitizeMode,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            numbers: true,
            oldest_first: false,
            output_dir: PathBuf::from("."),
            sanitize: SanitizeMode::for_host(),
        }
    }
}

/// Result of a sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    /// Number of enclosures successfully downloaded
    pub downloaded: usize,
    /// Number of enclosures left alone
    pub skipped: usize,
    /// Number of enclosures that failed to download
    pub failed: usize,
    /// Details of failed enclosures (filename, error message)
    pub failed_enclosures: Vec<(String, String)>,
}

/// What happened to a single enclosure
enum EnclosureOutcome {
    Downloaded,
    Skipped,
}

/// Synchronize a feed's enclosures into the output directory
///
/// This is the main entry point for the library. It:
/// 1. Fetches the feed document
/// 2. Brings the local feed cache up to date
/// 3. Parses the feed
/// 4. Downloads every enclosure that is missing or incomplete, one at a time
///
/// Only the first three steps can fail the run. Failures of individual
/// enclosures end up in [`SyncResult::failed_enclosures`].
pub async fn sync_feed<C: HttpClient>(
    client: &C,
    feed_url: &str,
    options: &SyncOptions,
    reporter: SharedProgressReporter,
) -> Result<SyncResult, SyncError> {
    reporter.report(ProgressEvent::FetchingFeed {
        url: feed_url.to_string(),
    });

    let document = fetch_feed_text(client, feed_url).await?;

    std::fs::create_dir_all(&options.output_dir).map_err(|e| {
        SyncError::CreateOutputDirFailed {
            path: options.output_dir.clone(),
            source: e,
        }
    })?;

    let cache_path = options.output_dir.join(FEED_CACHE_FILENAME);
    let outcome = sync_feed_cache(&cache_path, &document)?;
    reporter.report(ProgressEvent::FeedCacheSynced {
        path: cache_path,
        outcome,
    });

    let feed = parse_feed(document.as_bytes())?;
    info!(title = %feed.title, items = feed.items.len(), "feed parsed");
    reporter.report(ProgressEvent::FeedParsed {
        feed_title: feed.title.clone(),
        total_items: feed.items.len(),
    });

    let result = download_feed(client, &feed, options, &reporter).await;

    reporter.report(ProgressEvent::SyncCompleted {
        downloaded_count: result.downloaded,
        skipped_count: result.skipped,
        failed_count: result.failed,
    });

    Ok(result)
}

/// Download the enclosures of an already parsed feed
///
/// Items are visited in document order, or reversed in oldest-first mode.
/// Enclosures are always visited in document order.
pub async fn download_feed<C: HttpClient>(
    client: &C,
    feed: &Feed,
    options: &SyncOptions,
    reporter: &SharedProgressReporter,
) -> SyncResult {
    let mut result = SyncResult::default();
    let total_items = feed.items.len();

    let mut queue: Vec<_> = feed.items.iter().collect();
    if options.oldest_first {
        queue.reverse();
    }

    for (item_position, item) in queue.into_iter().enumerate() {
        reporter.report(ProgressEvent::ItemStarting {
            item_number: item_position + 1,
            total_items,
            item_title: item.title.clone(),
        });

        let enclosure_count = item.enclosures.len();

        for (enclosure_position, enclosure) in item.enclosures.iter().enumerate() {
            let filename = build_filename(&NamingContext {
                numbers: options.numbers,
                oldest_first: options.oldest_first,
                feed_len: total_items,
                item_position,
                enclosure_count,
                enclosure_position,
                title: &item.title,
                url: &enclosure.url,
                sanitize: options.sanitize,
            });

            let context = DownloadContext {
                item_title: item.title.clone(),
                filename: filename.clone(),
                item_number: item_position + 1,
                total_items,
            };
            match process_enclosure(client, enclosure, &options.output_dir, &context, reporter)
                .await
            {
                Ok(EnclosureOutcome::Downloaded) => result.downloaded += 1,
                Ok(EnclosureOutcome::Skipped) => result.skipped += 1,
                Err(e) => {
                    warn!(filename = %filename, error = %e, "enclosure failed");
                    reporter.report(ProgressEvent::DownloadFailed {
                        filename: filename.clone(),
                        error: e.to_string(),
                    });
                    result.failed += 1;
                    result.failed_enclosures.push((filename, e.to_string()));
                }
            }
        }
    }

    result
}

/// Resolve a filename inside the output directory
///
/// Titles are not sanitized on every platform, so a name may still be an
/// absolute path or contain separators and `..`. Only a single plain path
/// component is accepted.
fn target_path(output_dir: &Path, filename: &str) -> Result<PathBuf, DownloadError> {
    let mut components = Path::new(filename).components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(output_dir.join(filename)),
        _ => Err(DownloadError::UnsafeFilename {
            filename: filename.to_string(),
        }),
    }
}

/// Judge one enclosure's target and fetch it when needed
async fn process_enclosure<C: HttpClient>(
    client: &C,
    enclosure: &Enclosure,
    output_dir: &Path,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<EnclosureOutcome, DownloadError> {
    let target = target_path(output_dir, &context.filename)?;

    match judge_target(&target, &enclosure.length) {
        Verdict::Skip(reason) => {
            info!(filename = %context.filename, %reason, "skipping enclosure");
            reporter.report(ProgressEvent::EnclosureSkipped {
                filename: context.filename.clone(),
                reason,
            });
            return Ok(EnclosureOutcome::Skipped);
        }
        Verdict::Replace { existing, declared } => {
            reporter.report(ProgressEvent::ReplacingIncomplete {
                filename: context.filename.clone(),
                existing,
                declared,
            });
            tokio::fs::remove_file(&target)
                .await
                .map_err(|e| DownloadError::RemoveFailed {
                    path: target.clone(),
                    source: e,
                })?;
        }
        Verdict::Create => {}
    }

    download_enclosure(client, enclosure, &target, context, reporter).await?;
    Ok(EnclosureOutcome::Downloaded)
}
