// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::CacheError;

/// Filename of the feed cache inside the output directory
pub const FEED_CACHE_FILENAME: &str = "feed.xml";

/// What synchronizing the feed cache did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// There was no cache yet
    Created,
    /// The cached document differed and was rewritten
    Updated,
    /// The cached document already matched, nothing was written
    Unchanged,
}

/// Make the cache file at `path` hold exactly `document`
///
/// The file is only written when it is missing or its content differs, so
/// its modification time tracks upstream changes.
pub fn sync_feed_cache(path: &Path, document: &str) -> Result<CacheOutcome, CacheError> {
    let outcome = match std::fs::read(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            write_cache(path, document)?;
            CacheOutcome::Created
        }
        Err(e) => {
            return Err(CacheError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
        Ok(cached) if cached == document.as_bytes() => CacheOutcome::Unchanged,
        Ok(_) => {
            std::fs::remove_file(path).map_err(|e| CacheError::RemoveFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
            write_cache(path, document)?;
            CacheOutcome::Updated
        }
    };

    debug!(path = %path.display(), ?outcome, "feed cache synchronized");
    Ok(outcome)
}

fn write_cache(path: &Path, document: &str) -> Result<(), CacheError> {
    std::fs::write(path, document).map_err(|e| CacheError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tempfile::tempdir;

    const DOCUMENT: &str = "<rss version=\"2.0\"><channel/></rss>";

    #[test]
    fn creates_missing_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FEED_CACHE_FILENAME);

        assert_eq!(
            sync_feed_cache(&path, DOCUMENT).unwrap(),
            CacheOutcome::Created
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOCUMENT);
    }

    #[test]
    fn rewrites_changed_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FEED_CACHE_FILENAME);
        std::fs::write(&path, b"an older, longer version of the feed document").unwrap();

        assert_eq!(
            sync_feed_cache(&path, DOCUMENT).unwrap(),
            CacheOutcome::Updated
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOCUMENT);
    }

    #[test]
    fn second_sync_is_a_no_op() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FEED_CACHE_FILENAME);

        sync_feed_cache(&path, DOCUMENT).unwrap();

        // Backdate the file so any rewrite would be visible in its mtime
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let past = UNIX_EPOCH + Duration::from_secs(now - 3600);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(past)
            .unwrap();

        assert_eq!(
            sync_feed_cache(&path, DOCUMENT).unwrap(),
            CacheOutcome::Unchanged
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOCUMENT);
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), past);
    }

    #[test]
    fn unreadable_cache_is_an_error() {
        let dir = tempdir().unwrap();
        // A directory where the cache file should be cannot be read as a file
        let path = dir.path().join(FEED_CACHE_FILENAME);
        std::fs::create_dir(&path).unwrap();

        let result = sync_feed_cache(&path, DOCUMENT);
        assert!(matches!(result, Err(CacheError::ReadFailed { .. })));
    }

    #[test]
    fn unwritable_location_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join(FEED_CACHE_FILENAME);

        let result = sync_feed_cache(&path, DOCUMENT);
        assert!(matches!(result, Err(CacheError::WriteFailed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn stale_cache_that_cannot_be_removed_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        let path = locked.join(FEED_CACHE_FILENAME);
        std::fs::write(&path, "an older feed document").unwrap();

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();
        // Privileged users ignore directory permissions, nothing to observe then
        let privileged = std::fs::write(locked.join("write-check"), "x").is_ok();

        let result = sync_feed_cache(&path, DOCUMENT);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        if privileged {
            return;
        }
        assert!(matches!(result, Err(CacheError::RemoveFailed { .. })));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "an older feed document"
        );
    }
}
