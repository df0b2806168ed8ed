// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::borrow::Cow;

use url::Url;

use super::sanitize::{SanitizeMode, sanitize_title};

/// Everything needed to name one enclosure on disk
#[derive(Debug, Clone, Copy)]
pub struct NamingContext<'a> {
    /// Prefix filenames with their position in the feed
    pub numbers: bool,
    /// Number from the oldest item instead of the newest
    pub oldest_first: bool,
    /// Total number of items in the feed
    pub feed_len: usize,
    /// Zero-based position of the item in traversal order
    pub item_position: usize,
    /// Number of enclosures attached to the item
    pub enclosure_count: usize,
    /// Zero-based position of the enclosure within its item
    pub enclosure_position: usize,
    pub title: &'a str,
    pub url: &'a str,
    pub sanitize: SanitizeMode,
}

/// Number of digits needed to print `count`, i.e. `floor(log10(count)) + 1`
///
/// Counts of 0 and 1 both yield a width of 1.
pub fn padding_width(count: usize) -> usize {
    count.checked_ilog10().map_or(1, |magnitude| magnitude as usize + 1)
}

/// Extension of the URL's path, including the leading dot
///
/// Taken from the percent-decoded last path segment; empty when that
/// segment has no dot. Query and fragment are ignored.
pub fn path_extension(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let raw = path.rsplit('/').next().unwrap_or_default();
    // Escapes that do not decode to UTF-8 are kept as written
    let segment = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));
    segment
        .rfind('.')
        .map(|dot| segment[dot..].to_string())
        .unwrap_or_default()
}

/// Position of the item as shown in its filename, counting from 1
fn feed_index(context: &NamingContext<'_>) -> usize {
    if context.oldest_first {
        context.item_position + 1
    } else {
        context.feed_len - context.item_position
    }
}

/// Derive the on-disk filename for an enclosure
///
/// Format: `"<feed index>[.<enclosure index>] - <title><ext>"` with numbering,
/// `"<title><ext>"` without. Indices are zero-padded so that filenames sort
/// in the same order as their numbers.
pub fn build_filename(context: &NamingContext<'_>) -> String {
    let base_name = format!(
        "{}{}",
        sanitize_title(context.title, context.sanitize),
        path_extension(context.url)
    );

    if !context.numbers {
        return base_name;
    }

    let mut prefix = format!(
        "{:0width$}",
        feed_index(context),
        width = padding_width(context.feed_len)
    );

    if context.enclosure_count > 1 {
        // Enclosures count down within their item, like items do in the feed
        prefix.push_str(&format!(
            ".{:0width$}",
            context.enclosure_count - context.enclosure_position,
            width = padding_width(context.enclosure_count)
        ));
    }

    format!("{} - {}", prefix, base_name)
}
