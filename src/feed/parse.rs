// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::FeedError;

/// Title used for items that carry none
const UNTITLED: &str = "Untitled";

/// A parsed syndication feed (RSS 2.0 or Atom)
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    /// Items in document order (usually newest first)
    pub items: Vec<Item>,
}

/// A single feed item with its attached enclosures
#[derive(Debug, Clone)]
pub struct Item {
    pub title: String,
    pub enclosures: Vec<Enclosure>,
}

/// A downloadable media resource attached to an item
///
/// Both fields are kept verbatim from the document. The length is only
/// interpreted when judging an existing file, where a malformed value
/// means the file cannot be verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosure {
    pub url: String,
    pub length: String,
}

/// Parse a raw feed document, trying RSS first and Atom second
///
/// Items without enclosures are kept so that they still count towards
/// the feed length used for numbering.
pub fn parse_feed(document: &[u8]) -> Result<Feed, FeedError> {
    let rss_error = match rss::Channel::read_from(document) {
        Ok(channel) => return Ok(from_rss(&channel)),
        Err(e) => e,
    };

    match atom_syndication::Feed::read_from(document) {
        Ok(feed) => Ok(from_atom(&feed)),
        Err(atom_error) => Err(FeedError::ParseFailed {
            rss: rss_error,
            atom: atom_error,
        }),
    }
}

fn from_rss(channel: &rss::Channel) -> Feed {
    let items = channel
        .items()
        .iter()
        .map(|item| Item {
            title: item.title().unwrap_or(UNTITLED).to_string(),
            enclosures: item
                .enclosure()
                .map(|enclosure| Enclosure {
                    url: enclosure.url().to_string(),
                    length: enclosure.length().to_string(),
                })
                .into_iter()
                .collect(),
        })
        .collect();

    Feed {
        title: channel.title().to_string(),
        items,
    }
}

fn from_atom(feed: &atom_syndication::Feed) -> Feed {
    let items = feed
        .entries()
        .iter()
        .map(|entry| {
            let title = Some(entry.title().as_str())
                .filter(|t| !t.is_empty())
                .unwrap_or(UNTITLED);

            // Every enclosure link counts, in document order
            let enclosures = entry
                .links()
                .iter()
                .filter(|link| link.rel() == "enclosure")
                .map(|link| Enclosure {
                    url: link.href().to_string(),
                    length: link.length().unwrap_or_default().to_string(),
                })
                .collect();

            Item {
                title: title.to_string(),
                enclosures,
            }
        })
        .collect();

    Feed {
        title: feed.title().as_str().to_string(),
        items,
    }
}
