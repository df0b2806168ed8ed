mod fetch;
mod parse;

pub use fetch::fetch_feed_text;
pub use parse::{Enclosure, Feed, Item, parse_feed};
