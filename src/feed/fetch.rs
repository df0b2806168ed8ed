// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::FeedError;
use crate::http::HttpClient;

/// Fetch the raw feed document from a URL (without parsing)
pub async fn fetch_feed_text<C: HttpClient>(client: &C, url: &str) -> Result<String, FeedError> {
    client
        .get_text(url)
        .await
        .map_err(|e| FeedError::FetchFailed {
            url: url.to_string(),
            source: e,
        })
}
