// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Streamed enclosure response; the status is checked by the caller
pub struct HttpResponse {
    pub status: u16,
    /// Content-Length header value, if present
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

/// The two ways this tool talks HTTP, behind a trait so tests can serve canned data
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch a feed document as text
    ///
    /// A non-success status is an error: an error page must never be
    /// mistaken for, or cached as, the feed.
    async fn get_text(&self, url: &str) -> Result<String, reqwest::Error>;

    /// Start an enclosure download and hand back its body as a stream
    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error>;
}

/// [`HttpClient`] backed by a single shared `reqwest::Client`
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_text(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let response = self.client.get(url).send().await?;

        Ok(HttpResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: Box::pin(response.bytes_stream()),
        })
    }
}
