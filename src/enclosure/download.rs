use std::path::Path;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::DownloadError;
use crate::feed::Enclosure;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Where an enclosure download sits within the run, for progress output
#[derive(Debug, Clone)]
pub struct DownloadContext {
    /// Title of the item the enclosure belongs to
    pub item_title: String,
    /// Final filename (without directory)
    pub filename: String,
    /// One-based position of the item in traversal order
    pub item_number: usize,
    /// Total number of items in the feed
    pub total_items: usize,
}

/// Download an enclosure to the specified output path
///
/// Streams the response body to disk, reporting progress through the reporter.
/// Returns the number of bytes downloaded on success. A failure part-way
/// through leaves whatever was written in place; the next run sees it as
/// incomplete when the feed declares a length.
pub async fn download_enclosure<C: HttpClient>(
    client: &C,
    enclosure: &Enclosure,
    output_path: &Path,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let url = enclosure.url.as_str();

    let response = client
        .get_stream(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !(200..300).contains(&response.status) {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    reporter.report(ProgressEvent::DownloadStarting {
        item_title: context.item_title.clone(),
        filename: context.filename.clone(),
        item_number: context.item_number,
        total_items: context.total_items,
        content_length: response.content_length,
    });

    let mut file =
        File::create(output_path)
            .await
            .map_err(|e| DownloadError::FileCreateFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;

    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;

        bytes_downloaded += chunk.len() as u64;

        reporter.report(ProgressEvent::DownloadProgress {
            filename: context.filename.clone(),
            bytes_downloaded,
            total_bytes: response.content_length,
        });
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    debug!(path = %output_path.display(), bytes = bytes_downloaded, "enclosure written");

    reporter.report(ProgressEvent::DownloadCompleted {
        filename: context.filename.clone(),
        bytes_downloaded,
    });

    Ok(bytes_downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ByteStream, HttpResponse};
    use crate::progress::NoopReporter;
    use async_trait::async_trait;
    use bytes::Bytes;

    use tempfile::tempdir;

    struct MockHttpClient {
        chunks: Vec<&'static str>,
        status: u16,
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_text(&self, _url: &str) -> Result<String, reqwest::Error> {
            Ok(self.chunks.concat())
        }

        async fn get_stream(&self, _url: &str) -> Result<HttpResponse, reqwest::Error> {
            let len: u64 = self.chunks.iter().map(|c| c.len() as u64).sum();
            let chunks: Vec<Result<Bytes, reqwest::Error>> = self
                .chunks
                .iter()
                .copied()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect();

            let stream: ByteStream = Box::pin(futures::stream::iter(chunks));

            Ok(HttpResponse {
                status: self.status,
                content_length: Some(len),
                body: stream,
            })
        }
    }

    fn make_enclosure() -> Enclosure {
        Enclosure {
            url: "https://example.com/episode.mp3".to_string(),
            length: "1000".to_string(),
        }
    }

    fn make_context() -> DownloadContext {
        DownloadContext {
            item_title: "Test Episode".to_string(),
            filename: "1 - Test Episode.mp3".to_string(),
            item_number: 1,
            total_items: 1,
        }
    }

    #[tokio::test]
    async fn download_writes_all_chunks() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("1 - Test Episode.mp3");

        let client = MockHttpClient {
            chunks: vec!["test ", "audio ", "content"],
            status: 200,
        };

        let bytes = download_enclosure(
            &client,
            &make_enclosure(),
            &output_path,
            &make_context(),
            &NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(bytes, 18);
        let content = std::fs::read(&output_path).unwrap();
        assert_eq!(content, b"test audio content");
    }

    #[tokio::test]
    async fn download_truncates_existing_file() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("ep.mp3");
        std::fs::write(&output_path, b"old and much longer content").unwrap();

        let client = MockHttpClient {
            chunks: vec!["new"],
            status: 200,
        };

        download_enclosure(
            &client,
            &make_enclosure(),
            &output_path,
            &make_context(),
            &NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(&output_path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn download_fails_on_http_error() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("episode.mp3");

        let client = MockHttpClient {
            chunks: vec!["Not Found"],
            status: 404,
        };

        let result = download_enclosure(
            &client,
            &make_enclosure(),
            &output_path,
            &make_context(),
            &NoopReporter::shared(),
        )
        .await;

        match result.unwrap_err() {
            DownloadError::HttpStatus { status, .. } => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got {other:?}"),
        }
        assert!(!output_path.exists());
    }

    #[tokio::test]
    async fn download_fails_when_directory_is_missing() {
        let dir = tempdir().unwrap();
        let output_path = dir.path().join("missing").join("episode.mp3");

        let client = MockHttpClient {
            chunks: vec!["data"],
            status: 200,
        };

        let result = download_enclosure(
            &client,
            &make_enclosure(),
            &output_path,
            &make_context(),
            &NoopReporter::shared(),
        )
        .await;

        assert!(matches!(
            result,
            Err(DownloadError::FileCreateFailed { .. })
        ));
    }
}
