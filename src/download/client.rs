//! HTTP client wrapper for listing pages and streamed downloads.
//!
//! This module provides the `HttpClient` struct used by both the scanner
//! (full-body GET of listing pages) and the download coordinator (streamed
//! GET of files, chunk by chunk).

use std::ops::ControlFlow;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, trace};
use url::Url;

use super::constants::{CHUNK_SIZE, CONNECT_TIMEOUT_SECS, PAGE_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::{DownloadError, FetchError};
use crate::user_agent;

/// Timeout configuration for [`HttpClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    /// TCP/TLS connect timeout.
    pub connect: Duration,
    /// Maximum idle time between body reads while streaming.
    pub read: Duration,
    /// Total time allowed for one listing page.
    pub page: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read: Duration::from_secs(READ_TIMEOUT_SECS),
            page: Duration::from_secs(PAGE_TIMEOUT_SECS),
        }
    }
}

/// How a streamed download ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The whole body was written to the sink.
    Completed {
        /// Bytes written.
        bytes_written: u64,
        /// `Content-Length` of the response, 0 when the server sent none.
        total_size: u64,
    },
    /// The chunk callback asked to stop; the sink holds a truncated body.
    Stopped {
        /// Bytes written before stopping.
        bytes_written: u64,
    },
}

impl StreamOutcome {
    /// Bytes written to the sink, complete or not.
    #[must_use]
    pub fn bytes_written(self) -> u64 {
        match self {
            Self::Completed { bytes_written, .. } | Self::Stopped { bytes_written } => {
                bytes_written
            }
        }
    }
}

/// HTTP client shared by scanning and downloading.
///
/// This client is designed to be created once and reused, taking advantage of
/// connection pooling. Cloning is cheap.
///
/// # Example
///
/// ```no_run
/// use autoindex_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let html = client.fetch_text("http://mirror.example/pub/").await?;
/// println!("{} bytes of listing", html.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    page_timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 10 seconds
    /// - Read (idle) timeout: 30 seconds
    /// - Listing page timeout: 10 seconds
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeouts(ClientTimeouts::default())
    }

    /// Creates a new HTTP client with explicit timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails (e.g. the TLS backend cannot
    /// be initialized).
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(timeouts: ClientTimeouts) -> Self {
        Self::try_with_timeouts(timeouts).expect("failed to build HTTP client")
    }

    /// Fallible constructor for callers that want to report builder failures.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest::Error` if the client cannot be built.
    pub fn try_with_timeouts(timeouts: ClientTimeouts) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()?;
        debug!(?timeouts, "built HTTP client");
        Ok(Self {
            client,
            page_timeout: timeouts.page,
        })
    }

    /// Fetches a listing page and returns its body as text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the URL is invalid, the request fails or
    /// times out, or the server answers with a non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .timeout(self.page_timeout)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e))?;
        debug!(bytes = body.len(), "fetched listing page");
        Ok(body)
    }

    /// Streams a file body into `sink` in [`CHUNK_SIZE`] pieces.
    ///
    /// `on_chunk(bytes_in_this_chunk, total_size)` runs after every chunk
    /// write; `total_size` is the response `Content-Length`, or 0 when the
    /// server did not send one. Returning [`ControlFlow::Break`] stops the
    /// transfer after the chunk just written.
    ///
    /// Nothing is rolled back: an error or a stop leaves whatever was already
    /// written in the sink.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on an invalid URL, transport failure,
    /// non-2xx status, or a failed write to `sink`.
    #[instrument(skip(self, sink, on_chunk), fields(url = %url))]
    pub async fn stream_download<W, F>(
        &self,
        url: &str,
        sink: &mut W,
        mut on_chunk: F,
    ) -> Result<StreamOutcome, DownloadError>
    where
        W: AsyncWrite + Unpin,
        F: FnMut(u64, u64) -> ControlFlow<()>,
    {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let total_size = header_content_length(&response).unwrap_or(0);
        debug!(total_size, "streaming response body");

        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

            for piece in chunk.chunks(CHUNK_SIZE) {
                sink.write_all(piece)
                    .await
                    .map_err(|e| DownloadError::io(url, e))?;
                bytes_written += piece.len() as u64;

                if on_chunk(piece.len() as u64, total_size).is_break() {
                    sink.flush().await.map_err(|e| DownloadError::io(url, e))?;
                    debug!(bytes_written, "download stopped by caller");
                    return Ok(StreamOutcome::Stopped { bytes_written });
                }
            }
        }

        sink.flush().await.map_err(|e| DownloadError::io(url, e))?;
        trace!(bytes_written, "stream finished");

        Ok(StreamOutcome::Completed {
            bytes_written,
            total_size,
        })
    }

    /// Probes a file's size with a HEAD request.
    ///
    /// Any failure (transport, non-2xx, missing or malformed header) yields
    /// `None`; a size hint is never worth failing a scan over.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn content_length(&self, url: &str) -> Option<u64> {
        let response = match self
            .client
            .head(url)
            .timeout(self.page_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = response.status().as_u16(), "HEAD probe rejected");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "HEAD probe failed");
                return None;
            }
        };
        header_content_length(&response)
    }
}

fn header_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
