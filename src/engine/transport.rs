//! Outbound transport used on cache misses
//!
//! The engine only ever asks a transport to stream one URL into one open file.
//! `HttpTransport` is the reqwest implementation; tests inject their own.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::FetchError;

/// Issues a single GET and streams the body into `sink`
pub trait Transport: Send + Sync + 'static {
    /// Downloads `url` into `sink`, returning the number of bytes written.
    ///
    /// `path` is the file backing `sink`, used for error reporting.
    fn download<'a>(
        &'a self,
        url: &'a str,
        path: &'a Path,
        sink: &'a mut File,
    ) -> impl Future<Output = Result<u64, FetchError>> + Send + 'a;
}

/// reqwest-backed transport with a fixed client-side timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn download<'a>(
        &'a self,
        url: &'a str,
        path: &'a Path,
        sink: &'a mut File,
    ) -> Result<u64, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };
        let write_error = |source| FetchError::Write {
            path: PathBuf::from(path),
            source,
        };

        let mut response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(request_error)? {
            sink.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len() as u64;
        }
        sink.flush().await.map_err(write_error)?;

        Ok(written)
    }
}
