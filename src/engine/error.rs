//! Errors raised while resolving a batch of identifiers

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching artwork into the cache
#[derive(Debug, Error)]
pub enum FetchError {
    /// The cache directory could not be created
    #[error("failed to create cache directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cache file could not be created or opened
    #[error("failed to create or open file for downloaded artwork {}: {source}", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The request failed before or while the body was received
    #[error("failed to request artwork {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("failed to request artwork {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    /// Writing the body to the cache file failed
    #[error("failed to download artwork to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The batch was cancelled before it finished
    #[error("batch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Local filesystem failures; no entry can be cached when these happen
    pub fn is_local(&self) -> bool {
        matches!(self, FetchError::CreateDir { .. } | FetchError::CreateFile { .. })
    }
}
