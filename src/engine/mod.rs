//! Bounded download engine
//!
//! `Engine::fetch_all` resolves an ordered list of identifiers to local cache
//! files. Work runs on one tokio task per identifier, but a semaphore keeps at most
//! `limit` of them doing filesystem or network I/O at once. Every task reports back
//! to the collector with its input index, so the returned slots line up with the
//! input no matter which downloads finish first.
//!
//! A file that already exists at the resolved path is a cache hit and costs no
//! request. On a miss the file is created exclusively and the body is streamed into
//! it; if the download fails or is cancelled the partial file is removed.
//!
//! Failures are handled according to [`FailurePolicy`]. Local filesystem errors
//! (the cache directory or file cannot be created) abort the batch under either
//! policy, since nothing can be cached without a writable cache root.

mod error;
mod transport;
mod types;

pub use error::FetchError;
pub use transport::{HttpTransport, Transport};
pub use types::{EngineConfig, FailurePolicy, Slot, DEFAULT_TIMEOUT};

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{self, OpenOptions};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::CacheResolver;
use types::Fetched;

/// Resolves batches of identifiers into cached files
#[derive(Debug)]
pub struct Engine<T = HttpTransport> {
    resolver: CacheResolver,
    transport: Arc<T>,
    config: EngineConfig,
}

impl Engine<HttpTransport> {
    /// Creates an engine that downloads over HTTP with `config.timeout` per request
    pub fn new(resolver: CacheResolver, config: EngineConfig) -> Result<Self, FetchError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(resolver, transport, config))
    }
}

impl<T: Transport> Engine<T> {
    /// Creates an engine with a caller-supplied transport
    pub fn with_transport(resolver: CacheResolver, transport: T, config: EngineConfig) -> Self {
        Self {
            resolver,
            transport: Arc::new(transport),
            config,
        }
    }

    /// The resolver used to place cache entries
    pub fn resolver(&self) -> &CacheResolver {
        &self.resolver
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetches every identifier, running at most `limit` at once.
    ///
    /// Returns one slot per identifier, in input order. A `limit` of zero is
    /// treated as one.
    ///
    /// # Errors
    /// * `FetchError::Cancelled` if `cancel` fires before the batch completes
    /// * The first fatal item error, after the remaining work has been stopped
    pub async fn fetch_all(
        &self,
        cancel: &CancellationToken,
        limit: usize,
        identifiers: &[String],
    ) -> Result<Vec<Slot>, FetchError> {
        let mut slots = vec![Slot::Unavailable; identifiers.len()];
        if identifiers.is_empty() {
            return Ok(slots);
        }

        // Cancelling the batch must not cancel the caller
        let batch = cancel.child_token();
        let permits = Arc::new(Semaphore::new(limit.max(1)));
        let mut workers = JoinSet::new();

        for (index, identifier) in identifiers.iter().enumerate() {
            let transport = Arc::clone(&self.transport);
            let permits = Arc::clone(&permits);
            let token = batch.clone();
            let url = identifier.clone();
            let path = self.resolver.resolve(identifier);

            workers.spawn(async move {
                let outcome = fetch_one(transport.as_ref(), &permits, &token, &url, &path).await;
                (index, url, path, outcome)
            });
        }

        let mut failure: Option<FetchError> = None;
        let mut failed_paths: HashSet<PathBuf> = HashSet::new();
        let (mut hits, mut misses, mut isolated) = (0usize, 0usize, 0usize);

        while let Some(joined) = workers.join_next().await {
            let (index, url, path, outcome) = match joined {
                Ok(done) => done,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(_) => continue,
            };

            match outcome {
                Ok(fetched) => {
                    match fetched {
                        Fetched::Hit => hits += 1,
                        Fetched::Miss { bytes } => {
                            debug!(url = %url, bytes, "downloaded");
                            misses += 1;
                        }
                    }
                    slots[index] = Slot::Cached(path);
                }
                // Draining after an abort; the first error is the one reported
                Err(_) if failure.is_some() => {}
                Err(err) if self.is_fatal(&err) => {
                    if !matches!(err, FetchError::Cancelled) {
                        warn!(url = %url, error = %err, "aborting batch");
                    }
                    batch.cancel();
                    failure = Some(err);
                }
                Err(err) => {
                    warn!(url = %url, error = %err, "artwork unavailable");
                    failed_paths.insert(path);
                    isolated += 1;
                }
            }
        }

        if let Some(err) = failure {
            debug!(error = %err, hits, misses, "batch failed");
            return Err(err);
        }

        // A duplicate may have taken the hit path while its twin's download was
        // still running; if that download failed, the entry is gone.
        for slot in slots.iter_mut() {
            let Slot::Cached(path) = slot else { continue };
            if failed_paths.contains(path.as_path())
                && !fs::try_exists(path.as_path()).await.unwrap_or(false)
            {
                debug!(path = %path.display(), "cache entry removed by failed duplicate");
                *slot = Slot::Unavailable;
            }
        }

        info!(
            total = identifiers.len(),
            hits, misses, isolated, "batch complete"
        );
        Ok(slots)
    }

    fn is_fatal(&self, err: &FetchError) -> bool {
        matches!(err, FetchError::Cancelled)
            || err.is_local()
            || self.config.policy == FailurePolicy::AbortBatch
    }
}

/// Resolves a single identifier while holding a permit
async fn fetch_one<T: Transport>(
    transport: &T,
    permits: &Semaphore,
    cancel: &CancellationToken,
    url: &str,
    path: &Path,
) -> Result<Fetched, FetchError> {
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
        permit = permits.acquire() => permit.map_err(|_| FetchError::Cancelled)?,
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .await
            .map_err(|source| FetchError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
    }

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            debug!(path = %path.display(), "file is cached");
            return Ok(Fetched::Hit);
        }
        Err(source) => {
            return Err(FetchError::CreateFile {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    debug!(url = %url, path = %path.display(), "downloading");
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = transport.download(url, path, &mut file) => result,
    };
    drop(file);

    match result {
        Ok(bytes) => Ok(Fetched::Miss { bytes }),
        Err(err) => {
            discard_partial(path).await;
            Err(err)
        }
    }
}

/// Removes a file left behind by a failed download so it is not taken as cached
async fn discard_partial(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        if err.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "failed to remove partial download");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs::File;

    /// Transport that must never be reached
    struct Unreachable;

    impl Transport for Unreachable {
        async fn download<'a>(
            &'a self,
            url: &'a str,
            _path: &'a Path,
            _sink: &'a mut File,
        ) -> Result<u64, FetchError> {
            panic!("unexpected download of {}", url);
        }
    }

    /// Transport that always answers with a 404
    struct NotFound;

    impl Transport for NotFound {
        async fn download<'a>(
            &'a self,
            url: &'a str,
            _path: &'a Path,
            _sink: &'a mut File,
        ) -> Result<u64, FetchError> {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_one_existing_file_is_hit() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("ns").join("entry.png");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"cached").unwrap();

        let permits = Semaphore::new(1);
        let token = CancellationToken::new();
        let fetched = fetch_one(&Unreachable, &permits, &token, "https://a", &path)
            .await
            .expect("Cache hit should succeed");

        assert_eq!(fetched, Fetched::Hit);
        assert_eq!(std::fs::read(&path).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn test_fetch_one_failure_removes_partial_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("ns").join("entry.png");

        let permits = Semaphore::new(1);
        let token = CancellationToken::new();
        let result = fetch_one(&NotFound, &permits, &token, "https://a", &path).await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        assert!(!path.exists(), "Failed download must not leave a cache entry");
        assert!(path.parent().unwrap().exists(), "Cache directory should be created");
    }

    #[tokio::test]
    async fn test_fetch_one_cancelled_before_permit() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("entry.png");

        let permits = Semaphore::new(0);
        let token = CancellationToken::new();
        token.cancel();
        let result = fetch_one(&Unreachable, &permits, &token, "https://a", &path).await;

        assert!(matches!(result, Err(FetchError::Cancelled)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_fetch_all_does_not_cancel_caller_token() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let engine = Engine::with_transport(
            CacheResolver::new(temp_dir.path()),
            NotFound,
            EngineConfig::default(),
        );
        let token = CancellationToken::new();

        let result = engine
            .fetch_all(&token, 2, &["https://a".to_string()])
            .await;

        assert!(matches!(result, Err(FetchError::Status { .. })));
        assert!(!token.is_cancelled());
    }
}
