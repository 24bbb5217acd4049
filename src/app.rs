//! Script filter run: search, cache artwork, build feedback
//!
//! Wires the search client and the download engine together for one invocation.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::RunConfig;
use crate::engine::{Engine, FetchError, Slot, Transport};
use crate::feedback::Feedback;
use crate::search::{AppResult, SearchClient, SearchError};

/// Errors that end a run without output
#[derive(Debug, Error)]
pub enum AppError {
    /// The store search failed
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Artwork could not be cached
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The run was interrupted before the search finished
    #[error("interrupted")]
    Cancelled,
}

/// Runs one search and returns the feedback document to print
pub async fn run(config: &RunConfig, cancel: &CancellationToken) -> Result<Feedback, AppError> {
    let client = SearchClient::new(config.engine.timeout)?.with_limit(config.limit);
    let engine = Engine::new(config.resolver.clone(), config.engine.clone())?;

    let results = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(AppError::Cancelled),
        results = client.search(&config.term) => results?,
    };

    let feedback = artwork_feedback(&engine, cancel, config.concurrency, &results).await?;
    Ok(feedback)
}

/// Caches the artwork of every result and pairs each result with its icon
pub async fn artwork_feedback<T: Transport>(
    engine: &Engine<T>,
    cancel: &CancellationToken,
    concurrency: usize,
    results: &[AppResult],
) -> Result<Feedback, FetchError> {
    // Results without artwork keep the error icon and never reach the engine
    let (indices, urls): (Vec<usize>, Vec<String>) = results
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.artwork_url.trim().is_empty())
        .map(|(i, r)| (i, r.artwork_url.clone()))
        .unzip();
    debug!(
        count = urls.len(),
        missing = results.len() - urls.len(),
        concurrency,
        "caching artwork"
    );

    let fetched = engine.fetch_all(cancel, concurrency, &urls).await?;
    let mut slots = vec![Slot::Unavailable; results.len()];
    for (index, slot) in indices.into_iter().zip(fetched) {
        slots[index] = slot;
    }
    Ok(Feedback::from_results(results, &slots))
}
