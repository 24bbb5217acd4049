//! Result slots and engine configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome for one identifier, stored at the identifier's input index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Slot {
    /// The artifact is on disk at this path
    Cached(PathBuf),
    /// The artifact could not be resolved
    #[default]
    Unavailable,
}

impl Slot {
    /// Path of the cached artifact, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Slot::Cached(path) => Some(path),
            Slot::Unavailable => None,
        }
    }

    /// Whether this slot holds a cached artifact
    pub fn is_cached(&self) -> bool {
        matches!(self, Slot::Cached(_))
    }
}

/// What the engine does when a single item fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any failure cancels the batch and the whole batch reports an error
    #[default]
    AbortBatch,
    /// Network and write failures leave the item `Unavailable`; the batch continues.
    /// Local filesystem failures still abort the batch.
    IsolateItem,
}

/// Configuration for the download engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Client-side timeout for each request, body included
    pub timeout: Duration,
    /// Per-item failure handling
    pub policy: FailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            policy: FailurePolicy::AbortBatch,
        }
    }
}

/// How a successful unit of work was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fetched {
    /// Already on disk, no request made
    Hit,
    /// Downloaded this run
    Miss { bytes: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_default_is_unavailable() {
        let slot = Slot::default();
        assert_eq!(slot, Slot::Unavailable);
        assert!(slot.path().is_none());
        assert!(!slot.is_cached());
    }

    #[test]
    fn test_cached_slot_exposes_path() {
        let slot = Slot::Cached(PathBuf::from("/tmp/a.png"));
        assert!(slot.is_cached());
        assert_eq!(slot.path(), Some(Path::new("/tmp/a.png")));
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.policy, FailurePolicy::AbortBatch);
    }
}
