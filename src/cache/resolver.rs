//! Maps identifiers to stable on-disk cache paths
//!
//! A `CacheResolver` is pure: it never touches the filesystem. The engine uses it
//! to decide where an identifier's artifact lives, and the presence of that file
//! is what makes it a cache hit.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Namespace directory keeping our entries apart from other temp-dir tenants
pub const DEFAULT_NAMESPACE: &str = "net.nkcmr.alfred-apple-app-search";

/// File extension given to cached artwork
pub const DEFAULT_EXTENSION: &str = "png";

/// Returns the hex-encoded SHA-256 digest of an identifier
pub fn cache_key(identifier: &str) -> String {
    let digest = Sha256::digest(identifier.as_bytes());
    format!("{:x}", digest)
}

/// Resolves identifiers to `root/namespace/<cache key>.<extension>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResolver {
    /// Directory the namespace lives under
    root: PathBuf,
    /// Subdirectory owned by this tool
    namespace: String,
    /// Extension appended to every cache key
    extension: String,
}

impl CacheResolver {
    /// Creates a resolver rooted at `root` with the default namespace and extension
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Creates a resolver rooted at the system temp directory
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Replaces the namespace directory
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Replaces the file extension. An empty extension produces bare keys.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Root directory the namespace is created in
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every cache entry
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.namespace)
    }

    /// Returns the cache path for an identifier
    pub fn resolve(&self, identifier: &str) -> PathBuf {
        let key = cache_key(identifier);
        let file_name = if self.extension.is_empty() {
            key
        } else {
            format!("{}.{}", key, self.extension)
        };
        self.dir().join(file_name)
    }
}
