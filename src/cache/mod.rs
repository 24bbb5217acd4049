//! Content-addressed artwork cache layout
//!
//! Each identifier maps to a single file named after its SHA-256 digest inside a
//! namespaced directory. Entries are never expired or verified; a file that exists
//! is a cached file.

mod resolver;

pub use resolver::{cache_key, CacheResolver, DEFAULT_EXTENSION, DEFAULT_NAMESPACE};
