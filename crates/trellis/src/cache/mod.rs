//! Fragment caching.
//!
//! A class that declares cache dependencies (`cache_on`) has its rendered
//! output stored under a [`CacheKey`] built from the runtime namespace, the
//! environment version, the class name, the render target, the dependency
//! values and a digest of every template the render can reach.
//!
//! - [`key`]: key composition
//! - [`digest`]: transitive template digests
//! - [`store`]: the [`CacheStore`] trait and the in-memory store

pub mod digest;
pub mod key;
pub mod store;

use thiserror::Error;

pub use digest::class_digest;
pub use key::{cache_key, CacheKey};
pub use store::{CacheStats, CacheStore, MemoryStore};

/// Error raised by a cache store.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store '{store}' failed: {message}")]
    Backend { store: String, message: String },

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    pub fn backend(store: impl Into<String>, message: impl Into<String>) -> Self {
        CacheError::Backend {
            store: store.into(),
            message: message.into(),
        }
    }
}
