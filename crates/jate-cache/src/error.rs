use thiserror::Error;

/// Errors from the caching layer
///
/// A failed lookup plus a failed fetch surfaces to the caller as a failed
/// resource load - same semantics as an ordinary fetch going wrong. Cache
/// write-back failures never fail a response that was already fetched.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Invalid precache manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Cache storage lock poisoned")]
    LockPoisoned,
}
