// Offline asset caching layer
// Classifies requests, serves cache-first with expiry, keeps partitions apart

pub mod error;
pub mod fetch;
pub mod request;
pub mod router;
pub mod storage;
pub mod strategy;

pub use error::CacheError;
pub use fetch::{Fetcher, HttpFetcher};
pub use request::{Destination, Request, RequestMode, Response};
pub use router::{parse_manifest, PrecacheEntry, Router};
pub use storage::CacheStorage;
pub use strategy::CacheFirst;

/// Result type alias because typing Result<T, CacheError> everywhere is tedious
pub type Result<T> = std::result::Result<T, CacheError>;
