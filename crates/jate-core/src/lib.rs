// Ties the two halves together - the note tiers and the cache policy

pub mod config;
pub mod document;
pub mod error;
pub mod policy;

pub use config::{Config, PolicyConfig, StorageConfig};
pub use document::{DocumentStore, DEFAULT_NOTE};
pub use error::Error;
pub use policy::{build_router, install};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
