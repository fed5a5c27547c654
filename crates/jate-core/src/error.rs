use thiserror::Error;

/// All the ways things can go wrong above the two storage layers
#[derive(Error, Debug)]
pub enum Error {
    #[error("Note store error: {0}")]
    Store(#[from] jate_store::StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] jate_cache::CacheError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
