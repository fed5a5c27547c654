use thiserror::Error;

/// Errors from the durable note store
///
/// Only `open` surfaces these to callers; `append` and `latest` contain
/// their failures at the store boundary so an editing session never dies
/// because the disk said no.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store connection lock poisoned")]
    LockPoisoned,
}
