// SQLite-backed note persistence
// Every save is a new snapshot; the newest one wins on load

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{NoteSnapshot, NoteStore};

/// Result type alias because typing Result<T, StoreError> everywhere is tedious
pub type Result<T> = std::result::Result<T, StoreError>;
