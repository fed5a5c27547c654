use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

use jate_store::NoteStore;
use tracing::warn;

/// What a brand new editor shows before anyone has typed anything
pub const DEFAULT_NOTE: &str = "// Welcome to JATE - Just Another Text Editor\n\
// Your note is saved automatically whenever the editor loses focus,\n\
// and it will still be here next time, even offline.\n";

/// Two-tier note storage behind one `latest`/`append` pair
///
/// The fast tier is an in-memory scratch copy, written on every append. The
/// durable tier is the SQLite note store, opened lazily on first use; if it
/// can't be opened (restricted profile, locked file) that outcome is
/// memoized and the session runs scratch-only. Reads resolve durable first,
/// then scratch, then the built-in default - the user never sees a storage
/// error, just the best content we still have.
pub struct DocumentStore {
    db_path: PathBuf,
    default_content: String,
    scratch: Mutex<Option<String>>,
    durable: OnceLock<Option<NoteStore>>,
}

impl DocumentStore {
    pub fn new(db_path: impl Into<PathBuf>, default_content: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            default_content: default_content.into(),
            scratch: Mutex::new(None),
            durable: OnceLock::new(),
        }
    }

    /// The durable tier, opened at most once per session
    fn durable(&self) -> Option<&NoteStore> {
        self.durable
            .get_or_init(|| match NoteStore::open(&self.db_path) {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!("persistent storage unavailable, running scratch-only: {}", e);
                    None
                }
            })
            .as_ref()
    }

    /// Whether appends are actually reaching disk this session
    pub fn is_durable(&self) -> bool {
        self.durable().is_some()
    }

    /// Best available content: latest durable snapshot, else the scratch
    /// copy, else the default note.
    pub fn latest(&self) -> String {
        if let Some(store) = self.durable() {
            let content = store.latest();
            if !content.is_empty() {
                return content;
            }
        }

        let scratch = self
            .scratch
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match scratch.as_ref() {
            Some(content) => content.clone(),
            None => self.default_content.clone(),
        }
    }

    /// Record a save. Scratch always gets the content; the durable tier gets
    /// it best-effort (a failed disk write is logged inside the store and
    /// the session carries on from scratch).
    pub fn append(&self, content: &str) {
        let mut scratch = self
            .scratch
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *scratch = Some(content.to_string());
        drop(scratch);

        if let Some(store) = self.durable() {
            store.append(content);
        }
    }
}
