//! Backends that open [`MemoryBook`] handles.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tally_shared::types::Commodity;
use tracing::{debug, info};

use super::memory::BookSink;
use super::{MemoryBook, StoreBackend, StoreError};

/// A book shared in-process.
///
/// Each session works on its own copy; `save` writes the copy back.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    id: String,
    book: Arc<Mutex<MemoryBook>>,
}

impl MemoryBackend {
    /// Wraps `book` under the identity `id`.
    #[must_use]
    pub fn new(id: impl Into<String>, book: MemoryBook) -> Self {
        Self {
            id: id.into(),
            book: Arc::new(Mutex::new(book)),
        }
    }

    /// A copy of the book as last saved.
    #[must_use]
    pub fn snapshot(&self) -> MemoryBook {
        self.book.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl StoreBackend for MemoryBackend {
    type Store = MemoryBook;

    fn store_id(&self) -> String {
        format!("memory:{}", self.id)
    }

    fn open(&self, is_new: bool) -> Result<MemoryBook, StoreError> {
        let book = {
            let guard = self.book.lock().unwrap_or_else(PoisonError::into_inner);
            if is_new {
                MemoryBook::new(guard.currency().clone())
            } else {
                guard.validate()?;
                guard.clone()
            }
        };
        debug!(store = %self.id, is_new, "Opened in-memory book");
        Ok(book.attach(BookSink::Shared(Arc::clone(&self.book))))
    }
}

/// A book persisted as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
    id: String,
    currency: Commodity,
}

impl JsonFileBackend {
    /// Book at `path`; new books are denominated in `currency`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, currency: Commodity) -> Self {
        let path = path.into();
        let id = format!("file:{}", lock_path(&path).display());
        Self { path, id, currency }
    }

    /// Path of the book file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreBackend for JsonFileBackend {
    type Store = MemoryBook;

    fn store_id(&self) -> String {
        self.id.clone()
    }

    fn open(&self, is_new: bool) -> Result<MemoryBook, StoreError> {
        let book = if is_new {
            info!(path = %self.path.display(), currency = %self.currency, "Creating new book");
            MemoryBook::new(self.currency.clone())
        } else {
            let json = std::fs::read_to_string(&self.path)?;
            let book: MemoryBook = serde_json::from_str(&json)?;
            book.validate()?;
            debug!(path = %self.path.display(), "Loaded book from file");
            book
        };
        Ok(book.attach(BookSink::File(self.path.clone())))
    }
}

/// Resolves the directory rather than the file, so the identity is the same
/// before and after the book is first written.
fn lock_path(path: &Path) -> PathBuf {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    match (std::fs::canonicalize(dir), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}
