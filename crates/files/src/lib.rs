//! droply file storage core.
//!
//! This crate implements the storage-resolution and metadata layer of the
//! droply file service:
//!
//! - Every stored item is a single file named `{identifier}.{extension}`
//!   inside one flat content-store directory.
//! - The identifier is an opaque token minted at creation time and is the
//!   sole external handle to the content. It is never reused.
//! - The extension comes verbatim from the client-supplied filename and is
//!   part of the storage key itself, which is why resolution is a prefix
//!   scan (`{identifier}.*`) rather than an exact lookup.
//! - Content is immutable once written; there is no update operation.
//!
//! ## Resolution invariant
//!
//! For a given identifier at most one file may exist in the store. Zero
//! matches means the file does not exist; more than one match means the
//! store was tampered with outside the service (nothing the service itself
//! does can produce it) and surfaces as [`StoreError::Ambiguous`].
//!
//! ## Example Usage
//!
//! ```no_run
//! use droply_files::{FileStore, StoreConfig};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::new(Path::new("storage"))?;
//! let store = FileStore::new(config);
//!
//! let id = store.create("report.pdf", b"%PDF-1.7")?;
//! let meta = store.stat(&id)?;
//! assert_eq!(meta.mimetype, "application/pdf");
//! # Ok(())
//! # }
//! ```

mod config;
mod constants;
mod store;

pub use config::StoreConfig;
pub use constants::{DEFAULT_STORAGE_DIR, GENERIC_MIME_TYPE};
pub use store::{FileMeta, FileStore, ReadFile};

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Storage directory does not exist or is not a directory
    #[error("invalid storage directory: {0}")]
    InvalidStorageDir(String),

    /// Upload filename was empty or carried no extension
    #[error("invalid upload filename: {0}")]
    InvalidFilename(String),

    /// No stored file matches the identifier
    #[error("no file found for identifier {0}")]
    NotFound(String),

    /// More than one stored file matches the identifier (store corruption
    /// or out-of-band interference)
    #[error("{count} files found for identifier {id}")]
    Ambiguous { id: String, count: usize },

    /// The update operation is deliberately unsupported
    #[error("update is not implemented")]
    NotImplemented,

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
