//! Store configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! the store. The intent is to avoid reading process-wide environment
//! variables during request handling, which can lead to inconsistent
//! behaviour in multi-threaded runtimes and test harnesses. The binaries
//! own the environment lookup; this type owns validation.

use crate::{StoreError, StoreResult};
use std::path::{Path, PathBuf};

/// Content-store location, validated at startup.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    storage_dir: PathBuf,
}

impl StoreConfig {
    /// Create a new `StoreConfig` for an existing content-store directory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidStorageDir` if:
    /// - the directory does not exist,
    /// - the path exists but is not a directory, or
    /// - the path cannot be canonicalised.
    pub fn new(storage_dir: &Path) -> StoreResult<Self> {
        if !storage_dir.exists() {
            return Err(StoreError::InvalidStorageDir(format!(
                "directory does not exist: {}",
                storage_dir.display()
            )));
        }

        if !storage_dir.is_dir() {
            return Err(StoreError::InvalidStorageDir(format!(
                "path is not a directory: {}",
                storage_dir.display()
            )));
        }

        let storage_dir = storage_dir.canonicalize().map_err(|e| {
            StoreError::InvalidStorageDir(format!(
                "cannot canonicalize path {}: {}",
                storage_dir.display(),
                e
            ))
        })?;

        Ok(Self { storage_dir })
    }

    /// Directory holding one file per stored item.
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}
