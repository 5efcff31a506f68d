//! Content-store service implementation.
//!
//! This module implements the three layers the droply service is built on:
//!
//! - **Identifier resolution**: mapping an opaque identifier to the single
//!   stored file named `{identifier}.{extension}` via a prefix scan of the
//!   store directory.
//! - **Metadata extraction**: deriving name, media type, byte size and
//!   creation timestamp from a resolved file.
//! - **File service**: the create / read / stat / delete operations built
//!   on top of the two, plus the deliberately unsupported update.
//!
//! # Storage Layout
//!
//! The store is a single flat directory:
//!
//! ```text
//! storage/
//! ├── 550e8400e29b41d4a716446655440000.pdf
//! └── 9b2d3c1a0f4e48d2a0c0b8f1d2e3a4b5.txt
//! ```
//!
//! # Concurrency
//!
//! Resolution followed by a read, stat or delete is inherently a
//! check-then-act sequence against shared filesystem state. The store holds
//! one internal mutex across every resolve-and-act so the two steps observe
//! the same state within this process. Creates mint a fresh identifier, so
//! they can never conflict with each other.
//!
//! # Implementation Notes
//!
//! - All I/O is synchronous and buffered; files are read and written whole.
//! - The directory scan stays the source of truth so that files planted
//!   next to the service (same identifier, different extension) are
//!   detected as an ambiguous store rather than silently picked from.

use crate::{StoreConfig, StoreError, StoreResult, GENERIC_MIME_TYPE};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Metadata derived from a stored file.
///
/// Nothing here is persisted separately; every field is recomputed from the
/// filesystem entry at the time of the call.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FileMeta {
    /// Final path segment: `{identifier}.{extension}`
    pub name: String,

    /// Media type looked up from the extension; falls back to
    /// `application/octet-stream` when the extension is unrecognised
    pub mimetype: String,

    /// Exact byte length of the content
    pub size: u64,

    /// Store-reported creation time, rendered RFC 3339 / ISO 8601 (UTC)
    pub create_datetime: String,
}

/// A stored file's content together with its resolved name and media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFile {
    /// Final path segment: `{identifier}.{extension}`
    pub name: String,

    /// Media type looked up from the extension
    pub mimetype: String,

    /// Raw bytes exactly as uploaded
    pub content: Vec<u8>,
}

/// Service for managing files within one content store
///
/// # Design
///
/// - Store-scoped: each instance is bound to one validated directory
/// - Immutable content: files are never modified after creation
/// - Atomic resolve-and-act: an internal lock closes the race between the
///   existence scan and the following read or removal
#[derive(Debug)]
pub struct FileStore {
    config: StoreConfig,

    /// Serialises resolve-and-act sequences within this process.
    gate: Mutex<()>,
}

impl FileStore {
    /// Creates a new `FileStore` over a validated configuration.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            gate: Mutex::new(()),
        }
    }

    /// Stores uploaded content and returns the freshly minted identifier.
    ///
    /// The extension is taken verbatim from the text after the last `.` of
    /// `uploaded_filename` and becomes part of the storage key. No
    /// existence check is needed: the identifier is a fresh v4 UUID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidFilename` if the filename is empty or
    /// carries no extension; in that case nothing is written. I/O failures
    /// surface as `StoreError::Io`.
    pub fn create(&self, uploaded_filename: &str, content: &[u8]) -> StoreResult<String> {
        let extension = split_extension(uploaded_filename).ok_or_else(|| {
            StoreError::InvalidFilename(format!(
                "filename must be non-empty and carry an extension, got: '{}'",
                uploaded_filename
            ))
        })?;

        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        let id = Uuid::new_v4().simple().to_string();
        let stored_name = format!("{}.{}", id, extension);
        fs::write(self.config.storage_dir().join(&stored_name), content)?;

        tracing::info!(%id, name = %stored_name, size = content.len(), "file created");
        Ok(id)
    }

    /// Returns the file's raw bytes plus its resolved name and media type.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if nothing matches the identifier;
    /// `StoreError::Ambiguous` if more than one file does.
    pub fn read(&self, id: &str) -> StoreResult<ReadFile> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        let path = self.resolve_unlocked(id)?;
        let content = fs::read(&path)?;

        Ok(ReadFile {
            name: file_name_of(&path),
            mimetype: mime_for(&path),
            content,
        })
    }

    /// Returns derived metadata for the stored file.
    ///
    /// # Errors
    ///
    /// Same resolution failures as [`FileStore::read`].
    pub fn stat(&self, id: &str) -> StoreResult<FileMeta> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        let path = self.resolve_unlocked(id)?;
        extract_meta(&path)
    }

    /// Removes every file matching `{id}.*` and returns the identifier.
    ///
    /// Deletion is destructive cleanup, so the otherwise-impossible
    /// ambiguous case is handled by clearing all matches rather than
    /// erroring.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if no file currently matches.
    pub fn delete(&self, id: &str) -> StoreResult<String> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        let matches = self.matches_unlocked(id)?;
        if matches.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        if matches.len() > 1 {
            tracing::warn!(%id, count = matches.len(), "clearing ambiguous matches on delete");
        }

        for path in &matches {
            fs::remove_file(path)?;
        }

        tracing::info!(%id, "file deleted");
        Ok(id.to_string())
    }

    /// Always fails: stored content is immutable and no update operation
    /// exists. Present only to shape the external contract.
    ///
    /// # Errors
    ///
    /// Always returns `StoreError::NotImplemented`; no state is read or
    /// touched.
    pub fn update(&self, _id: &str) -> StoreResult<()> {
        Err(StoreError::NotImplemented)
    }

    /// Maps an identifier to the unique stored file path.
    ///
    /// Read-only directory scan. The identifier may be any string; the only
    /// check is the prefix match against stored names.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` on zero matches, `StoreError::Ambiguous` on
    /// more than one.
    pub fn resolve(&self, id: &str) -> StoreResult<PathBuf> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.resolve_unlocked(id)
    }

    fn resolve_unlocked(&self, id: &str) -> StoreResult<PathBuf> {
        let mut matches = self.matches_unlocked(id)?;
        match matches.len() {
            0 => Err(StoreError::NotFound(id.to_string())),
            1 => Ok(matches.remove(0)),
            count => {
                tracing::error!(%id, count, "multiple files share one identifier");
                Err(StoreError::Ambiguous {
                    id: id.to_string(),
                    count,
                })
            }
        }
    }

    /// All store entries named `{id}.*`, in directory order.
    fn matches_unlocked(&self, id: &str) -> StoreResult<Vec<PathBuf>> {
        let prefix = format!("{}.", id);
        let mut matches = Vec::new();

        for entry in fs::read_dir(self.config.storage_dir())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                matches.push(entry.path());
            }
        }

        Ok(matches)
    }
}

/// Derives name, media type, size and creation timestamp for a stored file.
fn extract_meta(path: &Path) -> StoreResult<FileMeta> {
    let metadata = fs::metadata(path)?;

    // Not every filesystem records a birth time; fall back to mtime, which
    // for immutable content is the write that created the file.
    let created = metadata.created().or_else(|_| metadata.modified())?;
    let create_datetime =
        DateTime::<Utc>::from(created).to_rfc3339_opts(SecondsFormat::Micros, true);

    Ok(FileMeta {
        name: file_name_of(path),
        mimetype: mime_for(path),
        size: metadata.len(),
        create_datetime,
    })
}

/// Media type from the file's extension; never fails.
fn mime_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(GENERIC_MIME_TYPE)
        .to_string()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Text after the last `.`, or `None` when the filename is unusable.
fn split_extension(filename: &str) -> Option<&str> {
    let (_, extension) = filename.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    Some(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_store(temp: &TempDir) -> FileStore {
        FileStore::new(StoreConfig::new(temp.path()).unwrap())
    }

    /// Plants a file directly in the store, bypassing the service.
    fn plant(temp: &TempDir, name: &str, content: &[u8]) {
        fs::write(temp.path().join(name), content).unwrap();
    }

    #[test]
    fn test_create_then_read_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        let content = b"%PDF-1.7 fake report";
        let id = store.create("report.pdf", content).unwrap();

        let file = store.read(&id).unwrap();
        assert_eq!(file.content, content);
        assert_eq!(file.name, format!("{}.pdf", id));
        assert_eq!(file.mimetype, "application/pdf");
    }

    #[test]
    fn test_stat_consistent_with_upload() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        let content = b"hello world";
        let id = store.create("notes.txt", content).unwrap();

        let meta = store.stat(&id).unwrap();
        assert_eq!(meta.size, content.len() as u64);
        assert_eq!(meta.mimetype, "text/plain");
        assert_eq!(meta.name, format!("{}.txt", id));

        // Timestamp must be machine-parseable ISO 8601.
        DateTime::parse_from_rfc3339(&meta.create_datetime).unwrap();
    }

    #[test]
    fn test_create_preserves_last_extension_only() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        let id = store.create("archive.tar.gz", b"gz bytes").unwrap();
        let meta = store.stat(&id).unwrap();
        assert_eq!(meta.name, format!("{}.gz", id));
    }

    #[test]
    fn test_create_rejects_filename_without_extension() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        for bad in ["", "README", "file."] {
            let result = store.create(bad, b"data");
            assert!(
                matches!(result, Err(StoreError::InvalidFilename(_))),
                "expected rejection for {:?}",
                bad
            );
        }

        // Nothing may have been written.
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_identifiers_are_unique() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        let first = store.create("a.txt", b"one").unwrap();
        let second = store.create("a.txt", b"two").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_delete_is_final() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        let id = store.create("gone.txt", b"soon").unwrap();
        assert_eq!(store.delete(&id).unwrap(), id);

        assert!(matches!(store.read(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.stat(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        let result = store.delete("no-such-id");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_resolve_detects_ambiguous_store() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        plant(&temp, "dupe.txt", b"one");
        plant(&temp, "dupe.pdf", b"two");

        let result = store.stat("dupe");
        assert!(matches!(
            result,
            Err(StoreError::Ambiguous { count: 2, .. })
        ));
    }

    #[test]
    fn test_delete_clears_ambiguous_matches() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        plant(&temp, "dupe.txt", b"one");
        plant(&temp, "dupe.pdf", b"two");

        assert_eq!(store.delete("dupe").unwrap(), "dupe");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_resolve_requires_full_identifier() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        plant(&temp, "abcd.txt", b"data");

        // A shorter identifier must not match by prefix alone.
        assert!(matches!(store.resolve("abc"), Err(StoreError::NotFound(_))));
        assert!(store.resolve("abcd").is_ok());
    }

    #[test]
    fn test_unknown_extension_maps_to_octet_stream() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        let id = store.create("blob.zz9q", b"\x00\x01\x02").unwrap();
        let meta = store.stat(&id).unwrap();
        assert_eq!(meta.mimetype, GENERIC_MIME_TYPE);
    }

    #[test]
    fn test_update_never_touches_state() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        let id = store.create("keep.txt", b"original").unwrap();

        assert!(matches!(
            store.update(&id),
            Err(StoreError::NotImplemented)
        ));
        assert!(matches!(
            store.update("does-not-exist"),
            Err(StoreError::NotImplemented)
        ));

        // Content untouched either way.
        assert_eq!(store.read(&id).unwrap().content, b"original");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        assert!(matches!(
            store.read("missing"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_content_round_trips() {
        let temp = TempDir::new().unwrap();
        let store = new_store(&temp);

        let id = store.create("empty.bin", b"").unwrap();
        assert_eq!(store.read(&id).unwrap().content, Vec::<u8>::new());
        assert_eq!(store.stat(&id).unwrap().size, 0);
    }

    #[test]
    fn test_file_meta_serialization() {
        let meta = FileMeta {
            name: "550e8400e29b41d4a716446655440000.txt".into(),
            mimetype: "text/plain".into(),
            size: 1024,
            create_datetime: "2024-01-01T00:00:00.000000Z".into(),
        };

        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("text/plain"));

        let back: FileMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
