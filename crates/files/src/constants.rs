//! Shared constants for the droply storage core.

/// Default content-store directory, relative to the working directory.
pub const DEFAULT_STORAGE_DIR: &str = "storage";

/// Media type reported when the extension maps to nothing recognised.
pub const GENERIC_MIME_TYPE: &str = "application/octet-stream";
