//! # API Shared
//!
//! Shared wire definitions for the droply APIs.
//!
//! Contains:
//! - Request/response body types (`wire` module)
//! - Shared services like `HealthService`
//!
//! Used by the REST server and the `file-client` CLI so both sides agree on
//! the body shapes without depending on the storage core.

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
