//! Body types exchanged over the HTTP surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Metadata returned by `GET /file/{id}/stat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatRes {
    /// Store-reported creation time, ISO 8601
    pub create_datetime: String,
    /// Content length in bytes
    pub size: u64,
    /// Media type inferred from the stored extension
    pub mimetype: String,
    /// Stored filename: `{identifier}.{extension}`
    pub name: String,
}

/// Error body carried by every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}
