//! Wire protocol types for the vidflow video ingestion API.
//!
//! Shared by the HTTP client and the ingestion core so both sides agree
//! on field names, status strings and limits.

pub mod constants;
pub mod messages;
pub mod types;

pub use constants::playback_url;
pub use messages::{
    PublishRequest, SaveThumbnailRequest, StatusResponse, ThumbnailPreviewRequest,
    UploadResponse, extract_server_message,
};
pub use types::{PipelineStatus, PrivacyStatus, ProgressCallback, UploadProgress};

/// Errors produced while interpreting protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown pipeline status: {0}")]
    UnknownStatus(String),

    #[error("unknown privacy status: {0}")]
    UnknownPrivacy(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
