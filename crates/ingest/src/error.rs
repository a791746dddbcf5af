//! Ingest error types.

use vidflow_intake::IntakeError;
use vidflow_protocol::PipelineStatus;

/// Failure reported by a [`VideoApi`](crate::VideoApi) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned {status}")]
    Status { status: u16, message: Option<String> },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request timed out")]
    Timeout,
}

impl ApiError {
    /// Human-readable message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(m), ..
            } => Some(m),
            _ => None,
        }
    }
}

/// Client-side guard failures. None of these reach the network.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid video file: {0}")]
    InvalidFile(IntakeError),

    #[error("invalid thumbnail: {0}")]
    InvalidThumbnail(IntakeError),

    #[error("no file selected")]
    NoFileSelected,

    #[error("an upload is already in progress")]
    UploadInProgress,

    #[error("the video has not been uploaded")]
    NotUploaded,

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("no thumbnail selected")]
    NoThumbnailSelected,

    #[error("the selected thumbnail has not been saved")]
    ThumbnailNotSaved,

    #[error("video is not ready (status: {})", status_label(.status))]
    NotReady { status: Option<PipelineStatus> },

    #[error("video processing failed; upload it again")]
    PipelineFailed,
}

fn status_label(status: &Option<PipelineStatus>) -> &'static str {
    status.map_or("none", PipelineStatus::as_str)
}

/// Errors returned by ingest operations.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}
