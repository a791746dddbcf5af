//! Client-side file intake for the vidflow uploader.
//!
//! Everything here is synchronous and side-effect free apart from reading
//! file metadata: a rejected file never reaches the network.

mod file;
mod preview;
mod progress;
mod validation;

pub use file::{ImageFile, SelectedFile, detect_mime_type};
pub use preview::{data_url, strip_data_url};
pub use progress::ProgressClamp;
pub use validation::{validate_thumbnail_file, validate_video_file};

/// Errors produced while accepting a file.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("file too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    /// True when the rejection is about the file type.
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::UnsupportedType(_))
    }

    /// True when the rejection is about the file size.
    pub fn is_size_error(&self) -> bool {
        matches!(self, Self::TooLarge { .. })
    }
}
