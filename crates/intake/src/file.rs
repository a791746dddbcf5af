use std::path::{Path, PathBuf};

use vidflow_protocol::constants::MAX_THUMBNAIL_BYTES;

use crate::IntakeError;

const FALLBACK_MIME: &str = "application/octet-stream";

/// A video file chosen by the user, described by what the browser-side
/// picker would know about it: name, declared type and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let file_name = file_name_of(&path);
        Self {
            path,
            file_name,
            mime_type: mime_type.into(),
            size,
        }
    }

    /// Reads size from disk and infers the type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IntakeError> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        let mime_type = detect_mime_type(path).unwrap_or(FALLBACK_MIME);
        Ok(Self::new(path, mime_type, size))
    }
}

/// A custom thumbnail image, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Loads an image from disk. Files over `max_bytes` (default 2 MiB) are
    /// rejected from their metadata, before anything is read.
    pub fn from_path(path: impl AsRef<Path>, max_bytes: Option<u64>) -> Result<Self, IntakeError> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        let limit = max_bytes.unwrap_or(MAX_THUMBNAIL_BYTES);
        if size > limit {
            return Err(IntakeError::TooLarge { size, limit });
        }
        let data = std::fs::read(path)?;
        let mime_type = detect_mime_type(path).unwrap_or(FALLBACK_MIME);
        Ok(Self::new(file_name_of(path), mime_type, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Detects a MIME type from a file path extension.
pub fn detect_mime_type(path: impl AsRef<Path>) -> Option<&'static str> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("mp4" | "m4v") => Some("video/mp4"),
        Some("mov") => Some("video/quicktime"),
        Some("webm") => Some("video/webm"),
        Some("mkv") => Some("video/x-matroska"),
        Some("avi") => Some("video/x-msvideo"),
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        _ => None,
    }
}
