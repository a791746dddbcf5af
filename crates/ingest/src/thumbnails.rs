//! Thumbnail negotiation: server candidates, custom uploads and saving.
//!
//! The negotiator holds no session state. It fetches and validates, and
//! the orchestrator records the outcome.

use std::sync::Arc;

use tracing::{debug, info};
use vidflow_intake::{ImageFile, data_url, strip_data_url, validate_thumbnail_file};

use crate::api::VideoApi;
use crate::error::{ApiError, IngestError, ValidationError};

/// Ordered thumbnail candidates extracted by the server for one upload.
///
/// A set is never extended; fetching again produces a new set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailCandidateSet {
    guid: String,
    candidates: Vec<String>,
}

impl ThumbnailCandidateSet {
    pub fn new(guid: impl Into<String>, candidates: Vec<String>) -> Self {
        Self {
            guid: guid.into(),
            candidates,
        }
    }

    /// Upload the candidates belong to.
    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.candidates.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(String::as_str)
    }

    /// Picks a candidate. Local only.
    pub fn select(&self, index: usize) -> Option<SelectedThumbnail> {
        self.get(index).map(|image| SelectedThumbnail::Candidate {
            index,
            image: image.to_string(),
        })
    }
}

/// The thumbnail pending save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedThumbnail {
    /// One of the server candidates, bare base64 or a `data:` URL.
    Candidate { index: usize, image: String },
    /// A user-supplied image, kept as a `data:` URL preview.
    Custom { file_name: String, preview: String },
}

impl SelectedThumbnail {
    /// Bare base64 payload sent to the server.
    pub fn base64(&self) -> &str {
        match self {
            Self::Candidate { image, .. } => strip_data_url(image),
            Self::Custom { preview, .. } => strip_data_url(preview),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom { .. })
    }
}

/// Fetches candidates, validates custom images and persists the selection.
#[derive(Clone)]
pub struct ThumbnailNegotiator {
    api: Arc<dyn VideoApi>,
    max_custom_bytes: u64,
}

impl ThumbnailNegotiator {
    pub fn new(api: Arc<dyn VideoApi>, max_custom_bytes: u64) -> Self {
        Self {
            api,
            max_custom_bytes,
        }
    }

    /// Fetches the candidate set for an upload.
    pub async fn load_candidates(&self, guid: &str) -> Result<ThumbnailCandidateSet, ApiError> {
        let candidates = self.api.thumbnail_candidates(guid).await?;
        debug!(guid = %guid, count = candidates.len(), "thumbnail candidates loaded");
        Ok(ThumbnailCandidateSet::new(guid, candidates))
    }

    /// Validates a custom image and turns it into a pending selection.
    pub fn accept_custom_file(&self, image: &ImageFile) -> Result<SelectedThumbnail, IngestError> {
        validate_thumbnail_file(image, Some(self.max_custom_bytes))
            .map_err(ValidationError::InvalidThumbnail)?;

        Ok(SelectedThumbnail::Custom {
            file_name: image.file_name.clone(),
            preview: data_url(image),
        })
    }

    /// Persists the selection.
    ///
    /// Without a selection this fails locally and sends nothing.
    pub async fn save(
        &self,
        guid: &str,
        selection: Option<&SelectedThumbnail>,
    ) -> Result<(), IngestError> {
        let selection = selection.ok_or(ValidationError::NoThumbnailSelected)?;

        self.api.save_thumbnail(guid, selection.base64()).await?;
        info!(guid = %guid, custom = selection.is_custom(), "thumbnail saved");
        Ok(())
    }
}
