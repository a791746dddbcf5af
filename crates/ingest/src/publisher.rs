//! Metadata submission: final publish or draft.
//!
//! Both calls are single attempts. Guard failures are local and send
//! nothing; server failures are returned for the caller to resubmit.

use std::sync::Arc;

use tracing::{info, warn};
use vidflow_protocol::{PipelineStatus, PrivacyStatus, PublishRequest};

use crate::api::VideoApi;
use crate::error::{IngestError, ValidationError};

#[derive(Clone)]
pub struct MetadataPublisher {
    api: Arc<dyn VideoApi>,
}

impl MetadataPublisher {
    pub fn new(api: Arc<dyn VideoApi>) -> Self {
        Self { api }
    }

    /// Publishes with the requested privacy. Only a `READY` video can be
    /// published.
    pub async fn publish(
        &self,
        status: Option<PipelineStatus>,
        request: PublishRequest,
    ) -> Result<(), IngestError> {
        match status {
            Some(PipelineStatus::Ready) => {}
            Some(s) if s.is_failure() => return Err(ValidationError::PipelineFailed.into()),
            other => return Err(ValidationError::NotReady { status: other }.into()),
        }
        let request = checked(request)?;

        self.api.publish(&request).await.inspect_err(|e| {
            warn!(guid = %request.video_guid, error = %e, "publish failed");
        })?;
        info!(guid = %request.video_guid, privacy = request.privacy_status.as_str(), "video published");
        Ok(())
    }

    /// Saves the metadata as a draft, whatever the pipeline is doing.
    /// The privacy is always sent as `DRAFT`.
    pub async fn save_draft(&self, request: PublishRequest) -> Result<(), IngestError> {
        let mut request = checked(request)?;
        request.privacy_status = PrivacyStatus::Draft;

        self.api.save_draft(&request).await.inspect_err(|e| {
            warn!(guid = %request.video_guid, error = %e, "draft save failed");
        })?;
        info!(guid = %request.video_guid, "draft saved");
        Ok(())
    }
}

/// Requires a guid and a non-blank title; trims the title.
fn checked(mut request: PublishRequest) -> Result<PublishRequest, ValidationError> {
    if request.video_guid.trim().is_empty() {
        return Err(ValidationError::NotUploaded);
    }
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    request.title = title.to_string();
    Ok(request)
}
