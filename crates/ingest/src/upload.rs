//! Upload transport: runs one upload attempt and reports it as events.
//!
//! An attempt emits zero or more `UploadProgressed` events followed by
//! exactly one of `UploadSucceeded`, `ReviewRejected` or `UploadFailed`.
//! A cancelled attempt emits nothing further.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vidflow_intake::{ProgressClamp, SelectedFile};
use vidflow_protocol::{ProgressCallback, UploadResponse};

use crate::api::VideoApi;
use crate::error::ApiError;
use crate::state::SessionEvent;
use crate::tasks::EventSink;

const GENERIC_UPLOAD_FAILURE: &str = "Upload failed. Check your connection and try again.";
const DEFAULT_REVIEW_REASON: &str = "The video was rejected by content review";

pub(crate) struct UploadTransport {
    api: Arc<dyn VideoApi>,
}

impl UploadTransport {
    pub(crate) fn new(api: Arc<dyn VideoApi>) -> Self {
        Self { api }
    }

    /// Spawns the attempt. Events go to `sink` until `cancel` fires.
    pub(crate) fn spawn(&self, file: SelectedFile, sink: EventSink, cancel: CancellationToken) {
        let api = Arc::clone(&self.api);
        tokio::spawn(run_upload(api, file, sink, cancel));
    }
}

async fn run_upload(
    api: Arc<dyn VideoApi>,
    file: SelectedFile,
    sink: EventSink,
    cancel: CancellationToken,
) {
    let clamp = ProgressClamp::new();
    let progress_sink = sink.clone();
    let on_progress: ProgressCallback = Box::new(move |progress| {
        if let Some(percent) = clamp.advance_bytes(progress) {
            progress_sink.send(SessionEvent::UploadProgressed { percent });
        }
    });

    debug!(file = %file.file_name, size = file.size, "upload started");
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(file = %file.file_name, "upload cancelled");
            return;
        }
        result = api.upload(&file, on_progress) => result,
    };

    if cancel.is_cancelled() {
        return;
    }
    sink.send(outcome_event(result));
}

/// Maps the upload result to the single terminal event of the attempt.
pub(crate) fn outcome_event(result: Result<UploadResponse, ApiError>) -> SessionEvent {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "upload failed");
            return SessionEvent::UploadFailed {
                message: transport_message(&e),
            };
        }
    };

    if !response.review_passed {
        let reason = response
            .review_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REVIEW_REASON.to_string());
        warn!(reason = %reason, "upload rejected by review");
        return SessionEvent::ReviewRejected { reason };
    }

    match response.guid.filter(|g| !g.trim().is_empty()) {
        Some(guid) => {
            info!(guid = %guid, "upload accepted");
            SessionEvent::UploadSucceeded {
                guid,
                video_id: response.video_id,
            }
        }
        None => {
            error!("upload response carried no guid");
            SessionEvent::UploadFailed {
                message: "Upload failed: the server response had no video id".to_string(),
            }
        }
    }
}

fn transport_message(e: &ApiError) -> String {
    match e.server_message() {
        Some(message) => format!("Upload failed: {message}"),
        None => GENERIC_UPLOAD_FAILURE.to_string(),
    }
}
