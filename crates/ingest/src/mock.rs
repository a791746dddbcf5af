//! Scripted [`VideoApi`] for tests.
//!
//! Built into unit tests, and exported under the `test-util` feature for
//! the scenario tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use vidflow_intake::SelectedFile;
use vidflow_protocol::{
    PipelineStatus, ProgressCallback, PublishRequest, StatusResponse, UploadProgress,
    UploadResponse,
};

use crate::api::{ApiFuture, VideoApi};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload(String),
    Candidates(String),
    SaveThumbnail { guid: String, base64: String },
    Status(String),
    Publish(PublishRequest),
    Draft(PublishRequest),
}

/// A status report with nothing but the stage set.
pub fn status(process_status: PipelineStatus) -> StatusResponse {
    StatusResponse {
        video_url: None,
        process_status,
        ai_audit_result: None,
        transcode_progress: None,
    }
}

/// An upload response that passed review.
pub fn passed(guid: &str) -> Result<UploadResponse, ApiError> {
    Ok(UploadResponse {
        guid: Some(guid.into()),
        review_passed: true,
        review_reason: None,
        video_id: None,
    })
}

/// Byte reports in ten equal steps up to `total`.
pub fn ten_steps(total: u64) -> Vec<(u64, u64)> {
    (1..=10).map(|i| (total * i / 10, total)).collect()
}

struct ScriptedUpload {
    /// `None` uses the mock-wide progress reports.
    progress: Option<Vec<(u64, u64)>>,
    result: Result<UploadResponse, ApiError>,
}

pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    uploads: Mutex<VecDeque<ScriptedUpload>>,
    upload_progress: Vec<(u64, u64)>,
    upload_step: Duration,
    candidates: Result<Vec<String>, ApiError>,
    save_thumbnail: Result<(), ApiError>,
    statuses: Mutex<VecDeque<Result<StatusResponse, ApiError>>>,
    status_delay: Duration,
    publish: Result<(), ApiError>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            uploads: Mutex::new(VecDeque::new()),
            upload_progress: Vec::new(),
            upload_step: Duration::from_millis(100),
            candidates: Ok(Vec::new()),
            save_thumbnail: Ok(()),
            statuses: Mutex::new(VecDeque::new()),
            status_delay: Duration::ZERO,
            publish: Ok(()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queues an upload outcome; each upload call consumes one.
    pub fn with_upload(self, result: Result<UploadResponse, ApiError>) -> Self {
        self.push_upload(None, result)
    }

    /// Queues an upload with its own byte reports, one per 100 ms step.
    pub fn with_upload_steps(
        self,
        progress: &[(u64, u64)],
        result: Result<UploadResponse, ApiError>,
    ) -> Self {
        self.push_upload(Some(progress.to_vec()), result)
    }

    /// Byte reports for uploads queued without their own.
    pub fn with_upload_progress(mut self, reports: &[(u64, u64)]) -> Self {
        self.upload_progress = reports.to_vec();
        self
    }

    pub fn with_candidates(mut self, candidates: &[&str]) -> Self {
        self.candidates = Ok(candidates.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_save_thumbnail_error(mut self, error: ApiError) -> Self {
        self.save_thumbnail = Err(error);
        self
    }

    /// Status responses in order. The last one repeats once the rest are used.
    pub fn with_statuses(self, statuses: Vec<Result<StatusResponse, ApiError>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    pub fn with_publish_error(mut self, error: ApiError) -> Self {
        self.publish = Err(error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn status_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Status(_)))
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn push_upload(
        self,
        progress: Option<Vec<(u64, u64)>>,
        result: Result<UploadResponse, ApiError>,
    ) -> Self {
        self.uploads
            .lock()
            .unwrap()
            .push_back(ScriptedUpload { progress, result });
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_status(&self) -> Result<StatusResponse, ApiError> {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses
                .front()
                .cloned()
                .unwrap_or(Err(ApiError::Network("no scripted status".into())))
        }
    }
}

/// Counts a request as in flight until dropped, so aborted requests count down too.
struct InFlight<'a>(&'a MockApi);

impl<'a> InFlight<'a> {
    fn enter(api: &'a MockApi) -> Self {
        let now = api.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        api.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(api)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl VideoApi for MockApi {
    fn upload<'a>(
        &'a self,
        file: &'a SelectedFile,
        on_progress: ProgressCallback,
    ) -> ApiFuture<'a, UploadResponse> {
        Box::pin(async move {
            self.record(Call::Upload(file.file_name.clone()));
            let script = self.uploads.lock().unwrap().pop_front();
            let Some(script) = script else {
                return Err(ApiError::Network("no scripted upload".into()));
            };
            let progress = script
                .progress
                .unwrap_or_else(|| self.upload_progress.clone());
            for (bytes_sent, total_bytes) in progress {
                on_progress(UploadProgress {
                    bytes_sent,
                    total_bytes,
                });
                tokio::time::sleep(self.upload_step).await;
            }
            script.result
        })
    }

    fn thumbnail_candidates<'a>(&'a self, guid: &'a str) -> ApiFuture<'a, Vec<String>> {
        Box::pin(async move {
            self.record(Call::Candidates(guid.to_string()));
            self.candidates.clone()
        })
    }

    fn save_thumbnail<'a>(
        &'a self,
        guid: &'a str,
        thumbnail_base64: &'a str,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.record(Call::SaveThumbnail {
                guid: guid.to_string(),
                base64: thumbnail_base64.to_string(),
            });
            self.save_thumbnail.clone()
        })
    }

    fn fetch_status<'a>(&'a self, guid: &'a str) -> ApiFuture<'a, StatusResponse> {
        Box::pin(async move {
            let _guard = InFlight::enter(self);
            self.record(Call::Status(guid.to_string()));
            if !self.status_delay.is_zero() {
                tokio::time::sleep(self.status_delay).await;
            }
            self.next_status()
        })
    }

    fn publish<'a>(&'a self, request: &'a PublishRequest) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.record(Call::Publish(request.clone()));
            self.publish.clone()
        })
    }

    fn save_draft<'a>(&'a self, request: &'a PublishRequest) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.record(Call::Draft(request.clone()));
            self.publish.clone()
        })
    }
}
