//! Ingest orchestrator.
//!
//! Owns the session state and the background tasks acting on it. Tasks
//! report through a channel; [`IngestOrchestrator::next_update`] applies
//! their events one at a time, so the state is only ever written here.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use vidflow_intake::{ImageFile, SelectedFile, validate_video_file};
use vidflow_protocol::{PipelineStatus, PrivacyStatus, PublishRequest};

use crate::api::VideoApi;
use crate::config::IngestConfig;
use crate::derive::{self, UiFlags};
use crate::error::{IngestError, ValidationError};
use crate::poller::PipelineStatePoller;
use crate::publisher::MetadataPublisher;
use crate::state::{Effect, SessionEvent, SessionState, apply, follow_up, is_regression};
use crate::tasks::{Envelope, EventSink, Report, TaskArena, TaskKind};
use crate::thumbnails::ThumbnailNegotiator;
use crate::upload::UploadTransport;

/// Drives one ingestion session at a time.
pub struct IngestOrchestrator {
    config: IngestConfig,
    state: SessionState,
    tasks: TaskArena,
    events_tx: mpsc::UnboundedSender<Envelope>,
    events_rx: mpsc::UnboundedReceiver<Envelope>,
    transport: UploadTransport,
    poller: PipelineStatePoller,
    thumbnails: ThumbnailNegotiator,
    publisher: MetadataPublisher,
}

impl IngestOrchestrator {
    pub fn new(api: Arc<dyn VideoApi>, config: IngestConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport: UploadTransport::new(Arc::clone(&api)),
            poller: PipelineStatePoller::new(Arc::clone(&api), config.poll_interval),
            thumbnails: ThumbnailNegotiator::new(Arc::clone(&api), config.max_thumbnail_bytes),
            publisher: MetadataPublisher::new(api),
            config,
            state: SessionState::default(),
            tasks: TaskArena::default(),
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn flags(&self) -> UiFlags {
        derive::ui_flags(&self.state)
    }

    pub fn playback_url(&self) -> Option<String> {
        derive::playback_url(&self.state, &self.config.playback_host)
    }

    /// Warning to show before the session is discarded, if any.
    pub fn unload_warning(&self) -> Option<&'static str> {
        derive::unload_warning(&self.state)
    }

    /// True while the status poller is running.
    pub fn is_polling(&self) -> bool {
        self.tasks.is_active(TaskKind::Poller)
    }

    /// Validates and adopts a new file.
    ///
    /// A rejected file leaves the current session untouched. An accepted
    /// one stops every running task and starts a fresh session.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), IngestError> {
        validate_video_file(&file, Some(self.config.max_video_bytes))
            .map_err(ValidationError::InvalidFile)?;

        info!(file = %file.file_name, size = file.size, "file selected");
        self.tasks.stop_all();
        self.commit(SessionEvent::FileSelected(file));
        Ok(())
    }

    /// Starts uploading the selected file.
    ///
    /// Starting again after a finished or failed attempt begins a fresh
    /// session for the same file.
    pub fn start_upload(&mut self) -> Result<(), IngestError> {
        let file = self
            .state
            .upload
            .selected_file
            .clone()
            .ok_or(ValidationError::NoFileSelected)?;
        if self.state.upload.uploading {
            return Err(ValidationError::UploadInProgress.into());
        }

        if self.state.upload.upload_finished || self.state.upload.failure.is_some() {
            self.tasks.stop_all();
            self.commit(SessionEvent::FileSelected(file.clone()));
        }

        self.commit(SessionEvent::UploadStarted);
        let (id, cancel) = self.tasks.register(TaskKind::Upload);
        let sink = EventSink::new(self.events_tx.clone(), TaskKind::Upload, id);
        self.transport.spawn(file, sink, cancel);
        Ok(())
    }

    /// Waits for the next event from a background task and applies it.
    ///
    /// Returns `None` once no task is running and nothing is queued.
    pub async fn next_update(&mut self) -> Option<SessionEvent> {
        loop {
            let envelope = match self.events_rx.try_recv() {
                Ok(envelope) => envelope,
                Err(_) if self.tasks.is_empty() => return None,
                Err(_) => self.events_rx.recv().await?,
            };

            match envelope.report {
                Report::Exited => self.tasks.release(envelope.kind, envelope.id),
                Report::Event(event) => {
                    if !self.tasks.is_current(envelope.kind, envelope.id) {
                        trace!(kind = ?envelope.kind, event = ?event, "dropping stale event");
                        continue;
                    }
                    return Some(self.commit(event));
                }
            }
        }
    }

    /// Picks one of the loaded candidates. No network.
    pub fn select_thumbnail(&mut self, index: usize) -> Result<(), IngestError> {
        let selected = self
            .state
            .thumbnails
            .candidates
            .as_ref()
            .and_then(|set| set.select(index))
            .ok_or(ValidationError::NoThumbnailSelected)?;
        self.commit(SessionEvent::ThumbnailSelected(selected));
        Ok(())
    }

    /// Validates a custom image and makes it the pending selection.
    pub fn accept_custom_thumbnail(&mut self, image: &ImageFile) -> Result<(), IngestError> {
        let selected = self.thumbnails.accept_custom_file(image)?;
        self.commit(SessionEvent::ThumbnailSelected(selected));
        Ok(())
    }

    /// Persists the pending thumbnail selection.
    pub async fn save_thumbnail(&mut self) -> Result<(), IngestError> {
        let guid = self.uploaded_guid()?;
        self.thumbnails
            .save(&guid, self.state.thumbnails.selected.as_ref())
            .await?;
        self.commit(SessionEvent::ThumbnailSaved);
        Ok(())
    }

    /// Fetches a new candidate set, replacing the current one.
    pub fn reload_thumbnails(&mut self) -> Result<(), IngestError> {
        let guid = self.uploaded_guid()?;
        self.spawn_thumbnails(guid);
        Ok(())
    }

    /// Records edits to the publish form.
    pub fn edit_metadata(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        privacy: PrivacyStatus,
    ) {
        self.commit(SessionEvent::MetadataEdited {
            title: title.into(),
            description: description.into(),
            privacy,
        });
    }

    /// Publishes with the form's metadata.
    ///
    /// Requires a `READY` pipeline, a saved thumbnail and a title. Guard
    /// failures make no network call.
    pub async fn publish(&mut self) -> Result<(), IngestError> {
        let request = self.publish_request(self.state.metadata.privacy)?;
        if self.state.pipeline.status == Some(PipelineStatus::Ready)
            && !self.state.thumbnails.saved
        {
            return Err(ValidationError::ThumbnailNotSaved.into());
        }

        let privacy = request.privacy_status;
        self.publisher
            .publish(self.state.pipeline.status, request)
            .await?;
        self.commit(SessionEvent::MetadataSubmitted { privacy });
        Ok(())
    }

    /// Saves the form's metadata as a draft. Allowed any time after upload.
    pub async fn save_draft(&mut self) -> Result<(), IngestError> {
        let request = self.publish_request(PrivacyStatus::Draft)?;
        self.publisher.save_draft(request).await?;
        self.commit(SessionEvent::MetadataSubmitted {
            privacy: PrivacyStatus::Draft,
        });
        Ok(())
    }

    /// Stops the poller. Safe to call at any time, any number of times.
    pub fn stop_polling(&mut self) {
        if self.tasks.stop(TaskKind::Poller) {
            debug!("poller stopped");
        }
    }

    /// Stops every task and clears the session.
    pub fn teardown(&mut self) {
        self.tasks.stop_all();
        self.commit(SessionEvent::Reset);
    }

    fn uploaded_guid(&self) -> Result<String, ValidationError> {
        self.state
            .upload
            .video_guid
            .clone()
            .ok_or(ValidationError::NotUploaded)
    }

    fn publish_request(&self, privacy: PrivacyStatus) -> Result<PublishRequest, ValidationError> {
        let metadata = &self.state.metadata;
        Ok(PublishRequest {
            video_guid: self.uploaded_guid()?,
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            privacy_status: privacy,
        })
    }

    /// Applies an event and runs the effects it asks for.
    fn commit(&mut self, event: SessionEvent) -> SessionEvent {
        if let SessionEvent::PipelineUpdated(report) = &event
            && let Some(current) = self.state.pipeline.status
            && !current.is_terminal()
            && is_regression(current, report.process_status)
        {
            warn!(
                from = %current,
                to = %report.process_status,
                "pipeline reported an earlier stage"
            );
        }

        self.state = apply(std::mem::take(&mut self.state), &event);
        for effect in follow_up(&self.state, &event) {
            self.run(effect);
        }
        event
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::LoadThumbnails { guid } => self.spawn_thumbnails(guid),
            Effect::StartPolling { guid } => {
                let (id, cancel) = self.tasks.register(TaskKind::Poller);
                let sink = EventSink::new(self.events_tx.clone(), TaskKind::Poller, id);
                self.poller.start(guid, sink, cancel);
            }
            Effect::StopPolling => self.stop_polling(),
        }
    }

    fn spawn_thumbnails(&mut self, guid: String) {
        let (id, cancel) = self.tasks.register(TaskKind::Thumbnails);
        let sink = EventSink::new(self.events_tx.clone(), TaskKind::Thumbnails, id);
        let negotiator = self.thumbnails.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                result = negotiator.load_candidates(&guid) => result,
            };
            let event = match result {
                Ok(set) => SessionEvent::ThumbnailsLoaded(set),
                Err(e) => {
                    warn!(guid = %guid, error = %e, "loading thumbnail candidates failed");
                    SessionEvent::ThumbnailsFailed {
                        message: e.to_string(),
                    }
                }
            };
            sink.send(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::mock::{Call, MockApi, passed, status};
    use std::time::Duration;
    use vidflow_protocol::StatusResponse;

    fn clip() -> SelectedFile {
        SelectedFile::new("clip.mp4", "video/mp4", 10 * 1024 * 1024)
    }

    fn orchestrator(api: &Arc<MockApi>) -> IngestOrchestrator {
        IngestOrchestrator::new(api.clone(), IngestConfig::default())
    }

    async fn drain(orch: &mut IngestOrchestrator) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = orch.next_update().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn rejected_file_keeps_session() {
        let api = Arc::new(MockApi::new());
        let mut orch = orchestrator(&api);
        orch.select_file(clip()).unwrap();

        let err = orch
            .select_file(SelectedFile::new("notes.txt", "text/plain", 10))
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Validation(ValidationError::InvalidFile(_))
        ));
        assert_eq!(orch.state().upload.selected_file, Some(clip()));
    }

    #[test]
    fn upload_without_file_is_rejected() {
        let api = Arc::new(MockApi::new());
        let mut orch = orchestrator(&api);
        assert!(matches!(
            orch.start_upload(),
            Err(IngestError::Validation(ValidationError::NoFileSelected))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn upload_in_progress_is_rejected() {
        let api = Arc::new(
            MockApi::new()
                .with_upload_progress(&[(1, 2)])
                .with_upload(passed("abc")),
        );
        let mut orch = orchestrator(&api);
        orch.select_file(clip()).unwrap();
        orch.start_upload().unwrap();
        assert!(matches!(
            orch.start_upload(),
            Err(IngestError::Validation(ValidationError::UploadInProgress))
        ));
    }

    #[tokio::test]
    async fn next_update_is_none_when_idle() {
        let api = Arc::new(MockApi::new());
        let mut orch = orchestrator(&api);
        assert!(orch.next_update().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn success_starts_thumbnails_and_poller_together() {
        let api = Arc::new(
            MockApi::new()
                .with_upload(passed("abc"))
                .with_candidates(&["A", "B"])
                .with_statuses(vec![Ok(status(PipelineStatus::Transcoding))]),
        );
        let mut orch = orchestrator(&api);
        orch.select_file(clip()).unwrap();
        orch.start_upload().unwrap();

        loop {
            let event = orch.next_update().await.unwrap();
            if matches!(event, SessionEvent::UploadSucceeded { .. }) {
                break;
            }
        }
        assert!(orch.is_polling());
        assert_eq!(orch.state().pipeline.status, Some(PipelineStatus::Uploaded));

        let event = orch.next_update().await.unwrap();
        assert!(matches!(event, SessionEvent::ThumbnailsLoaded(_)));
        assert!(orch.flags().can_show_thumbnails);
        // Candidates arrive before the first poll tick.
        assert_eq!(api.status_calls(), 0);

        orch.stop_polling();
        orch.stop_polling();
        assert!(!orch.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failures_surface_without_changing_state() {
        let api = Arc::new(
            MockApi::new()
                .with_upload(passed("abc"))
                .with_statuses(vec![
                    Err(ApiError::Timeout),
                    Ok(status(PipelineStatus::Ready)),
                ]),
        );
        let mut orch = orchestrator(&api);
        orch.select_file(clip()).unwrap();
        orch.start_upload().unwrap();

        let mut before_failure = None;
        let mut saw_failure = false;
        while let Some(event) = orch.next_update().await {
            match event {
                SessionEvent::PollFailed { .. } => {
                    saw_failure = true;
                    assert_eq!(Some(orch.state().clone()), before_failure);
                }
                _ => before_failure = Some(orch.state().clone()),
            }
        }
        assert!(saw_failure);
        assert_eq!(orch.state().pipeline.status, Some(PipelineStatus::Ready));
        assert!(!orch.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_poll_interval_still_reaches_ready() {
        let api = Arc::new(
            MockApi::new()
                .with_upload(passed("abc"))
                .with_statuses(vec![Ok(status(PipelineStatus::Ready))]),
        );
        let config = IngestConfig {
            poll_interval: Duration::ZERO,
            ..IngestConfig::default()
        };
        let mut orch = IngestOrchestrator::new(api.clone(), config);
        orch.select_file(clip()).unwrap();
        orch.start_upload().unwrap();
        drain(&mut orch).await;

        assert_eq!(orch.state().pipeline.status, Some(PipelineStatus::Ready));
        assert_eq!(api.status_calls(), 1);
        assert!(!orch.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn thumbnail_save_and_publish_flow() {
        let api = Arc::new(
            MockApi::new()
                .with_upload(passed("abc"))
                .with_candidates(&["A", "B"])
                .with_statuses(vec![Ok(StatusResponse {
                    video_url: Some("xyz".into()),
                    ..status(PipelineStatus::Ready)
                })]),
        );
        let mut orch = orchestrator(&api);
        orch.select_file(clip()).unwrap();
        orch.start_upload().unwrap();
        drain(&mut orch).await;

        orch.edit_metadata("My Clip", "", PrivacyStatus::Public);
        assert!(orch.unload_warning().is_some());

        let err = orch.publish().await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Validation(ValidationError::ThumbnailNotSaved)
        ));

        let err = orch.save_thumbnail().await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Validation(ValidationError::NoThumbnailSelected)
        ));

        orch.select_thumbnail(1).unwrap();
        orch.save_thumbnail().await.unwrap();
        orch.publish().await.unwrap();

        assert!(orch.unload_warning().is_none());
        assert_eq!(
            orch.playback_url().as_deref(),
            Some("http://localhost:8080/xyz/playlist.m3u8")
        );
        let calls = api.calls();
        assert!(calls.contains(&Call::SaveThumbnail {
            guid: "abc".into(),
            base64: "B".into()
        }));
        assert!(matches!(calls.last(), Some(Call::Publish(req)) if req.title == "My Clip"));
    }

    #[tokio::test(start_paused = true)]
    async fn reload_replaces_candidates() {
        let api = Arc::new(
            MockApi::new()
                .with_upload(passed("abc"))
                .with_candidates(&["A"])
                .with_statuses(vec![Ok(status(PipelineStatus::Ready))]),
        );
        let mut orch = orchestrator(&api);
        orch.select_file(clip()).unwrap();
        orch.start_upload().unwrap();
        drain(&mut orch).await;

        orch.select_thumbnail(0).unwrap();
        orch.reload_thumbnails().unwrap();
        drain(&mut orch).await;

        assert!(orch.state().thumbnails.selected.is_none());
        let candidate_calls = api
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Candidates(_)))
            .count();
        assert_eq!(candidate_calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_transport_failure_starts_fresh() {
        let api = Arc::new(
            MockApi::new()
                .with_upload(Err(ApiError::Network("reset".into())))
                .with_upload(passed("abc"))
                .with_statuses(vec![Ok(status(PipelineStatus::Ready))]),
        );
        let mut orch = orchestrator(&api);
        orch.select_file(clip()).unwrap();
        orch.start_upload().unwrap();
        drain(&mut orch).await;
        assert!(orch.flags().is_failed);

        orch.start_upload().unwrap();
        assert!(!orch.flags().is_failed);
        drain(&mut orch).await;
        assert_eq!(orch.state().upload.video_guid.as_deref(), Some("abc"));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_everything() {
        let api = Arc::new(
            MockApi::new()
                .with_upload(passed("abc"))
                .with_statuses(vec![Ok(status(PipelineStatus::Transcoding))]),
        );
        let mut orch = orchestrator(&api);
        orch.select_file(clip()).unwrap();
        orch.start_upload().unwrap();
        while !orch.is_polling() {
            orch.next_update().await.unwrap();
        }

        orch.teardown();
        assert_eq!(orch.state(), &SessionState::default());
        assert!(orch.next_update().await.is_none());

        let polls = api.status_calls();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.status_calls(), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_polling() {
        let api = Arc::new(
            MockApi::new()
                .with_upload(passed("abc"))
                .with_statuses(vec![Ok(status(PipelineStatus::Transcoding))]),
        );
        let mut orch = orchestrator(&api);
        orch.select_file(clip()).unwrap();
        orch.start_upload().unwrap();
        while !orch.is_polling() {
            orch.next_update().await.unwrap();
        }
        drop(orch);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.status_calls(), 0);
    }
}
