//! Session state and its transition function.
//!
//! [`SessionState`] is a plain value. Every change goes through
//! [`apply`], which is pure: stale or out-of-place events return the
//! state unchanged. [`follow_up`] names the side effects an applied event
//! asks for; the orchestrator executes them.

use vidflow_intake::SelectedFile;
use vidflow_protocol::{PipelineStatus, PrivacyStatus, StatusResponse};

use crate::thumbnails::{SelectedThumbnail, ThumbnailCandidateSet};

/// Why a session stopped moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The upload request itself failed (network, server error, bad body).
    Transport,
    /// The synchronous review rejected the upload.
    Review,
    /// The pipeline ended in `FAILED_TRANSCODE` or `FAILED_AUDIT`.
    Pipeline,
}

/// Terminal failure of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SessionFailure {
    /// True when the failure is about the video itself rather than the
    /// infrastructure. Content failures carry the server's reason.
    pub fn is_content_based(&self) -> bool {
        !matches!(self.kind, FailureKind::Transport)
    }
}

/// Upload progress and identity of the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadSession {
    pub selected_file: Option<SelectedFile>,
    pub video_guid: Option<String>,
    pub video_id: Option<String>,
    /// 0-100, never decreasing within one attempt.
    pub upload_progress: u8,
    pub uploading: bool,
    pub upload_finished: bool,
    pub failure: Option<SessionFailure>,
    pub status_message: String,
}

impl UploadSession {
    pub fn upload_fail(&self) -> bool {
        self.failure.is_some()
    }
}

/// Last pipeline report mirrored from the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineView {
    pub status: Option<PipelineStatus>,
    /// Only set while the status reports transcode progress.
    pub transcode_progress: Option<f64>,
    pub video_url: Option<String>,
    pub audit_result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThumbnailState {
    pub candidates: Option<ThumbnailCandidateSet>,
    pub selected: Option<SelectedThumbnail>,
    pub saved: bool,
    pub load_error: Option<String>,
}

impl ThumbnailState {
    pub fn loaded(&self) -> bool {
        self.candidates.is_some()
    }
}

/// User-entered publish metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataForm {
    pub title: String,
    pub description: String,
    pub privacy: PrivacyStatus,
    /// Edited since the last successful publish or draft save.
    pub dirty: bool,
    /// Last privacy the server accepted, if any.
    pub submitted: Option<PrivacyStatus>,
}

/// Complete state of one ingestion session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub upload: UploadSession,
    pub pipeline: PipelineView,
    pub thumbnails: ThumbnailState,
    pub metadata: MetadataForm,
}

/// Everything that can change a [`SessionState`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A validated file replaces the session.
    FileSelected(SelectedFile),
    UploadStarted,
    UploadProgressed { percent: u8 },
    UploadSucceeded {
        guid: String,
        video_id: Option<String>,
    },
    ReviewRejected { reason: String },
    UploadFailed { message: String },
    ThumbnailsLoaded(ThumbnailCandidateSet),
    ThumbnailsFailed { message: String },
    ThumbnailSelected(SelectedThumbnail),
    ThumbnailSaved,
    PipelineUpdated(StatusResponse),
    /// Diagnostic only. A failed poll never changes the session.
    PollFailed { message: String },
    MetadataEdited {
        title: String,
        description: String,
        privacy: PrivacyStatus,
    },
    MetadataSubmitted { privacy: PrivacyStatus },
    Reset,
}

/// Side effects requested by an applied event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadThumbnails { guid: String },
    StartPolling { guid: String },
    StopPolling,
}

const GENERIC_PIPELINE_FAILURE: &str = "Video processing failed";

/// Applies one event to the state.
pub fn apply(mut state: SessionState, event: &SessionEvent) -> SessionState {
    match event {
        SessionEvent::FileSelected(file) => {
            let mut fresh = SessionState::default();
            fresh.upload.status_message = format!("Ready to upload {}", file.file_name);
            fresh.upload.selected_file = Some(file.clone());
            return fresh;
        }
        SessionEvent::Reset => return SessionState::default(),

        SessionEvent::UploadStarted => {
            if state.upload.selected_file.is_none() || state.upload.uploading {
                return state;
            }
            state.upload.uploading = true;
            state.upload.upload_progress = 0;
            state.upload.failure = None;
            state.pipeline = PipelineView {
                status: Some(PipelineStatus::Uploading),
                ..PipelineView::default()
            };
            state.upload.status_message = uploading_message(0);
        }
        SessionEvent::UploadProgressed { percent } => {
            if !state.upload.uploading {
                return state;
            }
            let percent = (*percent).min(100);
            if percent > state.upload.upload_progress {
                state.upload.upload_progress = percent;
                state.upload.status_message = uploading_message(percent);
            }
        }
        SessionEvent::UploadSucceeded { guid, video_id } => {
            if !state.upload.uploading {
                return state;
            }
            state.upload.uploading = false;
            state.upload.upload_finished = true;
            state.upload.upload_progress = 100;
            state.upload.video_guid = Some(guid.clone());
            state.upload.video_id = video_id.clone();
            state.pipeline.status = Some(PipelineStatus::Uploaded);
            state.upload.status_message = "Upload complete, processing".to_string();
        }
        SessionEvent::ReviewRejected { reason } => {
            if !state.upload.uploading {
                return state;
            }
            state.upload.uploading = false;
            state.pipeline.status = None;
            state.upload.status_message = format!("Rejected: {reason}");
            state.upload.failure = Some(SessionFailure {
                kind: FailureKind::Review,
                message: reason.clone(),
            });
        }
        SessionEvent::UploadFailed { message } => {
            if !state.upload.uploading {
                return state;
            }
            state.upload.uploading = false;
            state.pipeline.status = None;
            state.upload.status_message = message.clone();
            state.upload.failure = Some(SessionFailure {
                kind: FailureKind::Transport,
                message: message.clone(),
            });
        }

        SessionEvent::ThumbnailsLoaded(set) => {
            if state.upload.video_guid.as_deref() != Some(set.guid()) {
                return state;
            }
            state.thumbnails = ThumbnailState {
                candidates: Some(set.clone()),
                ..ThumbnailState::default()
            };
        }
        SessionEvent::ThumbnailsFailed { message } => {
            state.thumbnails.load_error = Some(message.clone());
        }
        SessionEvent::ThumbnailSelected(selected) => {
            state.thumbnails.selected = Some(selected.clone());
            state.thumbnails.saved = false;
        }
        SessionEvent::ThumbnailSaved => {
            if state.thumbnails.selected.is_some() {
                state.thumbnails.saved = true;
            }
        }

        SessionEvent::PipelineUpdated(report) => {
            if state.upload.video_guid.is_none()
                || state.pipeline.status.is_some_and(PipelineStatus::is_terminal)
            {
                return state;
            }
            mirror_report(&mut state, report);
        }
        SessionEvent::PollFailed { .. } => {}

        SessionEvent::MetadataEdited {
            title,
            description,
            privacy,
        } => {
            let metadata = &mut state.metadata;
            if metadata.title != *title
                || metadata.description != *description
                || metadata.privacy != *privacy
            {
                metadata.title = title.clone();
                metadata.description = description.clone();
                metadata.privacy = *privacy;
                metadata.dirty = true;
            }
        }
        SessionEvent::MetadataSubmitted { privacy } => {
            state.metadata.dirty = false;
            state.metadata.submitted = Some(*privacy);
            state.upload.status_message = match privacy {
                PrivacyStatus::Draft => "Draft saved".to_string(),
                _ => "Published".to_string(),
            };
        }
    }
    state
}

fn mirror_report(state: &mut SessionState, report: &StatusResponse) {
    let status = report.process_status;
    let audit_result = report
        .ai_audit_result
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    state.pipeline = PipelineView {
        status: Some(status),
        transcode_progress: report
            .transcode_progress
            .filter(|_| status.reports_transcode_progress())
            .map(|p| p.clamp(0.0, 100.0)),
        video_url: report.video_url.clone(),
        audit_result: audit_result.clone(),
    };

    if status.is_failure() {
        let message = audit_result.unwrap_or_else(|| GENERIC_PIPELINE_FAILURE.to_string());
        state.upload.status_message = format!("{}: {message}", status.label());
        state.upload.failure = Some(SessionFailure {
            kind: FailureKind::Pipeline,
            message,
        });
        return;
    }

    state.upload.status_message = match state.pipeline.transcode_progress {
        Some(progress) => format!("{} {:.0}%", status.label(), progress),
        None => status.label().to_string(),
    };
}

fn uploading_message(percent: u8) -> String {
    format!("Uploading... {percent}%")
}

/// True when a report moves the pipeline to an earlier stage.
pub fn is_regression(from: PipelineStatus, to: PipelineStatus) -> bool {
    to.stage_rank() < from.stage_rank()
}

/// Side effects requested by `event`, given the state it produced.
pub fn follow_up(state: &SessionState, event: &SessionEvent) -> Vec<Effect> {
    match event {
        SessionEvent::UploadSucceeded { guid, .. }
            if state.upload.video_guid.as_deref() == Some(guid.as_str()) =>
        {
            vec![
                Effect::LoadThumbnails { guid: guid.clone() },
                Effect::StartPolling { guid: guid.clone() },
            ]
        }
        SessionEvent::PipelineUpdated(report) if report.process_status.is_terminal() => {
            vec![Effect::StopPolling]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: PipelineStatus) -> StatusResponse {
        StatusResponse {
            video_url: None,
            process_status: status,
            ai_audit_result: None,
            transcode_progress: None,
        }
    }

    fn run(events: &[SessionEvent]) -> SessionState {
        events
            .iter()
            .fold(SessionState::default(), |state, event| apply(state, event))
    }

    fn uploaded() -> Vec<SessionEvent> {
        vec![
            SessionEvent::FileSelected(SelectedFile::new("clip.mp4", "video/mp4", 10)),
            SessionEvent::UploadStarted,
            SessionEvent::UploadSucceeded {
                guid: "abc".into(),
                video_id: Some("42".into()),
            },
        ]
    }

    #[test]
    fn file_selection_resets_everything() {
        let mut events = uploaded();
        events.push(SessionEvent::MetadataEdited {
            title: "t".into(),
            description: String::new(),
            privacy: PrivacyStatus::Public,
        });
        let state = run(&events);
        assert_eq!(state.upload.video_guid.as_deref(), Some("abc"));

        let file = SelectedFile::new("other.mp4", "video/mp4", 5);
        let state = apply(state, &SessionEvent::FileSelected(file.clone()));
        assert_eq!(state.upload.selected_file, Some(file));
        assert!(state.upload.video_guid.is_none());
        assert_eq!(state.upload.upload_progress, 0);
        assert!(!state.upload.upload_finished);
        assert!(state.pipeline.status.is_none());
        assert_eq!(state.metadata, MetadataForm::default());
    }

    #[test]
    fn upload_requires_a_file() {
        let state = apply(SessionState::default(), &SessionEvent::UploadStarted);
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn progress_never_decreases() {
        let state = run(&[
            SessionEvent::FileSelected(SelectedFile::new("clip.mp4", "video/mp4", 10)),
            SessionEvent::UploadStarted,
            SessionEvent::UploadProgressed { percent: 40 },
            SessionEvent::UploadProgressed { percent: 20 },
            SessionEvent::UploadProgressed { percent: 250 },
        ]);
        assert_eq!(state.upload.upload_progress, 100);

        let state = run(&[
            SessionEvent::FileSelected(SelectedFile::new("clip.mp4", "video/mp4", 10)),
            SessionEvent::UploadStarted,
            SessionEvent::UploadProgressed { percent: 40 },
            SessionEvent::UploadProgressed { percent: 20 },
        ]);
        assert_eq!(state.upload.upload_progress, 40);
        assert_eq!(state.upload.status_message, "Uploading... 40%");
    }

    #[test]
    fn progress_ignored_when_not_uploading() {
        let state = run(&[
            SessionEvent::FileSelected(SelectedFile::new("clip.mp4", "video/mp4", 10)),
            SessionEvent::UploadProgressed { percent: 60 },
        ]);
        assert_eq!(state.upload.upload_progress, 0);
    }

    #[test]
    fn success_assigns_guid_and_uploaded() {
        let state = run(&uploaded());
        assert_eq!(state.upload.video_guid.as_deref(), Some("abc"));
        assert_eq!(state.upload.video_id.as_deref(), Some("42"));
        assert!(state.upload.upload_finished);
        assert!(!state.upload.uploading);
        assert_eq!(state.pipeline.status, Some(PipelineStatus::Uploaded));
    }

    #[test]
    fn success_requests_thumbnails_and_polling() {
        let events = uploaded();
        let state = run(&events);
        assert_eq!(
            follow_up(&state, events.last().unwrap()),
            vec![
                Effect::LoadThumbnails { guid: "abc".into() },
                Effect::StartPolling { guid: "abc".into() },
            ]
        );
    }

    #[test]
    fn review_rejection_is_content_failure_without_guid() {
        let rejected = SessionEvent::ReviewRejected {
            reason: "nudity detected".into(),
        };
        let state = run(&[
            SessionEvent::FileSelected(SelectedFile::new("clip.mp4", "video/mp4", 10)),
            SessionEvent::UploadStarted,
            rejected.clone(),
        ]);

        let failure = state.upload.failure.clone().unwrap();
        assert_eq!(failure.kind, FailureKind::Review);
        assert_eq!(failure.message, "nudity detected");
        assert!(failure.is_content_based());
        assert!(state.upload.video_guid.is_none());
        assert!(state.pipeline.status.is_none());
        assert!(follow_up(&state, &rejected).is_empty());
    }

    #[test]
    fn transport_failure_is_infrastructure() {
        let state = run(&[
            SessionEvent::FileSelected(SelectedFile::new("clip.mp4", "video/mp4", 10)),
            SessionEvent::UploadStarted,
            SessionEvent::UploadFailed {
                message: "Upload failed".into(),
            },
        ]);
        let failure = state.upload.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Transport);
        assert!(!failure.is_content_based());
        assert!(state.pipeline.status.is_none());
    }

    #[test]
    fn pipeline_mirrors_reports() {
        let mut events = uploaded();
        events.push(SessionEvent::PipelineUpdated(StatusResponse {
            transcode_progress: Some(40.0),
            ..report(PipelineStatus::Transcoding)
        }));
        let state = run(&events);
        assert_eq!(state.pipeline.status, Some(PipelineStatus::Transcoding));
        assert_eq!(state.pipeline.transcode_progress, Some(40.0));
        assert_eq!(state.upload.status_message, "Transcoding 40%");
    }

    #[test]
    fn transcode_progress_dropped_outside_processing() {
        let mut events = uploaded();
        events.push(SessionEvent::PipelineUpdated(StatusResponse {
            transcode_progress: Some(100.0),
            ..report(PipelineStatus::AiAuditing)
        }));
        let state = run(&events);
        assert!(state.pipeline.transcode_progress.is_none());
    }

    #[test]
    fn backward_report_is_mirrored() {
        let mut events = uploaded();
        events.push(SessionEvent::PipelineUpdated(report(PipelineStatus::AiAuditing)));
        events.push(SessionEvent::PipelineUpdated(report(PipelineStatus::Transcoding)));
        let state = run(&events);
        assert_eq!(state.pipeline.status, Some(PipelineStatus::Transcoding));
        assert!(is_regression(
            PipelineStatus::AiAuditing,
            PipelineStatus::Transcoding
        ));
    }

    #[test]
    fn terminal_status_is_never_left() {
        let mut events = uploaded();
        events.push(SessionEvent::PipelineUpdated(StatusResponse {
            video_url: Some("xyz".into()),
            ..report(PipelineStatus::Ready)
        }));
        events.push(SessionEvent::PipelineUpdated(report(PipelineStatus::Transcoding)));
        let state = run(&events);
        assert_eq!(state.pipeline.status, Some(PipelineStatus::Ready));
        assert_eq!(state.pipeline.video_url.as_deref(), Some("xyz"));
    }

    #[test]
    fn failed_audit_uses_server_reason() {
        let mut events = uploaded();
        let terminal = SessionEvent::PipelineUpdated(StatusResponse {
            ai_audit_result: Some("explicit content at 00:12".into()),
            ..report(PipelineStatus::FailedAudit)
        });
        events.push(terminal.clone());
        let state = run(&events);

        let failure = state.upload.failure.clone().unwrap();
        assert_eq!(failure.kind, FailureKind::Pipeline);
        assert_eq!(failure.message, "explicit content at 00:12");
        assert_eq!(follow_up(&state, &terminal), vec![Effect::StopPolling]);
    }

    #[test]
    fn failed_transcode_without_reason_gets_default() {
        let mut events = uploaded();
        events.push(SessionEvent::PipelineUpdated(StatusResponse {
            ai_audit_result: Some("   ".into()),
            ..report(PipelineStatus::FailedTranscode)
        }));
        let state = run(&events);
        assert_eq!(state.upload.failure.unwrap().message, GENERIC_PIPELINE_FAILURE);
    }

    #[test]
    fn poll_failure_changes_nothing() {
        let state = run(&uploaded());
        let after = apply(
            state.clone(),
            &SessionEvent::PollFailed {
                message: "timeout".into(),
            },
        );
        assert_eq!(after, state);
    }

    #[test]
    fn pipeline_report_ignored_before_upload() {
        let state = apply(
            SessionState::default(),
            &SessionEvent::PipelineUpdated(report(PipelineStatus::Ready)),
        );
        assert!(state.pipeline.status.is_none());
    }

    #[test]
    fn thumbnails_for_other_guid_are_ignored() {
        let state = run(&uploaded());
        let state = apply(
            state,
            &SessionEvent::ThumbnailsLoaded(ThumbnailCandidateSet::new("old", vec!["A".into()])),
        );
        assert!(!state.thumbnails.loaded());
    }

    #[test]
    fn thumbnail_reload_clears_selection() {
        let mut events = uploaded();
        let set = ThumbnailCandidateSet::new("abc", vec!["A".into(), "B".into()]);
        events.push(SessionEvent::ThumbnailsLoaded(set.clone()));
        events.push(SessionEvent::ThumbnailSelected(set.select(1).unwrap()));
        events.push(SessionEvent::ThumbnailSaved);
        let state = run(&events);
        assert!(state.thumbnails.saved);

        let state = apply(state, &SessionEvent::ThumbnailsLoaded(set));
        assert!(state.thumbnails.selected.is_none());
        assert!(!state.thumbnails.saved);
    }

    #[test]
    fn selecting_again_marks_unsaved() {
        let mut events = uploaded();
        let set = ThumbnailCandidateSet::new("abc", vec!["A".into(), "B".into()]);
        events.push(SessionEvent::ThumbnailsLoaded(set.clone()));
        events.push(SessionEvent::ThumbnailSelected(set.select(0).unwrap()));
        events.push(SessionEvent::ThumbnailSaved);
        events.push(SessionEvent::ThumbnailSelected(set.select(1).unwrap()));
        let state = run(&events);
        assert!(!state.thumbnails.saved);
    }

    #[test]
    fn metadata_edit_and_submit() {
        let state = run(&[SessionEvent::MetadataEdited {
            title: "My Clip".into(),
            description: String::new(),
            privacy: PrivacyStatus::Public,
        }]);
        assert!(state.metadata.dirty);

        let state = apply(
            state,
            &SessionEvent::MetadataSubmitted {
                privacy: PrivacyStatus::Draft,
            },
        );
        assert!(!state.metadata.dirty);
        assert_eq!(state.metadata.submitted, Some(PrivacyStatus::Draft));
        assert_eq!(state.upload.status_message, "Draft saved");
    }

    #[test]
    fn unchanged_metadata_edit_stays_clean() {
        let state = apply(
            SessionState::default(),
            &SessionEvent::MetadataEdited {
                title: String::new(),
                description: String::new(),
                privacy: PrivacyStatus::Private,
            },
        );
        assert!(!state.metadata.dirty);
    }
}
