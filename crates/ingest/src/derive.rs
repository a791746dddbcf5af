//! UI flags derived from [`SessionState`].
//!
//! Nothing here is stored; every call recomputes from the state.

use vidflow_protocol::{PipelineStatus, playback_url as manifest_url};

use crate::state::SessionState;

/// Message shown when leaving with unsaved work.
pub const UNLOAD_WARNING: &str = "You have unsaved changes. Leave anyway?";

/// Snapshot of every UI-facing boolean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiFlags {
    pub can_start_upload: bool,
    pub is_processing: bool,
    pub is_failed: bool,
    pub can_show_thumbnails: bool,
    pub can_save_thumbnail: bool,
    pub can_publish: bool,
    pub can_save_draft: bool,
    pub show_transcode_progress: bool,
}

pub fn ui_flags(state: &SessionState) -> UiFlags {
    UiFlags {
        can_start_upload: can_start_upload(state),
        is_processing: is_processing(state),
        is_failed: state.upload.failure.is_some(),
        can_show_thumbnails: can_show_thumbnails(state),
        can_save_thumbnail: can_save_thumbnail(state),
        can_publish: can_publish(state),
        can_save_draft: can_save_draft(state),
        show_transcode_progress: state.pipeline.transcode_progress.is_some(),
    }
}

pub fn can_start_upload(state: &SessionState) -> bool {
    state.upload.selected_file.is_some() && !state.upload.uploading
}

/// Uploaded and waiting on the pipeline.
pub fn is_processing(state: &SessionState) -> bool {
    state.upload.video_guid.is_some()
        && state.upload.failure.is_none()
        && !state.pipeline.status.is_some_and(PipelineStatus::is_terminal)
}

pub fn can_show_thumbnails(state: &SessionState) -> bool {
    state.upload.upload_finished && state.thumbnails.loaded() && !state.thumbnails.saved
}

pub fn can_save_thumbnail(state: &SessionState) -> bool {
    state.upload.video_guid.is_some()
        && state.thumbnails.selected.is_some()
        && !state.thumbnails.saved
}

pub fn can_publish(state: &SessionState) -> bool {
    state.upload.video_guid.is_some()
        && state.upload.failure.is_none()
        && state.pipeline.status == Some(PipelineStatus::Ready)
        && state.thumbnails.saved
        && has_title(state)
}

pub fn can_save_draft(state: &SessionState) -> bool {
    state.upload.video_guid.is_some() && has_title(state)
}

fn has_title(state: &SessionState) -> bool {
    !state.metadata.title.trim().is_empty()
}

/// HLS manifest address, once the video is ready.
pub fn playback_url(state: &SessionState, host: &str) -> Option<String> {
    if state.pipeline.status != Some(PipelineStatus::Ready) {
        return None;
    }
    state
        .pipeline
        .video_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| manifest_url(host, url))
}

/// Warning to show before discarding the session, if any work would be lost.
pub fn unload_warning(state: &SessionState) -> Option<&'static str> {
    let unsaved_thumbnail = state.thumbnails.selected.is_some() && !state.thumbnails.saved;
    (state.metadata.dirty || state.upload.uploading || unsaved_thumbnail).then_some(UNLOAD_WARNING)
}
