use std::time::Duration;

use vidflow_protocol::constants::{MAX_THUMBNAIL_BYTES, MAX_VIDEO_BYTES, POLL_INTERVAL};

/// Default host serving HLS manifests.
pub const DEFAULT_PLAYBACK_HOST: &str = "http://localhost:8080";

/// Ingest flow configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Delay between two pipeline status requests.
    pub poll_interval: Duration,
    /// Videos of this size or larger are rejected.
    pub max_video_bytes: u64,
    /// Custom thumbnails larger than this are rejected.
    pub max_thumbnail_bytes: u64,
    /// Host prepended to `videoUrl` to form the playback address.
    pub playback_host: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            max_video_bytes: MAX_VIDEO_BYTES,
            max_thumbnail_bytes: MAX_THUMBNAIL_BYTES,
            playback_host: DEFAULT_PLAYBACK_HOST.to_string(),
        }
    }
}
