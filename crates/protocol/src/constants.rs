use std::time::Duration;

/// Interval between two pipeline status polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Exclusive size ceiling for uploaded videos (500 MiB).
pub const MAX_VIDEO_BYTES: u64 = 500 * 1024 * 1024;

/// Size ceiling for custom thumbnail images (2 MiB).
pub const MAX_THUMBNAIL_BYTES: u64 = 2 * 1024 * 1024;

/// Default timeout for JSON requests. Uploads are not bounded.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Multipart field name carrying the video bytes.
pub const UPLOAD_FIELD: &str = "file";

/// Endpoint paths, relative to the API base URL.
pub mod endpoints {
    pub const UPLOAD: &str = "/upload";
    pub const THUMBNAILS_PREVIEW: &str = "/thumbnails-preview";
    pub const SAVE_THUMBNAIL: &str = "/save-thumbnail";
    pub const PUBLISH: &str = "/publish";
    pub const DRAFT: &str = "/draft";

    /// Status path for one upload: `/{guid}/status`.
    pub fn status(guid: &str) -> String {
        format!("/{guid}/status")
    }
}

/// Manifest file appended to the video path to form an HLS address.
pub const PLAYBACK_MANIFEST: &str = "playlist.m3u8";

/// Builds the adaptive-streaming manifest address for a ready video.
///
/// Slashes at the seams are normalised so `https://cdn/` + `/v/abc`
/// and `https://cdn` + `v/abc` produce the same URL.
pub fn playback_url(host: &str, video_url: &str) -> String {
    let host = host.trim_end_matches('/');
    let path = video_url.trim_matches('/');
    format!("{host}/{path}/{PLAYBACK_MANIFEST}")
}
