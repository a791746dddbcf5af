use serde::{Deserialize, Serialize};

use crate::types::{PipelineStatus, PrivacyStatus};

/// Body returned by `POST /upload`.
///
/// `guid` is optional on the wire so a response without it can be
/// reported as malformed instead of as an opaque parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub review_passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

/// Body of `POST /thumbnails-preview`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailPreviewRequest {
    pub video_guid: String,
}

/// Body of `POST /save-thumbnail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveThumbnailRequest {
    pub video_guid: String,
    pub thumbnail_base64: String,
}

/// Body returned by `GET /{guid}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub process_status: PipelineStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_audit_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcode_progress: Option<f64>,
}

/// Body of `POST /publish` and `POST /draft`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub video_guid: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub privacy_status: PrivacyStatus,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Pulls a human-readable message out of an error response body.
///
/// Accepts `{"message": ..}`, `{"error": ..}` or a short plain-text body.
/// Returns `None` when nothing usable is found.
pub fn extract_server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed
            .message
            .or(parsed.error)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
    }

    if body.starts_with('<') || body.starts_with('{') || body.len() > 200 {
        return None;
    }
    Some(body.to_string())
}
