//! vidflow API client.
//!
//! JSON requests carry a per-request timeout; the multipart upload does
//! not, since its duration scales with the file size.

use std::time::Duration;

use futures_util::TryStreamExt;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::{debug, trace};
use vidflow_intake::SelectedFile;
use vidflow_protocol::constants::{REQUEST_TIMEOUT, UPLOAD_FIELD, endpoints};
use vidflow_protocol::{
    ProgressCallback, PublishRequest, SaveThumbnailRequest, StatusResponse,
    ThumbnailPreviewRequest, UploadProgress, UploadResponse, extract_server_message,
};

/// Errors from the vidflow API client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Best-effort human-readable message supplied by the server.
    pub fn server_message(&self) -> Option<String> {
        match self {
            Self::Api { body, .. } => extract_server_message(body),
            _ => None,
        }
    }

    /// HTTP status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// vidflow API client.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl Client {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// `request_timeout` bounds every request except the upload; `None`
    /// uses the protocol default.
    pub fn new(base_url: &str, request_timeout: Option<Duration>) -> Result<Self, Error> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::InvalidUrl(base_url));
        }

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url,
            request_timeout: request_timeout.unwrap_or(REQUEST_TIMEOUT),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Uploads a video as multipart form data.
    ///
    /// `on_progress` fires as each chunk of the file is handed to the
    /// connection. Reports arrive in read order; callers still clamp.
    pub async fn upload(
        &self,
        file: &SelectedFile,
        on_progress: ProgressCallback,
    ) -> Result<UploadResponse, Error> {
        let handle = tokio::fs::File::open(&file.path).await?;
        let total_bytes = file.size;
        let mut bytes_sent: u64 = 0;

        let stream = ReaderStream::new(handle).inspect_ok(move |chunk| {
            bytes_sent += chunk.len() as u64;
            on_progress(UploadProgress {
                bytes_sent,
                total_bytes,
            });
        });

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total_bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        debug!(file = %file.file_name, bytes = total_bytes, "starting upload");
        let resp = self
            .http
            .post(self.url(endpoints::UPLOAD))
            .multipart(form)
            .send()
            .await?;

        let body = read_success(resp).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetches the server-extracted thumbnail candidates for an upload.
    pub async fn thumbnail_candidates(&self, guid: &str) -> Result<Vec<String>, Error> {
        let req = ThumbnailPreviewRequest {
            video_guid: guid.to_string(),
        };
        self.post_json(endpoints::THUMBNAILS_PREVIEW, &req).await
    }

    /// Persists the chosen thumbnail.
    pub async fn save_thumbnail(&self, guid: &str, thumbnail_base64: &str) -> Result<(), Error> {
        let req = SaveThumbnailRequest {
            video_guid: guid.to_string(),
            thumbnail_base64: thumbnail_base64.to_string(),
        };
        self.post_no_content(endpoints::SAVE_THUMBNAIL, &req).await
    }

    /// Reads the current pipeline status of an upload.
    pub async fn status(&self, guid: &str) -> Result<StatusResponse, Error> {
        let encoded = utf8_percent_encode(guid, NON_ALPHANUMERIC).to_string();
        let resp = self
            .http
            .get(self.url(&endpoints::status(&encoded)))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let body = read_success(resp).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Publishes a video with its final metadata.
    pub async fn publish(&self, req: &PublishRequest) -> Result<(), Error> {
        self.post_no_content(endpoints::PUBLISH, req).await
    }

    /// Saves metadata as a draft.
    pub async fn save_draft(&self, req: &PublishRequest) -> Result<(), Error> {
        self.post_no_content(endpoints::DRAFT, req).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .post(self.url(path))
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await?;
        let bytes = read_success(resp).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post_no_content<B>(&self, path: &str, body: &B) -> Result<(), Error>
    where
        B: Serialize + ?Sized,
    {
        let resp = self
            .http
            .post(self.url(path))
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await?;
        read_success(resp).await?;
        Ok(())
    }
}

/// Returns the body of a 2xx response, or an `Api` error carrying the
/// status and whatever body the server sent.
async fn read_success(resp: reqwest::Response) -> Result<Vec<u8>, Error> {
    let status = resp.status();
    trace!(status = status.as_u16(), url = %resp.url(), "response");

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(resp.bytes().await?.to_vec())
}
