//! Adapter bridging the HTTP client to the `VideoApi` trait required by
//! `vidflow-ingest`.

use vidflow_api_client::{Client, Error as ClientError};
use vidflow_ingest::{ApiError, ApiFuture, VideoApi};
use vidflow_intake::SelectedFile;
use vidflow_protocol::{
    ProgressCallback, PublishRequest, StatusResponse, UploadResponse, extract_server_message,
};

/// Implements `VideoApi` by delegating to the HTTP [`Client`].
pub struct HttpVideoApi {
    client: Client,
}

impl HttpVideoApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl VideoApi for HttpVideoApi {
    fn upload<'a>(
        &'a self,
        file: &'a SelectedFile,
        on_progress: ProgressCallback,
    ) -> ApiFuture<'a, UploadResponse> {
        Box::pin(async move { self.client.upload(file, on_progress).await.map_err(to_api_error) })
    }

    fn thumbnail_candidates<'a>(&'a self, guid: &'a str) -> ApiFuture<'a, Vec<String>> {
        Box::pin(async move {
            self.client
                .thumbnail_candidates(guid)
                .await
                .map_err(to_api_error)
        })
    }

    fn save_thumbnail<'a>(
        &'a self,
        guid: &'a str,
        thumbnail_base64: &'a str,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .save_thumbnail(guid, thumbnail_base64)
                .await
                .map_err(to_api_error)
        })
    }

    fn fetch_status<'a>(&'a self, guid: &'a str) -> ApiFuture<'a, StatusResponse> {
        Box::pin(async move { self.client.status(guid).await.map_err(to_api_error) })
    }

    fn publish<'a>(&'a self, request: &'a PublishRequest) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.client.publish(request).await.map_err(to_api_error) })
    }

    fn save_draft<'a>(&'a self, request: &'a PublishRequest) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.client.save_draft(request).await.map_err(to_api_error) })
    }
}

fn to_api_error(e: ClientError) -> ApiError {
    if e.is_timeout() {
        return ApiError::Timeout;
    }
    match e {
        ClientError::Api { status, body } => ApiError::Status {
            status,
            message: extract_server_message(&body),
        },
        ClientError::Http(inner) => match inner.status() {
            Some(status) => ApiError::Status {
                status: status.as_u16(),
                message: None,
            },
            None => ApiError::Network(inner.to_string()),
        },
        ClientError::Json(inner) => ApiError::Malformed(inner.to_string()),
        ClientError::Io(inner) => ApiError::Network(inner.to_string()),
        ClientError::InvalidUrl(url) => ApiError::Network(format!("invalid base URL: {url}")),
    }
}
