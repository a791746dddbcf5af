//! Transport seam between the ingest flow and the video API.
//!
//! The application implements [`VideoApi`] on top of its HTTP client.
//! Keeping it a trait keeps the flow testable with mocks.

use std::future::Future;
use std::pin::Pin;

use vidflow_intake::SelectedFile;
use vidflow_protocol::{ProgressCallback, PublishRequest, StatusResponse, UploadResponse};

use crate::error::ApiError;

/// Boxed future returned by [`VideoApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Abstract video API.
pub trait VideoApi: Send + Sync {
    /// Uploads the file. `on_progress` receives byte-level reports while
    /// the body is sent.
    fn upload<'a>(
        &'a self,
        file: &'a SelectedFile,
        on_progress: ProgressCallback,
    ) -> ApiFuture<'a, UploadResponse>;

    /// Returns the server-extracted thumbnail candidates (base64 images).
    fn thumbnail_candidates<'a>(&'a self, guid: &'a str) -> ApiFuture<'a, Vec<String>>;

    fn save_thumbnail<'a>(&'a self, guid: &'a str, thumbnail_base64: &'a str)
    -> ApiFuture<'a, ()>;

    fn fetch_status<'a>(&'a self, guid: &'a str) -> ApiFuture<'a, StatusResponse>;

    fn publish<'a>(&'a self, request: &'a PublishRequest) -> ApiFuture<'a, ()>;

    fn save_draft<'a>(&'a self, request: &'a PublishRequest) -> ApiFuture<'a, ()>;
}
