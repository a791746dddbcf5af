//! Client-side video ingestion flow.
//!
//! This crate drives one upload through the server pipeline: it validates
//! the file, uploads it, polls the pipeline until a terminal status,
//! negotiates a thumbnail and finally publishes or saves a draft. It has
//! no HTTP dependency; the application provides a [`VideoApi`]
//! implementation that bridges to the real client.
//!
//! # Flow
//!
//! 1. **Intake**: `select_file` validates type and size
//! 2. **Upload**: progress events, then a synchronous review result
//! 3. **Thumbnails + polling**: started together once the upload passes review
//! 4. **Publish**: allowed once the pipeline is `READY` and a thumbnail is saved
//!
//! Session state is a plain value changed only by [`apply`]; UI flags are
//! derived from it on demand.

pub mod api;
pub mod config;
pub mod derive;
pub mod error;
pub mod orchestrator;
pub mod publisher;
pub mod state;
pub mod thumbnails;

mod poller;
mod tasks;
mod upload;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use api::{ApiFuture, VideoApi};
pub use config::IngestConfig;
pub use derive::{UiFlags, ui_flags, unload_warning};
pub use error::{ApiError, IngestError, ValidationError};
pub use orchestrator::IngestOrchestrator;
pub use publisher::MetadataPublisher;
pub use state::{
    Effect, FailureKind, MetadataForm, PipelineView, SessionEvent, SessionFailure, SessionState,
    ThumbnailState, UploadSession, apply, follow_up,
};
pub use thumbnails::{SelectedThumbnail, ThumbnailCandidateSet, ThumbnailNegotiator};
