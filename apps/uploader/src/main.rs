//! vidflow-uploader: uploads one video, waits for processing and publishes it.
//!
//! Usage: `vidflow-uploader <file> <title>`

mod api_adapter;
mod config;

use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use vidflow_api_client::Client;
use vidflow_ingest::{IngestError, IngestOrchestrator, SessionEvent, ValidationError};
use vidflow_intake::SelectedFile;
use vidflow_protocol::{PipelineStatus, PrivacyStatus};

use api_adapter::HttpVideoApi;
use config::UploaderConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,vidflow=debug")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(title)) = (args.next(), args.next()) else {
        bail!("usage: vidflow-uploader <file> <title>");
    };

    let cfg = UploaderConfig::load().unwrap_or_default();
    debug!(api = %cfg.api_base_url, "configuration loaded");

    let client = Client::new(&cfg.api_base_url, Some(cfg.request_timeout()))?;
    let api = Arc::new(HttpVideoApi::new(client));
    let mut orch = IngestOrchestrator::new(api, cfg.ingest_config());

    let file = SelectedFile::from_path(&path).with_context(|| format!("cannot read {path}"))?;
    orch.select_file(file)?;
    orch.edit_metadata(title, "", PrivacyStatus::Private);
    orch.start_upload()?;

    run(&mut orch).await?;

    if let Some(failure) = &orch.state().upload.failure {
        let origin = if failure.is_content_based() {
            "rejected"
        } else {
            "failed"
        };
        bail!("upload {origin}: {}", failure.message);
    }

    if orch.state().pipeline.status == Some(PipelineStatus::Ready) {
        match orch.publish().await {
            Ok(()) => info!("published"),
            Err(IngestError::Validation(ValidationError::ThumbnailNotSaved)) => {
                warn!("no thumbnail saved, keeping the video as a draft");
                orch.save_draft().await?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(url) = orch.playback_url() {
        println!("{url}");
    }
    Ok(())
}

/// Applies events until every background task has finished.
///
/// The first Ctrl-C with unsaved work only warns; a second one aborts.
async fn run(orch: &mut IngestOrchestrator) -> anyhow::Result<()> {
    let mut ctrl_c = Box::pin(tokio::signal::ctrl_c());
    let mut warned = false;

    loop {
        tokio::select! {
            update = orch.next_update() => {
                let Some(event) = update else { return Ok(()) };
                on_event(orch, &event).await;
            }
            _ = &mut ctrl_c => {
                match orch.unload_warning() {
                    Some(warning) if !warned => {
                        warn!("{warning} Press Ctrl-C again to quit.");
                        warned = true;
                        ctrl_c.set(tokio::signal::ctrl_c());
                    }
                    _ => {
                        orch.teardown();
                        bail!("interrupted");
                    }
                }
            }
        }
    }
}

async fn on_event(orch: &mut IngestOrchestrator, event: &SessionEvent) {
    match event {
        SessionEvent::UploadProgressed { .. } => {
            debug!(status = %orch.state().upload.status_message, "upload");
        }
        SessionEvent::PollFailed { message } => {
            debug!(error = %message, "poll failed, retrying");
        }
        SessionEvent::ThumbnailsLoaded(set) if !set.is_empty() => {
            // Keep the first candidate; a failed save leaves the draft path open.
            let saved = match orch.select_thumbnail(0) {
                Ok(()) => orch.save_thumbnail().await,
                Err(e) => Err(e),
            };
            match saved {
                Ok(()) => info!("thumbnail saved"),
                Err(e) => warn!(error = %e, "could not save thumbnail"),
            }
        }
        _ => info!(status = %orch.state().upload.status_message),
    }
}
