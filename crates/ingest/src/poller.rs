//! Pipeline status poller.
//!
//! One request per tick, never two in flight. The response carrying a
//! terminal status is delivered before the loop halts. Failed polls are
//! reported as `PollFailed` and the loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::api::VideoApi;
use crate::state::SessionEvent;
use crate::tasks::EventSink;

/// Shortest accepted interval; tokio rejects a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) struct PipelineStatePoller {
    api: Arc<dyn VideoApi>,
    interval: Duration,
}

impl PipelineStatePoller {
    pub(crate) fn new(api: Arc<dyn VideoApi>, interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            warn!(
                interval_ms = interval.as_millis() as u64,
                min_ms = MIN_INTERVAL.as_millis() as u64,
                "poll interval too short, raising it"
            );
        }
        Self {
            api,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Starts polling `guid`. The loop runs until a terminal status is
    /// delivered, `cancel` fires, or the receiver goes away.
    pub(crate) fn start(&self, guid: String, sink: EventSink, cancel: CancellationToken) {
        let api = Arc::clone(&self.api);
        tokio::spawn(poll_loop(api, guid, self.interval, sink, cancel));
    }
}

async fn poll_loop(
    api: Arc<dyn VideoApi>,
    guid: String,
    period: Duration,
    sink: EventSink,
    cancel: CancellationToken,
) {
    info!(guid = %guid, interval_ms = period.as_millis() as u64, "polling started");

    let mut ticker = interval_at(Instant::now() + period, period);
    // A slow response pushes the next tick back instead of bunching ticks up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        trace!(guid = %guid, "polling status");
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = api.fetch_status(&guid) => result,
        };

        match result {
            Ok(report) => {
                let status = report.process_status;
                debug!(guid = %guid, status = %status, progress = ?report.transcode_progress, "pipeline status");
                if !sink.send(SessionEvent::PipelineUpdated(report)) {
                    break;
                }
                if status.is_terminal() {
                    info!(guid = %guid, status = %status, "pipeline reached terminal status");
                    return;
                }
            }
            Err(e) => {
                warn!(guid = %guid, error = %e, "status poll failed");
                if !sink.send(SessionEvent::PollFailed {
                    message: e.to_string(),
                }) {
                    break;
                }
            }
        }
    }

    debug!(guid = %guid, "polling stopped");
}
