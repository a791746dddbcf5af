use std::sync::atomic::{AtomicU8, Ordering};

use vidflow_protocol::UploadProgress;

/// Keeps upload percentages non-decreasing and within 0-100.
///
/// Transports may report out of order (retransmits, buffered writers);
/// only strictly larger values pass through.
#[derive(Debug, Default)]
pub struct ProgressClamp {
    highest: AtomicU8,
}

impl ProgressClamp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a raw percentage. Returns the value to publish, or `None`
    /// when it would not move progress forward.
    pub fn advance(&self, percent: u8) -> Option<u8> {
        let percent = percent.min(100);
        let previous = self.highest.fetch_max(percent, Ordering::AcqRel);
        (percent > previous).then_some(percent)
    }

    /// Same as [`advance`](Self::advance) for a byte-level report.
    pub fn advance_bytes(&self, progress: UploadProgress) -> Option<u8> {
        self.advance(progress.percent())
    }

    /// Highest value published so far.
    pub fn current(&self) -> u8 {
        self.highest.load(Ordering::Acquire)
    }
}
