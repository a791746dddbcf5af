use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Server-side pipeline stage of an uploaded video.
///
/// `Ready`, `FailedTranscode` and `FailedAudit` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    Uploading,
    Uploaded,
    PreProcessing,
    Transcoding,
    AiAuditing,
    Ready,
    FailedTranscode,
    FailedAudit,
}

impl PipelineStatus {
    /// All statuses in pipeline order.
    pub const ALL: [PipelineStatus; 8] = [
        Self::Uploading,
        Self::Uploaded,
        Self::PreProcessing,
        Self::Transcoding,
        Self::AiAuditing,
        Self::Ready,
        Self::FailedTranscode,
        Self::FailedAudit,
    ];

    /// Returns true when no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Ready | Self::FailedTranscode | Self::FailedAudit
        )
    }

    /// Returns true for the two failure outcomes.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::FailedTranscode | Self::FailedAudit)
    }

    /// Whether `transcodeProgress` carries meaning in this stage.
    pub fn reports_transcode_progress(self) -> bool {
        matches!(self, Self::PreProcessing | Self::Transcoding)
    }

    /// Position in the forward pipeline. Terminal outcomes share the last rank.
    pub fn stage_rank(self) -> u8 {
        match self {
            Self::Uploading => 0,
            Self::Uploaded => 1,
            Self::PreProcessing => 2,
            Self::Transcoding => 3,
            Self::AiAuditing => 4,
            Self::Ready | Self::FailedTranscode | Self::FailedAudit => 5,
        }
    }

    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploading => "UPLOADING",
            Self::Uploaded => "UPLOADED",
            Self::PreProcessing => "PRE_PROCESSING",
            Self::Transcoding => "TRANSCODING",
            Self::AiAuditing => "AI_AUDITING",
            Self::Ready => "READY",
            Self::FailedTranscode => "FAILED_TRANSCODE",
            Self::FailedAudit => "FAILED_AUDIT",
        }
    }

    /// Short human-readable label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Uploading => "Uploading",
            Self::Uploaded => "Uploaded",
            Self::PreProcessing => "Pre-processing",
            Self::Transcoding => "Transcoding",
            Self::AiAuditing => "Checking content",
            Self::Ready => "Ready",
            Self::FailedTranscode => "Transcoding failed",
            Self::FailedAudit => "Content check failed",
        }
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownStatus(s.to_string()))
    }
}

/// Visibility of a video once submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrivacyStatus {
    Public,
    #[default]
    Private,
    Unlisted,
    Draft,
}

impl PrivacyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
            Self::Unlisted => "UNLISTED",
            Self::Draft => "DRAFT",
        }
    }
}

impl FromStr for PrivacyStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(Self::Public),
            "PRIVATE" => Ok(Self::Private),
            "UNLISTED" => Ok(Self::Unlisted),
            "DRAFT" => Ok(Self::Draft),
            _ => Err(ProtocolError::UnknownPrivacy(s.to_string())),
        }
    }
}

/// Callback invoked with byte-level upload progress.
pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

/// Byte-level progress reported by an upload transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Returns the upload progress as a whole percentage (0-100).
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 0;
        }
        let pct = self.bytes_sent.saturating_mul(100) / self.total_bytes;
        pct.min(100) as u8
    }
}
