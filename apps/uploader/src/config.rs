//! Uploader configuration.
//!
//! Read from `~/.config/vidflow/config.json`. Every field is optional;
//! `VIDFLOW_API_URL` and `VIDFLOW_PLAYBACK_HOST` override the file.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vidflow_ingest::IngestConfig;
use vidflow_ingest::config::DEFAULT_PLAYBACK_HOST;
use vidflow_protocol::constants::{POLL_INTERVAL, REQUEST_TIMEOUT};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/videos";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Root of the video API; endpoint paths are appended to it.
    pub api_base_url: String,

    /// Host serving HLS manifests.
    pub playback_host: String,

    pub poll_interval_ms: u64,

    /// Timeout for every request except the upload itself.
    pub request_timeout_secs: u64,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            playback_host: DEFAULT_PLAYBACK_HOST.into(),
            poll_interval_ms: POLL_INTERVAL.as_millis() as u64,
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl UploaderConfig {
    /// Loads the config file, falling back to defaults when it is missing
    /// or unreadable, then applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::parse(&content).unwrap_or_else(|| {
                tracing::warn!(path = %path.display(), "failed to parse config, using defaults");
                Self::default()
            })
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn parse(content: &str) -> Option<Self> {
        serde_json::from_str(content).ok()
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("VIDFLOW_API_URL").filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(host) = lookup("VIDFLOW_PLAYBACK_HOST").filter(|v| !v.is_empty()) {
            self.playback_host = host;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(100)),
            playback_host: self.playback_host.clone(),
            ..IngestConfig::default()
        }
    }
}

fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("vidflow").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(dir) = std::env::var("XDG_CONFIG_HOME")
            && !dir.is_empty()
        {
            return Ok(PathBuf::from(dir));
        }
        let home = std::env::var("HOME")?;
        Ok(PathBuf::from(home).join(".config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = UploaderConfig::default();
        assert_eq!(config.poll_interval_ms, 3000);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.ingest_config().poll_interval, Duration::from_millis(3000));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = UploaderConfig::parse(r#"{"api_base_url":"https://api.example.com"}"#).unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.playback_host, DEFAULT_PLAYBACK_HOST);
        assert_eq!(config.poll_interval_ms, 3000);
    }

    #[test]
    fn garbage_does_not_parse() {
        assert!(UploaderConfig::parse("not json").is_none());
    }

    #[test]
    fn env_overrides_file() {
        let mut config = UploaderConfig::default();
        config.apply_overrides(|key| match key {
            "VIDFLOW_API_URL" => Some("https://api.example.com".into()),
            "VIDFLOW_PLAYBACK_HOST" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.playback_host, DEFAULT_PLAYBACK_HOST);
    }

    #[test]
    fn ingest_config_carries_playback_host() {
        let config = UploaderConfig {
            playback_host: "https://cdn.example.com".into(),
            poll_interval_ms: 10,
            ..UploaderConfig::default()
        };
        let ingest = config.ingest_config();
        assert_eq!(ingest.playback_host, "https://cdn.example.com");
        assert_eq!(ingest.poll_interval, Duration::from_millis(100));
    }
}
