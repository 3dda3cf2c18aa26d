use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Describes the content being played. Copied into every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceMetadata {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub path: Option<String>,
    pub cdn_provider: Option<String>,
    pub experiment_name: Option<String>,
    pub is_live: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectorConfig {
    pub heartbeat_interval_ms: u64,
    pub video_start_timeout_ms: u64,
    pub max_seek_operation_ms: i64,
    pub time_jump_duplicate_tolerance_ms: i64,
    pub bitrate_poll_interval_ms: u64,
    pub quality_change_threshold: u32,
    pub quality_change_reset_interval_ms: u64,
    pub is_live: bool,
    pub source: SourceMetadata,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 59_700,
            video_start_timeout_ms: 1_000,
            max_seek_operation_ms: 10_000,
            time_jump_duplicate_tolerance_ms: 1_000,
            bitrate_poll_interval_ms: 1_000,
            quality_change_threshold: 50,
            quality_change_reset_interval_ms: 60 * 60 * 1_000,
            is_live: false,
            source: SourceMetadata::default(),
        }
    }
}

impl CollectorConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read collector config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse collector config in {}", path.display()))
    }

    /// Like [`Self::load_from_path`], but a missing or broken file yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_path(path) {
            Ok(config) => config,
            Err(err) => {
                log_warn!("{err:#}; using default collector config");
                Self::default()
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write collector config to {}", path.display()))
    }

    /// Live flag to report while the player cannot tell yet.
    pub fn live_default(&self) -> bool {
        self.source.is_live.unwrap_or(self.is_live)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn video_start_timeout(&self) -> Duration {
        Duration::from_millis(self.video_start_timeout_ms)
    }

    pub fn bitrate_poll_interval(&self) -> Duration {
        Duration::from_millis(self.bitrate_poll_interval_ms)
    }

    pub fn quality_change_reset_interval(&self) -> Duration {
        Duration::from_millis(self.quality_change_reset_interval_ms)
    }
}
