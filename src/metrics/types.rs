use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::MediaTime;
use crate::models::StartFailureReason;
use crate::state::PlaybackState;

/// One reported span, as the recorder saw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSample {
    pub timestamp: DateTime<Utc>,
    pub impression_id: Uuid,
    pub state: PlaybackState,
    pub duration_ms: i64,
    pub video_time_start: Option<MediaTime>,
    pub video_time_end: Option<MediaTime>,
    pub start_failure: Option<StartFailureReason>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetricsSnapshot {
    pub impression_id: Option<Uuid>,
    pub startup_time_ms: Option<i64>,
    pub played_ms: i64,
    pub paused_ms: i64,
    pub buffered_ms: i64,
    pub seek_ms: i64,
    pub rebuffer_count: u64,
    pub seek_count: u64,
    pub quality_change_count: u64,
    pub subtitle_change_count: u64,
    pub audio_change_count: u64,
    pub error_count: u64,
    pub heartbeat_count: u64,
    pub start_failure: Option<StartFailureReason>,
    pub recent_samples: Vec<SessionSample>,
}
