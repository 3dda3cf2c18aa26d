use serde::{Deserialize, Serialize};

/// Video rendition as an explicit-event backend describes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuality {
    pub id: Option<String>,
    pub bitrate: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec: Option<String>,
}

impl VideoQuality {
    pub fn with_bitrate(bitrate: u64) -> Self {
        Self {
            bitrate: Some(bitrate),
            ..Self::default()
        }
    }
}

/// One entry of a native backend's access log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub indicated_bitrate: f64,
    pub duration_watched_secs: f64,
    pub bytes_transferred: i64,
    pub transfer_duration_secs: f64,
    pub segments_downloaded: i64,
}
