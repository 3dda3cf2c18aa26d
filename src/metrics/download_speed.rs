use serde::{Deserialize, Serialize};

use crate::clock::secs_to_millis;
use crate::models::AccessLogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedMeasurement {
    pub size: i64,
    pub duration_ms: i64,
    pub segment_count: i64,
}

impl SpeedMeasurement {
    /// Measurement for a finished access-log entry. `None` when it
    /// transferred nothing or reports an unusable duration.
    pub fn from_access_log(entry: &AccessLogEntry) -> Option<Self> {
        if entry.bytes_transferred <= 0 {
            return None;
        }
        Some(Self {
            size: entry.bytes_transferred,
            duration_ms: secs_to_millis(entry.transfer_duration_secs)?,
            segment_count: entry.segments_downloaded.max(0),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSpeedInfo {
    pub segments_download_size: i64,
    pub segments_download_time: i64,
    pub segments_download_count: i64,
}

/// Sums segment downloads since the last reset.
#[derive(Debug, Clone, Default)]
pub struct DownloadSpeedMeter {
    measurements: Vec<SpeedMeasurement>,
}

impl DownloadSpeedMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, measurement: SpeedMeasurement) {
        self.measurements.push(measurement);
    }

    pub fn reset(&mut self) {
        self.measurements.clear();
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn get_info(&self) -> DownloadSpeedInfo {
        self.measurements
            .iter()
            .fold(DownloadSpeedInfo::default(), |mut info, measurement| {
                info.segments_download_size += measurement.size;
                info.segments_download_time += measurement.duration_ms;
                info.segments_download_count += measurement.segment_count;
                info
            })
    }
}
