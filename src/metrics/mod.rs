pub mod bitrate;
pub mod download_speed;
pub mod recorder;
mod types;

pub use bitrate::{BitrateChange, BitrateSample, BitrateSampler};
pub use download_speed::{DownloadSpeedInfo, DownloadSpeedMeter, SpeedMeasurement};
pub use recorder::SessionRecorder;
pub use types::{SessionMetricsSnapshot, SessionSample};
