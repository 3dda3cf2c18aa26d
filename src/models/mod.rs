pub mod error;
pub mod event_data;
pub mod quality;

pub use error::{ErrorPayload, StartFailureReason};
pub use event_data::{resolve_is_live, DrmType, EventData, PlayerKind, StreamType};
pub use quality::{AccessLogEntry, VideoQuality};
