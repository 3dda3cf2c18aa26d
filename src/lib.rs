//! Playback analytics core.
//!
//! Turns the callbacks of a media player backend into a normalized playback
//! session: one state machine per impression, with startup time, stalls,
//! seeks, quality switches and start failures measured on the way.

pub mod adapters;
pub mod clock;
pub mod collector;
pub mod metrics;
pub mod models;
pub mod settings;
pub mod state;
pub mod timer;
pub mod tracking;
mod utils;

pub use adapters::{
    AppLifecycle, NativeEvent, NativePlayer, NativePlayerAdapter, PlayerAdapter, SdkEvent,
    SdkPlayer, SdkPlayerAdapter, SignalSink,
};
pub use clock::{Clock, ManualClock, MediaTime, SystemClock};
pub use collector::{CollectorHandle, CollectorOptions};
pub use metrics::{SessionMetricsSnapshot, SessionRecorder};
pub use models::{ErrorPayload, EventData, StartFailureReason};
pub use settings::{CollectorConfig, SourceMetadata};
pub use state::{PlaybackState, PlaybackStateMachine, SessionDelegate};
pub use utils::init_logging;
