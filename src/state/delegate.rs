use uuid::Uuid;

use crate::clock::MediaTime;
use crate::models::{ErrorPayload, StartFailureReason};

use super::PlaybackState;

/// The state span a hook refers to.
///
/// For exit hooks `state` is the state being left and the media bookmarks
/// cover the whole span; for entry hooks it is the state just entered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanInfo {
    pub impression_id: Uuid,
    pub state: PlaybackState,
    pub video_time_start: Option<MediaTime>,
    pub video_time_end: Option<MediaTime>,
    pub timestamp_ms: i64,
}

/// Receives the state machine's exit and entry hooks.
///
/// Every method defaults to a no-op. Called on the collector task, so
/// implementations must not block.
pub trait SessionDelegate: Send + Sync {
    fn did_exit_setup(&self, _span: &SpanInfo) {}

    /// First Playing/Paused entry of the session.
    fn did_startup(&self, _span: &SpanInfo, _startup_ms: i64) {}

    fn did_exit_buffering(&self, _span: &SpanInfo, _duration_ms: i64) {}

    fn did_exit_playing(&self, _span: &SpanInfo, _duration_ms: i64) {}

    fn did_exit_pause(&self, _span: &SpanInfo, _duration_ms: i64) {}

    fn did_exit_seeking(&self, _span: &SpanInfo, _duration_ms: i64, _destination: PlaybackState) {}

    fn did_quality_change(&self, _span: &SpanInfo) {}

    fn did_subtitle_change(&self, _span: &SpanInfo) {}

    fn did_audio_change(&self, _span: &SpanInfo) {}

    fn did_enter_error(&self, _span: &SpanInfo, _error: Option<&ErrorPayload>) {}

    fn did_fail_play_attempt(
        &self,
        _span: &SpanInfo,
        _reason: StartFailureReason,
        _error: Option<&ErrorPayload>,
    ) {
    }

    /// Time spent playing since the previous tick or the Playing entry.
    fn heartbeat_fired(&self, _span: &SpanInfo, _duration_ms: i64) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelegate;

impl SessionDelegate for NoopDelegate {}
