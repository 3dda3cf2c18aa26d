use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::models::{ErrorPayload, StartFailureReason};
use crate::state::{PlaybackState, SessionDelegate, SpanInfo};

use super::types::{SessionMetricsSnapshot, SessionSample};

const ENABLE_LOGS: bool = false;

use crate::log_debug;

const MAX_RECENT_SAMPLES: usize = 20;

/// Session delegate that folds hook callbacks into playback metrics.
///
/// Clones share the same state, so one clone can be handed to the collector
/// while the host keeps another for reading snapshots. A new impression id
/// starts a fresh set of metrics.
#[derive(Clone, Default)]
pub struct SessionRecorder {
    inner: Arc<Mutex<RecorderState>>,
}

#[derive(Default)]
struct RecorderState {
    snapshot: SessionMetricsSnapshot,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn snapshot(&self) -> SessionMetricsSnapshot {
        self.state().snapshot.clone()
    }

    pub fn reset(&self) {
        self.state().snapshot = SessionMetricsSnapshot::default();
    }

    fn record(
        &self,
        span: &SpanInfo,
        duration_ms: i64,
        update: impl FnOnce(&mut SessionMetricsSnapshot),
    ) {
        self.record_sample(span, duration_ms, None, None, update);
    }

    fn record_sample(
        &self,
        span: &SpanInfo,
        duration_ms: i64,
        start_failure: Option<StartFailureReason>,
        error_code: Option<i64>,
        update: impl FnOnce(&mut SessionMetricsSnapshot),
    ) {
        let mut state = self.state();
        let snapshot = &mut state.snapshot;

        if snapshot.impression_id != Some(span.impression_id) {
            *snapshot = SessionMetricsSnapshot {
                impression_id: Some(span.impression_id),
                ..SessionMetricsSnapshot::default()
            };
        }

        update(snapshot);

        snapshot.recent_samples.push(SessionSample {
            timestamp: DateTime::<Utc>::from_timestamp_millis(span.timestamp_ms).unwrap_or_default(),
            impression_id: span.impression_id,
            state: span.state,
            duration_ms,
            video_time_start: span.video_time_start,
            video_time_end: span.video_time_end,
            start_failure,
            error_code,
        });

        if snapshot.recent_samples.len() > MAX_RECENT_SAMPLES {
            snapshot.recent_samples.remove(0);
        }

        log_debug!("[{}] recorded {} ({}ms)", span.impression_id, span.state, duration_ms);
    }
}

impl SessionDelegate for SessionRecorder {
    fn did_startup(&self, span: &SpanInfo, startup_ms: i64) {
        self.record(span, startup_ms, |snapshot| {
            snapshot.startup_time_ms = Some(startup_ms);
        });
    }

    fn did_exit_buffering(&self, span: &SpanInfo, duration_ms: i64) {
        self.record(span, duration_ms, |snapshot| {
            snapshot.buffered_ms += duration_ms;
            if snapshot.startup_time_ms.is_some() {
                snapshot.rebuffer_count += 1;
            }
        });
    }

    fn did_exit_playing(&self, span: &SpanInfo, duration_ms: i64) {
        self.record(span, duration_ms, |snapshot| snapshot.played_ms += duration_ms);
    }

    fn did_exit_pause(&self, span: &SpanInfo, duration_ms: i64) {
        self.record(span, duration_ms, |snapshot| snapshot.paused_ms += duration_ms);
    }

    fn did_exit_seeking(&self, span: &SpanInfo, duration_ms: i64, _destination: PlaybackState) {
        self.record(span, duration_ms, |snapshot| {
            snapshot.seek_ms += duration_ms;
            snapshot.seek_count += 1;
        });
    }

    fn did_quality_change(&self, span: &SpanInfo) {
        self.record(span, 0, |snapshot| snapshot.quality_change_count += 1);
    }

    fn did_subtitle_change(&self, span: &SpanInfo) {
        self.record(span, 0, |snapshot| snapshot.subtitle_change_count += 1);
    }

    fn did_audio_change(&self, span: &SpanInfo) {
        self.record(span, 0, |snapshot| snapshot.audio_change_count += 1);
    }

    fn did_enter_error(&self, span: &SpanInfo, error: Option<&ErrorPayload>) {
        let code = error.map(|error| error.code);
        self.record_sample(span, 0, None, code, |snapshot| snapshot.error_count += 1);
    }

    fn did_fail_play_attempt(
        &self,
        span: &SpanInfo,
        reason: StartFailureReason,
        error: Option<&ErrorPayload>,
    ) {
        let code = error.map(|error| error.code);
        self.record_sample(span, 0, Some(reason), code, |snapshot| {
            snapshot.start_failure = Some(reason);
        });
    }

    fn heartbeat_fired(&self, span: &SpanInfo, duration_ms: i64) {
        self.record(span, duration_ms, |snapshot| {
            snapshot.played_ms += duration_ms;
            snapshot.heartbeat_count += 1;
        });
    }
}
