use std::sync::{Arc, Mutex};

use crate::clock::MediaTime;
use crate::models::{ErrorPayload, StartFailureReason};

use super::{PlaybackState, SessionDelegate, SpanInfo};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Hook {
    ExitSetup,
    Startup(i64),
    ExitBuffering(i64),
    ExitPlaying(i64),
    ExitPause(i64),
    ExitSeeking {
        duration_ms: i64,
        destination: PlaybackState,
        video_time_start: Option<MediaTime>,
    },
    QualityChange,
    SubtitleChange,
    AudioChange,
    Error(Option<ErrorPayload>),
    PlayAttemptFailed(StartFailureReason),
    Heartbeat(i64),
}

/// Delegate that records every hook, shared between clones.
#[derive(Debug, Clone, Default)]
pub(crate) struct HookLog {
    hooks: Arc<Mutex<Vec<Hook>>>,
}

impl HookLog {
    pub(crate) fn hooks(&self) -> Vec<Hook> {
        self.hooks.lock().unwrap().clone()
    }

    pub(crate) fn take(&self) -> Vec<Hook> {
        std::mem::take(&mut *self.hooks.lock().unwrap())
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Hook) -> bool) -> usize {
        self.hooks.lock().unwrap().iter().filter(|hook| predicate(hook)).count()
    }

    fn push(&self, hook: Hook) {
        self.hooks.lock().unwrap().push(hook);
    }
}

impl SessionDelegate for HookLog {
    fn did_exit_setup(&self, _span: &SpanInfo) {
        self.push(Hook::ExitSetup);
    }

    fn did_startup(&self, _span: &SpanInfo, startup_ms: i64) {
        self.push(Hook::Startup(startup_ms));
    }

    fn did_exit_buffering(&self, _span: &SpanInfo, duration_ms: i64) {
        self.push(Hook::ExitBuffering(duration_ms));
    }

    fn did_exit_playing(&self, _span: &SpanInfo, duration_ms: i64) {
        self.push(Hook::ExitPlaying(duration_ms));
    }

    fn did_exit_pause(&self, _span: &SpanInfo, duration_ms: i64) {
        self.push(Hook::ExitPause(duration_ms));
    }

    fn did_exit_seeking(&self, span: &SpanInfo, duration_ms: i64, destination: PlaybackState) {
        self.push(Hook::ExitSeeking {
            duration_ms,
            destination,
            video_time_start: span.video_time_start,
        });
    }

    fn did_quality_change(&self, _span: &SpanInfo) {
        self.push(Hook::QualityChange);
    }

    fn did_subtitle_change(&self, _span: &SpanInfo) {
        self.push(Hook::SubtitleChange);
    }

    fn did_audio_change(&self, _span: &SpanInfo) {
        self.push(Hook::AudioChange);
    }

    fn did_enter_error(&self, _span: &SpanInfo, error: Option<&ErrorPayload>) {
        self.push(Hook::Error(error.cloned()));
    }

    fn did_fail_play_attempt(
        &self,
        _span: &SpanInfo,
        reason: StartFailureReason,
        _error: Option<&ErrorPayload>,
    ) {
        self.push(Hook::PlayAttemptFailed(reason));
    }

    fn heartbeat_fired(&self, _span: &SpanInfo, duration_ms: i64) {
        self.push(Hook::Heartbeat(duration_ms));
    }
}
