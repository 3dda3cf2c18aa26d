use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::clock::{Clock, MediaTime};
use crate::models::{ErrorPayload, StartFailureReason};
use crate::timer::{cancel_slot, slot_matches, Alarm, Scheduler, TimerFired, TimerKind};
use crate::tracking::SeekCorrelator;

use super::{PlaybackState, SessionDelegate, SpanInfo};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Canonical playback state of one impression.
///
/// Every transition closes the current span, reports it through the
/// [`SessionDelegate`], and opens a new one. Owned by a single adapter, so
/// nothing in here is locked.
pub struct PlaybackStateMachine {
    state: PlaybackState,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    delegate: Arc<dyn SessionDelegate>,
    heartbeat_interval: Duration,
    heartbeat: Option<Alarm>,
    impression_id: Uuid,
    initial_timestamp: i64,
    enter_timestamp: i64,
    first_ready_timestamp: Option<i64>,
    video_time_start: Option<MediaTime>,
    video_time_end: Option<MediaTime>,
    did_start_playing_video: bool,
    did_attempt_playing_video: bool,
    did_fail_to_start: bool,
    start_failure: Option<StartFailureReason>,
}

impl PlaybackStateMachine {
    pub fn new(
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
        delegate: Arc<dyn SessionDelegate>,
        heartbeat_interval: Duration,
    ) -> Self {
        let now = clock.now_ms();
        Self {
            state: PlaybackState::Setup,
            clock,
            scheduler,
            delegate,
            heartbeat_interval,
            heartbeat: None,
            impression_id: Uuid::new_v4(),
            initial_timestamp: now,
            enter_timestamp: now,
            first_ready_timestamp: None,
            video_time_start: None,
            video_time_end: None,
            did_start_playing_video: false,
            did_attempt_playing_video: false,
            did_fail_to_start: false,
            start_failure: None,
        }
    }

    pub fn transition(&mut self, destination: PlaybackState, media_time: Option<MediaTime>) -> bool {
        self.transition_with(destination, media_time, None)
    }

    /// Moves to `destination`, running the exit hook of the current state and
    /// the entry hook of the new one.
    ///
    /// Returns `false` without touching anything when already in
    /// `destination`.
    pub fn transition_with(
        &mut self,
        destination: PlaybackState,
        media_time: Option<MediaTime>,
        error: Option<&ErrorPayload>,
    ) -> bool {
        if destination == self.state {
            return false;
        }

        let now = self.clock.now_ms();
        let duration_ms = (now - self.enter_timestamp).max(0);
        self.video_time_end = media_time;
        self.run_exit_hook(now, duration_ms, destination);

        log_debug!(
            "[{}] {} -> {} after {}ms",
            self.impression_id,
            self.state,
            destination,
            duration_ms
        );

        self.state = destination;
        self.enter_timestamp = now;
        self.video_time_start = self.video_time_end;
        self.run_entry_hook(now, error);
        true
    }

    /// Turns a pending seek candidate into a `Seeking` span that started at
    /// the candidate rather than now.
    ///
    /// The span being left ends at the candidate. Back-dating stops at the
    /// start of that span, so one that began after the candidate closes with
    /// zero length. Returns whether a seek was confirmed.
    pub fn confirm_seek(&mut self, seeks: &mut SeekCorrelator, media_time: Option<MediaTime>) -> bool {
        let now = self.clock.now_ms();
        let Some(window) = seeks.take_confirmable(now) else {
            return false;
        };
        if self.state == PlaybackState::Seeking {
            return false;
        }

        let seek_start = window.started_at_ms.max(self.enter_timestamp);
        let duration_ms = seek_start - self.enter_timestamp;
        self.video_time_end = window.media_position;
        self.run_exit_hook(seek_start, duration_ms, PlaybackState::Seeking);

        log_debug!(
            "[{}] {} -> seeking confirmed, back-dated {}ms",
            self.impression_id,
            self.state,
            now - seek_start
        );

        self.state = PlaybackState::Seeking;
        self.enter_timestamp = seek_start;
        self.video_time_start = window.media_position;
        self.video_time_end = media_time;
        self.run_entry_hook(seek_start, None);
        true
    }

    /// Records `reason` as the pending start failure and enters
    /// `PlayAttemptFailed`.
    pub fn on_play_attempt_failed(
        &mut self,
        reason: StartFailureReason,
        media_time: Option<MediaTime>,
        error: Option<&ErrorPayload>,
    ) {
        log_info!("[{}] play attempt failed: {}", self.impression_id, reason.as_str());
        self.start_failure = Some(reason);
        self.did_fail_to_start = true;
        self.transition_with(PlaybackState::PlayAttemptFailed, media_time, error);
    }

    /// Reads and clears the pending start failure.
    pub fn take_start_failure(&mut self) -> Option<StartFailureReason> {
        self.start_failure.take()
    }

    pub fn pending_start_failure(&self) -> Option<StartFailureReason> {
        self.start_failure
    }

    /// Starts a new impression. No hooks run.
    pub fn reset(&mut self) {
        self.disable_heartbeat();
        let now = self.clock.now_ms();
        self.impression_id = Uuid::new_v4();
        self.initial_timestamp = now;
        self.enter_timestamp = now;
        self.state = PlaybackState::Setup;
        self.first_ready_timestamp = None;
        self.video_time_start = None;
        self.video_time_end = None;
        self.did_start_playing_video = false;
        self.did_attempt_playing_video = false;
        self.did_fail_to_start = false;
        self.start_failure = None;
        log_info!("[{}] session reset", self.impression_id);
    }

    /// Reports the time played since the last rebase and rebases.
    ///
    /// Ignores firings of cancelled heartbeats and firings outside `Playing`.
    pub fn handle_heartbeat(&mut self, fired: &TimerFired) -> bool {
        if !slot_matches(&self.heartbeat, fired) || self.state != PlaybackState::Playing {
            return false;
        }
        let now = self.clock.now_ms();
        let duration_ms = (now - self.enter_timestamp).max(0);
        let span = self.span(self.state, now);
        self.delegate.heartbeat_fired(&span, duration_ms);
        self.enter_timestamp = now;
        true
    }

    pub fn enable_heartbeat(&mut self) {
        self.heartbeat = Some(
            self.scheduler
                .schedule_repeating(TimerKind::Heartbeat, self.heartbeat_interval),
        );
    }

    pub fn disable_heartbeat(&mut self) {
        cancel_slot(&mut self.heartbeat);
    }

    pub fn is_heartbeat_active(&self) -> bool {
        self.heartbeat.as_ref().is_some_and(|alarm| !alarm.is_cancelled())
    }

    pub fn mark_play_attempted(&mut self) {
        self.did_attempt_playing_video = true;
    }

    pub fn mark_started_playing(&mut self) {
        self.did_start_playing_video = true;
    }

    /// Play was requested, nothing has played yet and no start failure has
    /// been recorded for the impression.
    pub fn is_waiting_for_first_play(&self) -> bool {
        self.did_attempt_playing_video && !self.did_start_playing_video && !self.did_fail_to_start
    }

    pub fn did_fail_to_start(&self) -> bool {
        self.did_fail_to_start
    }

    pub fn destroy(&mut self) {
        self.disable_heartbeat();
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn impression_id(&self) -> Uuid {
        self.impression_id
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn initial_timestamp(&self) -> i64 {
        self.initial_timestamp
    }

    pub fn enter_timestamp(&self) -> i64 {
        self.enter_timestamp
    }

    pub fn first_ready_timestamp(&self) -> Option<i64> {
        self.first_ready_timestamp
    }

    pub fn startup_time_ms(&self) -> Option<i64> {
        self.first_ready_timestamp
            .map(|ready| (ready - self.initial_timestamp).max(0))
    }

    pub fn video_time_start(&self) -> Option<MediaTime> {
        self.video_time_start
    }

    pub fn video_time_end(&self) -> Option<MediaTime> {
        self.video_time_end
    }

    pub fn did_start_playing_video(&self) -> bool {
        self.did_start_playing_video
    }

    pub fn did_attempt_playing_video(&self) -> bool {
        self.did_attempt_playing_video
    }

    fn span(&self, state: PlaybackState, timestamp_ms: i64) -> SpanInfo {
        SpanInfo {
            impression_id: self.impression_id,
            state,
            video_time_start: self.video_time_start,
            video_time_end: self.video_time_end,
            timestamp_ms,
        }
    }

    fn run_exit_hook(&mut self, now: i64, duration_ms: i64, destination: PlaybackState) {
        let span = self.span(self.state, now);
        let delegate = Arc::clone(&self.delegate);
        match self.state {
            PlaybackState::Setup => delegate.did_exit_setup(&span),
            PlaybackState::Buffering => delegate.did_exit_buffering(&span, duration_ms),
            PlaybackState::Playing => {
                self.disable_heartbeat();
                delegate.did_exit_playing(&span, duration_ms);
            }
            PlaybackState::Paused => delegate.did_exit_pause(&span, duration_ms),
            PlaybackState::Seeking => delegate.did_exit_seeking(&span, duration_ms, destination),
            PlaybackState::QualityChange => delegate.did_quality_change(&span),
            PlaybackState::SubtitleChange => delegate.did_subtitle_change(&span),
            PlaybackState::AudioChange => delegate.did_audio_change(&span),
            PlaybackState::Error
            | PlaybackState::Ad
            | PlaybackState::AdFinished
            | PlaybackState::PlayAttemptFailed => {}
        }
    }

    fn run_entry_hook(&mut self, now: i64, error: Option<&ErrorPayload>) {
        let span = self.span(self.state, now);
        let delegate = Arc::clone(&self.delegate);
        match self.state {
            PlaybackState::Error => delegate.did_enter_error(&span, error),
            PlaybackState::PlayAttemptFailed => {
                let reason = self.start_failure.unwrap_or(StartFailureReason::Unknown);
                delegate.did_fail_play_attempt(&span, reason, error);
            }
            PlaybackState::Playing | PlaybackState::Paused => {
                if self.first_ready_timestamp.is_none() {
                    self.first_ready_timestamp = Some(now);
                    let startup_ms = (now - self.initial_timestamp).max(0);
                    log_info!("[{}] startup took {}ms", self.impression_id, startup_ms);
                    delegate.did_startup(&span, startup_ms);
                }
                if self.state == PlaybackState::Playing {
                    self.enable_heartbeat();
                }
            }
            _ => {}
        }
    }
}
