use std::sync::Arc;
use std::time::Duration;

use crate::clock::MediaTime;
use crate::models::StartFailureReason;
use crate::state::PlaybackStateMachine;
use crate::timer::{cancel_slot, slot_matches, Alarm, Scheduler, TimerFired, TimerKind};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Races the first play-through against the video start timeout.
pub struct VideoStartWatchdog {
    scheduler: Arc<dyn Scheduler>,
    timeout: Duration,
    alarm: Option<Alarm>,
    suspended: bool,
}

impl VideoStartWatchdog {
    pub fn new(scheduler: Arc<dyn Scheduler>, timeout: Duration) -> Self {
        Self {
            scheduler,
            timeout,
            alarm: None,
            suspended: false,
        }
    }

    /// Schedules the timeout, replacing any live one.
    pub fn arm(&mut self) {
        self.suspended = false;
        self.alarm = Some(
            self.scheduler
                .schedule_once(TimerKind::VideoStartTimeout, self.timeout),
        );
        log_debug!("video start watchdog armed for {:?}", self.timeout);
    }

    pub fn disarm(&mut self) -> bool {
        self.suspended = false;
        cancel_slot(&mut self.alarm)
    }

    pub fn is_armed(&self) -> bool {
        self.alarm.as_ref().is_some_and(|alarm| !alarm.is_cancelled())
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Consumes a firing of the live alarm. Stale firings return `false`.
    pub fn fire(&mut self, fired: &TimerFired) -> bool {
        if !slot_matches(&self.alarm, fired) {
            return false;
        }
        self.alarm = None;
        true
    }

    /// Cancels a live timeout but remembers that it has to come back.
    pub fn suspend(&mut self) {
        if cancel_slot(&mut self.alarm) {
            self.suspended = true;
            log_debug!("video start watchdog suspended");
        }
    }

    /// Re-arms a suspended timeout if the session still waits for its
    /// first play-through.
    pub fn resume(&mut self, machine: &PlaybackStateMachine) -> bool {
        if self.suspended && machine.is_waiting_for_first_play() {
            self.arm();
            return true;
        }
        self.suspended = false;
        false
    }

    /// A play request: marks the attempt and arms unless something has
    /// already played.
    pub fn on_play_requested(&mut self, machine: &mut PlaybackStateMachine) {
        machine.mark_play_attempted();
        if !machine.did_start_playing_video() {
            self.arm();
        }
    }

    /// A genuine "now playing" signal. Returns whether it was the first one.
    pub fn on_playing(&mut self, machine: &mut PlaybackStateMachine) -> bool {
        self.disarm();
        let first = !machine.did_start_playing_video();
        machine.mark_started_playing();
        first
    }

    /// Handles a timeout firing: records `Timeout` and enters
    /// `PlayAttemptFailed` if nothing has played yet.
    pub fn on_timeout(
        &mut self,
        fired: &TimerFired,
        machine: &mut PlaybackStateMachine,
        media_time: Option<MediaTime>,
    ) -> bool {
        if !self.fire(fired) || machine.did_start_playing_video() {
            return false;
        }
        machine.on_play_attempt_failed(StartFailureReason::Timeout, media_time, None);
        true
    }
}
