use std::sync::Arc;

use crate::clock::{secs_to_millis, MediaTime};
use crate::metrics::{BitrateChange, BitrateSample, BitrateSampler, DownloadSpeedMeter, SpeedMeasurement};
use crate::models::{resolve_is_live, AccessLogEntry, ErrorPayload, EventData, PlayerKind, StartFailureReason, StreamType};
use crate::settings::CollectorConfig;
use crate::state::{PlaybackState, PlaybackStateMachine};
use crate::timer::{cancel_slot, slot_matches, Alarm, Scheduler, TimerFired, TimerKind};
use crate::tracking::{QualityChangeCounter, SeekCorrelator, VideoStartWatchdog};

use super::{AdapterContext, PlayerAdapter, SignalSink};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Unknown,
    ReadyToPlay,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeControlStatus {
    Paused,
    WaitingToPlay,
    Playing,
}

/// Property observations and notifications of a player that reports
/// neither seeks nor quality changes directly.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    RateChanged(f64),
    CurrentItemChanged,
    PlayerFailed(Option<ErrorPayload>),
    ItemStatusChanged(ItemStatus),
    TimeControlStatusChanged(TimeControlStatus),
    TimeJumped,
    PlaybackStalled,
    FailedToPlayToEnd(Option<ErrorPayload>),
    AccessLogEntryAdded,
}

pub trait NativePlayer: Send + 'static {
    fn subscribe(&mut self, sink: SignalSink<NativeEvent>);

    fn unsubscribe(&mut self);

    /// Current position in seconds.
    fn current_time(&self) -> f64;

    fn rate(&self) -> f64;

    /// Duration of the current item in seconds, `None` while not numeric.
    /// Infinite for live items.
    fn item_duration(&self) -> Option<f64>;

    fn volume(&self) -> f32;

    fn is_external_playback_active(&self) -> bool;

    fn asset_url(&self) -> Option<String>;

    fn presentation_size(&self) -> Option<(u32, u32)>;

    fn audio_bitrate(&self) -> Option<f64>;

    fn access_log(&self) -> Vec<AccessLogEntry>;

    fn item_error(&self) -> Option<ErrorPayload>;

    fn version(&self) -> Option<String>;
}

/// Adapter for a [`NativePlayer`].
///
/// Seeks are inferred from time jumps confirmed by the next ready status,
/// and quality changes from polling the access log.
pub struct NativePlayerAdapter<P: NativePlayer> {
    player: P,
    scheduler: Arc<dyn Scheduler>,
    config: Arc<CollectorConfig>,
    machine: PlaybackStateMachine,
    watchdog: VideoStartWatchdog,
    seeks: SeekCorrelator,
    bitrate: BitrateSampler,
    quality_changes: QualityChangeCounter,
    download_speed: DownloadSpeedMeter,
    bitrate_poll: Option<Alarm>,
    measured_log_entries: usize,
    is_player_ready: bool,
    destroyed: bool,
}

impl<P: NativePlayer> NativePlayerAdapter<P> {
    pub fn new(mut player: P, context: AdapterContext, signals: SignalSink<NativeEvent>) -> Self {
        player.subscribe(signals);
        let mut adapter = Self {
            player,
            machine: context.state_machine(),
            watchdog: context.watchdog(),
            seeks: context.seek_correlator(),
            bitrate: BitrateSampler::new(),
            quality_changes: context.quality_change_counter(),
            download_speed: DownloadSpeedMeter::new(),
            scheduler: Arc::clone(&context.scheduler),
            config: Arc::clone(&context.config),
            bitrate_poll: None,
            measured_log_entries: 0,
            is_player_ready: false,
            destroyed: false,
        };
        adapter.start_bitrate_poll();
        adapter
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    fn start_bitrate_poll(&mut self) {
        self.bitrate_poll = Some(self.scheduler.schedule_repeating(
            TimerKind::BitratePoll,
            self.config.bitrate_poll_interval(),
        ));
    }

    fn position(&self) -> Option<MediaTime> {
        MediaTime::from_secs(self.player.current_time())
    }

    fn transition(&mut self, destination: PlaybackState) -> bool {
        let position = self.position();
        self.machine.transition(destination, position)
    }

    fn transition_by_rate(&mut self, rate: f64) {
        if rate == 0.0 {
            self.transition(PlaybackState::Paused);
        } else if rate > 0.0 {
            self.transition(PlaybackState::Playing);
        }
    }

    fn is_seeking(&self) -> bool {
        self.machine.state() == PlaybackState::Seeking
            || self.seeks.is_pending(self.machine.now_ms())
    }

    fn is_stalling(&self) -> bool {
        self.machine.state() == PlaybackState::Buffering
    }

    fn can_report_quality_change(&self) -> bool {
        self.machine.did_start_playing_video()
            && self.machine.first_ready_timestamp().is_some()
            && !self.is_seeking()
            && !self.is_stalling()
            && matches!(
                self.machine.state(),
                PlaybackState::Playing | PlaybackState::Paused
            )
    }

    fn on_item_ready(&mut self) {
        self.is_player_ready = true;
        let position = self.position();
        if self.machine.confirm_seek(&mut self.seeks, position) {
            log_debug!("[{}] seek confirmed", self.machine.impression_id());
        }
        let rate = self.player.rate();
        self.transition_by_rate(rate);
    }

    fn on_time_control_status(&mut self, status: TimeControlStatus) {
        if self.machine.did_start_playing_video() {
            return;
        }
        match status {
            TimeControlStatus::WaitingToPlay => {
                self.watchdog.on_play_requested(&mut self.machine);
            }
            TimeControlStatus::Playing => {
                if self.watchdog.on_playing(&mut self.machine) {
                    log_info!("[{}] first play-through", self.machine.impression_id());
                }
            }
            TimeControlStatus::Paused => {}
        }
    }

    fn on_time_jumped(&mut self) {
        let now = self.machine.now_ms();
        let position = self.position();
        let first_ready_known = self.machine.first_ready_timestamp().is_some();
        if self.seeks.on_time_jump(now, position, first_ready_known) {
            log_debug!("seek candidate at {:?}", position);
        }
    }

    fn on_error(&mut self, error: Option<ErrorPayload>) {
        let error = error
            .or_else(|| self.player.item_error())
            .unwrap_or_default();
        log_warn!(
            "[{}] player error {}: {}",
            self.machine.impression_id(),
            error.code,
            error.message
        );
        let position = self.position();
        if self.machine.did_start_playing_video() {
            self.machine
                .transition_with(PlaybackState::Error, position, Some(&error));
        } else {
            self.watchdog.disarm();
            self.machine.on_play_attempt_failed(
                StartFailureReason::PlayerError,
                position,
                Some(&error),
            );
        }
    }

    /// A new entry means every entry before it is complete.
    fn on_access_log_entry_added(&mut self) {
        let entries = self.player.access_log();
        let completed = entries.len().saturating_sub(1);
        if completed <= self.measured_log_entries {
            self.measured_log_entries = self.measured_log_entries.min(completed);
            return;
        }
        for entry in &entries[self.measured_log_entries..completed] {
            if let Some(measurement) = SpeedMeasurement::from_access_log(entry) {
                self.download_speed.add(measurement);
            }
        }
        self.measured_log_entries = completed;
    }

    /// Compares the bitrate of the entry being watched with the last-known
    /// one and reports a change as a round trip through `QualityChange`.
    ///
    /// A change that cannot be reported yet is left uncommitted so a later
    /// poll picks it up.
    fn poll_bitrate(&mut self) {
        let entries = self.player.access_log();
        let Some(sample) = BitrateSampler::latest_watched_entry(&entries)
            .and_then(|entry| BitrateSample::new(entry.indicated_bitrate))
        else {
            return;
        };

        match self.bitrate.peek(sample) {
            BitrateChange::Unchanged => {}
            BitrateChange::Initial(_) => self.bitrate.commit(sample),
            BitrateChange::Changed { previous, current } => {
                if !self.can_report_quality_change() || !self.quality_changes.is_enabled() {
                    return;
                }
                log_debug!("bitrate changed {previous} -> {current}");
                self.bitrate.commit(sample);
                self.quality_changes.increase();
                let previous_state = self.machine.state();
                self.transition(PlaybackState::QualityChange);
                self.transition(previous_state);
            }
        }
    }

    fn reset_item_state(&mut self) {
        self.seeks.reset();
        self.bitrate.reset();
        self.measured_log_entries = 0;
        self.is_player_ready = false;
    }
}

impl<P: NativePlayer> PlayerAdapter for NativePlayerAdapter<P> {
    type Signal = NativeEvent;

    fn kind(&self) -> PlayerKind {
        PlayerKind::Native
    }

    fn handle_signal(&mut self, signal: NativeEvent) {
        if self.destroyed {
            return;
        }
        match signal {
            NativeEvent::RateChanged(rate) => {
                if self.machine.first_ready_timestamp().is_some() {
                    self.transition_by_rate(rate);
                }
            }
            NativeEvent::CurrentItemChanged => self.reset_item_state(),
            NativeEvent::PlayerFailed(error) | NativeEvent::FailedToPlayToEnd(error) => {
                self.on_error(error)
            }
            NativeEvent::ItemStatusChanged(ItemStatus::ReadyToPlay) => self.on_item_ready(),
            NativeEvent::ItemStatusChanged(ItemStatus::Failed) => self.on_error(None),
            NativeEvent::ItemStatusChanged(ItemStatus::Unknown) => {}
            NativeEvent::TimeControlStatusChanged(status) => self.on_time_control_status(status),
            NativeEvent::TimeJumped => self.on_time_jumped(),
            NativeEvent::PlaybackStalled => {
                self.transition(PlaybackState::Buffering);
            }
            NativeEvent::AccessLogEntryAdded => self.on_access_log_entry_added(),
        }
    }

    fn handle_timer(&mut self, fired: TimerFired) {
        if self.destroyed {
            return;
        }
        match fired.kind {
            TimerKind::Heartbeat => {
                self.machine.handle_heartbeat(&fired);
            }
            TimerKind::VideoStartTimeout => {
                let position = self.position();
                self.watchdog.on_timeout(&fired, &mut self.machine, position);
            }
            TimerKind::BitratePoll => {
                if slot_matches(&self.bitrate_poll, &fired) {
                    self.poll_bitrate();
                }
            }
            TimerKind::QualityChangeReset => {
                self.quality_changes.handle_timer(&fired);
            }
        }
    }

    fn on_background(&mut self) {
        self.watchdog.suspend();
    }

    fn on_foreground(&mut self) {
        if !self.destroyed {
            self.watchdog.resume(&self.machine);
        }
    }

    fn create_event_data(&mut self) -> EventData {
        let mut data = EventData::new(&self.config, self.machine.impression_id(), self.kind());
        data.state = self.machine.state();
        data.version = self
            .player
            .version()
            .map(|version| format!("{}-{version}", self.kind().as_str()));
        data.is_casting = self.player.is_external_playback_active();
        data.is_muted = self.player.volume() == 0.0;

        let duration = self.player.item_duration();
        data.video_duration_ms = duration.and_then(secs_to_millis);
        data.is_live = resolve_is_live(
            self.is_player_ready && duration.is_some(),
            self.config.live_default(),
            duration.is_some_and(f64::is_infinite),
        );

        if let Some(url) = self.player.asset_url() {
            if let Some(format) = StreamType::from_url(&url) {
                data.set_stream(format, url);
            }
        }

        data.audio_bitrate = self.player.audio_bitrate();
        data.video_bitrate = self.bitrate.last_known();
        if let Some((width, height)) = self.player.presentation_size() {
            data.video_playback_width = Some(width);
            data.video_playback_height = Some(height);
        }

        data.startup_time_ms = self.machine.startup_time_ms();
        data.video_time_start = self.machine.video_time_start();
        data.video_time_end = self.machine.video_time_end();
        data.download_speed = self.download_speed.get_info();
        data.set_start_failure(self.machine.take_start_failure());
        data
    }

    fn reset_source_state(&mut self) {
        self.watchdog.disarm();
        self.machine.reset();
        self.quality_changes.reset();
        self.download_speed.reset();
        self.reset_item_state();
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.player.unsubscribe();
        cancel_slot(&mut self.bitrate_poll);

        if self.machine.is_waiting_for_first_play() {
            let position = self.position();
            self.machine
                .on_play_attempt_failed(StartFailureReason::PageClosed, position, None);
        }

        self.watchdog.disarm();
        self.quality_changes.reset();
        self.machine.destroy();
        self.is_player_ready = false;
        log_info!("[{}] native adapter destroyed", self.machine.impression_id());
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn state_machine(&self) -> &PlaybackStateMachine {
        &self.machine
    }
}
