use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::{secs_to_millis, MediaTime};
use crate::metrics::{BitrateSampler, DownloadSpeedMeter, SpeedMeasurement};
use crate::models::{DrmType, ErrorPayload, EventData, PlayerKind, StartFailureReason, StreamType, VideoQuality};
use crate::settings::CollectorConfig;
use crate::state::{PlaybackState, PlaybackStateMachine};
use crate::timer::{TimerFired, TimerKind};
use crate::tracking::{QualityChangeCounter, VideoStartWatchdog};

use super::{Ad, AdBreak, AdEventListener, AdapterContext, PlayerAdapter, SignalSink};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

const SUBTITLES_OFF: &str = "off";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescription {
    pub url: String,
    pub stream_type: Option<StreamType>,
    pub drm: Option<DrmType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleTrack {
    pub id: String,
    pub language: Option<String>,
    pub label: Option<String>,
}

impl SubtitleTrack {
    pub fn is_enabled(&self) -> bool {
        self.id != SUBTITLES_OFF
    }
}

/// What a finished download was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    MediaSegment,
    Manifest,
    DrmCertificate,
    DrmLicense,
    Other,
}

/// Signals of a player that reports its lifecycle explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkEvent {
    Ready,
    Play,
    Playing,
    Paused,
    Seek,
    Seeked,
    StallStarted,
    StallEnded,
    PlaybackFinished,
    PlayerError(ErrorPayload),
    SourceError(ErrorPayload),
    VideoDownloadQualityChanged {
        old: Option<VideoQuality>,
        new: Option<VideoQuality>,
    },
    AudioChanged,
    SubtitleChanged,
    SourceUnload,
    SourceUnloaded,
    AdBreakStarted(AdBreak),
    AdBreakFinished(AdBreak),
    AdStarted(Ad),
    AdFinished(Ad),
    DownloadFinished {
        kind: DownloadKind,
        size_bytes: i64,
        download_time_ms: Option<i64>,
    },
}

/// Property reads and subscription of an explicit-event player.
pub trait SdkPlayer: Send + 'static {
    fn subscribe(&mut self, sink: SignalSink<SdkEvent>);

    fn unsubscribe(&mut self);

    /// Current position in seconds.
    fn current_time(&self) -> f64;

    /// Source duration in seconds; `0` while unknown, infinite for live.
    fn duration(&self) -> f64;

    fn is_paused(&self) -> bool;

    fn is_muted(&self) -> bool;

    fn is_casting(&self) -> bool;

    fn video_quality(&self) -> Option<VideoQuality>;

    fn source(&self) -> Option<SourceDescription>;

    fn subtitle(&self) -> Option<SubtitleTrack>;

    fn audio_language(&self) -> Option<String>;

    fn version(&self) -> Option<String>;
}

pub struct SdkPlayerAdapter<P: SdkPlayer> {
    player: P,
    config: Arc<CollectorConfig>,
    machine: PlaybackStateMachine,
    watchdog: VideoStartWatchdog,
    quality_changes: QualityChangeCounter,
    download_speed: DownloadSpeedMeter,
    ads: Option<Arc<dyn AdEventListener>>,
    is_player_ready: bool,
    is_stalling: bool,
    is_seeking: bool,
    drm_certificate_time_ms: Option<i64>,
    drm_load_time_ms: Option<i64>,
    destroyed: bool,
}

impl<P: SdkPlayer> SdkPlayerAdapter<P> {
    pub fn new(mut player: P, context: AdapterContext, signals: SignalSink<SdkEvent>) -> Self {
        player.subscribe(signals);
        Self {
            player,
            machine: context.state_machine(),
            watchdog: context.watchdog(),
            quality_changes: context.quality_change_counter(),
            download_speed: DownloadSpeedMeter::new(),
            config: context.config,
            ads: None,
            is_player_ready: false,
            is_stalling: false,
            is_seeking: false,
            drm_certificate_time_ms: None,
            drm_load_time_ms: None,
            destroyed: false,
        }
    }

    pub fn with_ad_listener(mut self, listener: Arc<dyn AdEventListener>) -> Self {
        self.ads = Some(listener);
        self
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    fn position(&self) -> Option<MediaTime> {
        MediaTime::from_secs(self.player.current_time())
    }

    fn transition(&mut self, destination: PlaybackState) -> bool {
        let position = self.position();
        self.machine.transition(destination, position)
    }

    /// Settles into Buffering, Paused or Playing after a transient state.
    fn transition_to_steady(&mut self) {
        if !self.machine.did_start_playing_video() {
            return;
        }
        let destination = if self.is_stalling {
            PlaybackState::Buffering
        } else if self.player.is_paused() {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        };
        self.transition(destination);
    }

    fn can_report_change(&self) -> bool {
        self.is_player_ready
            && !self.is_stalling
            && !self.is_seeking
            && self.machine.did_start_playing_video()
            && self.machine.first_ready_timestamp().is_some()
    }

    fn on_play(&mut self) {
        self.watchdog.on_play_requested(&mut self.machine);
        let state = self.machine.state();
        if self.is_stalling && state != PlaybackState::Seeking && state != PlaybackState::Buffering {
            self.transition(PlaybackState::Buffering);
        }
    }

    fn on_playing(&mut self) {
        if self.is_seeking || self.is_stalling {
            return;
        }
        if self.watchdog.on_playing(&mut self.machine) {
            log_info!("[{}] first play-through", self.machine.impression_id());
        }
        self.transition(PlaybackState::Playing);
    }

    fn on_paused(&mut self) {
        self.is_seeking = false;
        if !self.machine.did_start_playing_video() {
            self.watchdog.disarm();
        }
        self.transition(PlaybackState::Paused);
    }

    fn on_error(&mut self, error: ErrorPayload) {
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

    fn on_video_quality_changed(&mut self, old: Option<VideoQuality>, new: Option<VideoQuality>) {
        let old_bitrate = old.and_then(|quality| quality.bitrate);
        let new_bitrate = new.and_then(|quality| quality.bitrate);
        if !BitrateSampler::did_change(old_bitrate, new_bitrate) || !self.can_report_change() {
            return;
        }
        if !self.quality_changes.is_enabled() {
            log_debug!("quality change limit reached, ignoring change");
            return;
        }
        self.quality_changes.increase();
        self.transition(PlaybackState::QualityChange);
        self.transition_to_steady();
    }

    fn on_audio_changed(&mut self) {
        if !self.can_report_change() {
            return;
        }
        self.transition(PlaybackState::AudioChange);
        self.transition_to_steady();
    }

    fn on_subtitle_changed(&mut self) {
        if !self.machine.did_start_playing_video()
            || !matches!(
                self.machine.state(),
                PlaybackState::Playing | PlaybackState::Paused
            )
        {
            return;
        }
        self.transition(PlaybackState::SubtitleChange);
        self.transition_to_steady();
    }

    fn on_source_unload(&mut self) {
        if self.machine.is_waiting_for_first_play() {
            self.watchdog.disarm();
            let position = self.position();
            self.machine
                .on_play_attempt_failed(StartFailureReason::PageClosed, position, None);
        }
    }

    fn on_download_finished(&mut self, kind: DownloadKind, size_bytes: i64, download_time_ms: Option<i64>) {
        match kind {
            DownloadKind::MediaSegment => {
                if let Some(duration_ms) = download_time_ms.filter(|ms| *ms >= 0) {
                    self.download_speed.add(SpeedMeasurement {
                        size: size_bytes.max(0),
                        duration_ms,
                        segment_count: 1,
                    });
                }
            }
            DownloadKind::DrmCertificate => self.drm_certificate_time_ms = download_time_ms,
            DownloadKind::DrmLicense => {
                let certificate = self.drm_certificate_time_ms.take().unwrap_or(0);
                self.drm_load_time_ms = Some(certificate + download_time_ms.unwrap_or(0));
            }
            DownloadKind::Manifest | DownloadKind::Other => {}
        }
    }

    fn decorate_source(&self, data: &mut EventData) {
        let Some(source) = self.player.source() else {
            return;
        };

        if let Some(format) = source.stream_type.or_else(|| StreamType::from_url(&source.url)) {
            data.set_stream(format, source.url.clone());
        }

        let duration = self.player.duration();
        if duration.is_infinite() && duration > 0.0 {
            data.is_live = true;
        } else if let Some(duration_ms) = secs_to_millis(duration).filter(|ms| *ms > 0) {
            data.is_live = false;
            data.video_duration_ms = Some(duration_ms);
        }

        data.drm_type = source.drm;
    }
}

impl<P: SdkPlayer> PlayerAdapter for SdkPlayerAdapter<P> {
    type Signal = SdkEvent;

    fn kind(&self) -> PlayerKind {
        PlayerKind::Sdk
    }

    fn handle_signal(&mut self, signal: SdkEvent) {
        if self.destroyed {
            return;
        }
        match signal {
            SdkEvent::Ready => self.is_player_ready = true,
            SdkEvent::Play => self.on_play(),
            SdkEvent::Playing => self.on_playing(),
            SdkEvent::Paused => self.on_paused(),
            SdkEvent::Seek => {
                self.is_seeking = true;
                self.transition(PlaybackState::Seeking);
            }
            SdkEvent::Seeked => {
                self.is_seeking = false;
                if !self.is_stalling {
                    self.transition_to_steady();
                }
            }
            SdkEvent::StallStarted => {
                self.is_stalling = true;
                self.transition(PlaybackState::Buffering);
            }
            SdkEvent::StallEnded => {
                self.is_stalling = false;
                self.transition_to_steady();
            }
            SdkEvent::PlaybackFinished => {
                let end = MediaTime::from_secs(self.player.duration());
                self.machine.transition(PlaybackState::Paused, end);
                self.machine.disable_heartbeat();
            }
            SdkEvent::PlayerError(error) | SdkEvent::SourceError(error) => self.on_error(error),
            SdkEvent::VideoDownloadQualityChanged { old, new } => {
                self.on_video_quality_changed(old, new)
            }
            SdkEvent::AudioChanged => self.on_audio_changed(),
            SdkEvent::SubtitleChanged => self.on_subtitle_changed(),
            SdkEvent::SourceUnload => self.on_source_unload(),
            SdkEvent::SourceUnloaded => self.reset_source_state(),
            SdkEvent::AdBreakStarted(ad_break) => {
                self.transition(PlaybackState::Ad);
                if let Some(ads) = &self.ads {
                    ads.on_ad_break_started(&ad_break);
                }
            }
            SdkEvent::AdBreakFinished(ad_break) => {
                self.transition(PlaybackState::AdFinished);
                if let Some(ads) = &self.ads {
                    ads.on_ad_break_finished(&ad_break);
                }
            }
            SdkEvent::AdStarted(ad) => {
                if let Some(ads) = &self.ads {
                    ads.on_ad_started(&ad);
                }
            }
            SdkEvent::AdFinished(ad) => {
                if let Some(ads) = &self.ads {
                    ads.on_ad_finished(&ad);
                }
            }
            SdkEvent::DownloadFinished {
                kind,
                size_bytes,
                download_time_ms,
            } => self.on_download_finished(kind, size_bytes, download_time_ms),
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
            TimerKind::QualityChangeReset => {
                self.quality_changes.handle_timer(&fired);
            }
            TimerKind::BitratePoll => {}
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
        data.is_casting = self.player.is_casting();
        data.is_muted = self.player.is_muted();

        self.decorate_source(&mut data);

        if let Some(quality) = self.player.video_quality() {
            data.video_bitrate = quality.bitrate.map(|bitrate| bitrate as f64);
            data.video_playback_width = quality.width;
            data.video_playback_height = quality.height;
            data.video_codec = quality.codec;
        }

        if let Some(track) = self.player.subtitle().filter(SubtitleTrack::is_enabled) {
            data.subtitle_enabled = true;
            data.subtitle_language = track.language.or(track.label);
        }
        data.audio_language = self.player.audio_language();

        data.drm_load_time_ms = self.drm_load_time_ms;
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
        self.is_player_ready = false;
        self.is_stalling = false;
        self.is_seeking = false;
        self.drm_certificate_time_ms = None;
        self.drm_load_time_ms = None;
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.player.unsubscribe();

        if self.machine.is_waiting_for_first_play() {
            let position = self.position();
            self.machine
                .on_play_attempt_failed(StartFailureReason::PageClosed, position, None);
        }

        self.watchdog.disarm();
        self.quality_changes.reset();
        self.machine.destroy();
        self.is_player_ready = false;
        self.is_stalling = false;
        log_info!("[{}] sdk adapter destroyed", self.machine.impression_id());
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn state_machine(&self) -> &PlaybackStateMachine {
        &self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testing::{context, recording_sink, TestContext};
    use crate::state::testing::Hook;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeState {
        subscribed: bool,
        unsubscribe_calls: usize,
        current_time: f64,
        duration: f64,
        paused: bool,
        source: Option<SourceDescription>,
        quality: Option<VideoQuality>,
        subtitle: Option<SubtitleTrack>,
    }

    #[derive(Clone, Default)]
    struct FakeSdkPlayer {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeSdkPlayer {
        fn set(&self, update: impl FnOnce(&mut FakeState)) {
            update(&mut self.state.lock().unwrap());
        }
    }

    impl SdkPlayer for FakeSdkPlayer {
        fn subscribe(&mut self, _sink: SignalSink<SdkEvent>) {
            self.state.lock().unwrap().subscribed = true;
        }

        fn unsubscribe(&mut self) {
            let mut state = self.state.lock().unwrap();
            state.subscribed = false;
            state.unsubscribe_calls += 1;
        }

        fn current_time(&self) -> f64 {
            self.state.lock().unwrap().current_time
        }

        fn duration(&self) -> f64 {
            self.state.lock().unwrap().duration
        }

        fn is_paused(&self) -> bool {
            self.state.lock().unwrap().paused
        }

        fn is_muted(&self) -> bool {
            false
        }

        fn is_casting(&self) -> bool {
            false
        }

        fn video_quality(&self) -> Option<VideoQuality> {
            self.state.lock().unwrap().quality.clone()
        }

        fn source(&self) -> Option<SourceDescription> {
            self.state.lock().unwrap().source.clone()
        }

        fn subtitle(&self) -> Option<SubtitleTrack> {
            self.state.lock().unwrap().subtitle.clone()
        }

        fn audio_language(&self) -> Option<String> {
            Some("en".into())
        }

        fn version(&self) -> Option<String> {
            Some("3.1.0".into())
        }
    }

    fn adapter() -> (TestContext, FakeSdkPlayer, SdkPlayerAdapter<FakeSdkPlayer>) {
        let test = context();
        let player = FakeSdkPlayer::default();
        let (sink, _) = recording_sink();
        let adapter = SdkPlayerAdapter::new(player.clone(), test.context.clone(), sink);
        (test, player, adapter)
    }

    fn start_playing(test: &TestContext, adapter: &mut SdkPlayerAdapter<FakeSdkPlayer>) {
        adapter.handle_signal(SdkEvent::Ready);
        adapter.handle_signal(SdkEvent::Play);
        test.clock.advance(400);
        adapter.handle_signal(SdkEvent::Playing);
    }

    fn quality_change(old: u64, new: u64) -> SdkEvent {
        SdkEvent::VideoDownloadQualityChanged {
            old: Some(VideoQuality::with_bitrate(old)),
            new: Some(VideoQuality::with_bitrate(new)),
        }
    }

    #[test]
    fn construction_subscribes_to_the_player() {
        let (_test, player, _adapter) = adapter();
        assert!(player.state.lock().unwrap().subscribed);
    }

    #[test]
    fn first_playing_disarms_watchdog_and_reports_startup() {
        let (test, _player, mut adapter) = adapter();
        start_playing(&test, &mut adapter);

        assert_eq!(adapter.state_machine().state(), PlaybackState::Playing);
        assert!(adapter.state_machine().did_start_playing_video());
        assert!(!test.scheduler.is_live(TimerKind::VideoStartTimeout));
        assert!(test.hooks.hooks().contains(&Hook::Startup(400)));
    }

    #[test]
    fn timeout_before_playing_fails_the_attempt() {
        let (test, _player, mut adapter) = adapter();
        adapter.handle_signal(SdkEvent::Play);
        let fired = test.scheduler.fire(TimerKind::VideoStartTimeout).unwrap();
        adapter.handle_timer(fired);

        assert_eq!(adapter.state_machine().state(), PlaybackState::PlayAttemptFailed);
        let data = adapter.create_event_data();
        assert!(data.video_start_failed);
        assert_eq!(data.video_start_failed_reason, Some(StartFailureReason::Timeout));
        assert!(!adapter.create_event_data().video_start_failed);
    }

    #[test]
    fn quality_change_is_gated_while_seeking() {
        let (test, _player, mut adapter) = adapter();
        start_playing(&test, &mut adapter);
        test.hooks.take();

        adapter.handle_signal(SdkEvent::Seek);
        adapter.handle_signal(quality_change(1_000, 2_000));
        assert_eq!(test.hooks.count(|hook| *hook == Hook::QualityChange), 0);

        adapter.handle_signal(SdkEvent::Seeked);
        adapter.handle_signal(quality_change(1_000, 2_000));
        assert_eq!(test.hooks.count(|hook| *hook == Hook::QualityChange), 1);
        assert_eq!(adapter.state_machine().state(), PlaybackState::Playing);
    }

    #[test]
    fn quality_change_needs_a_bitrate_change() {
        let (test, _player, mut adapter) = adapter();
        start_playing(&test, &mut adapter);
        adapter.handle_signal(quality_change(1_000, 1_000));
        assert_eq!(test.hooks.count(|hook| *hook == Hook::QualityChange), 0);
    }

    #[test]
    fn quality_change_before_first_play_is_ignored() {
        let (test, _player, mut adapter) = adapter();
        adapter.handle_signal(SdkEvent::Ready);
        adapter.handle_signal(quality_change(1_000, 2_000));
        assert_eq!(adapter.state_machine().state(), PlaybackState::Setup);
        assert_eq!(test.hooks.count(|hook| *hook == Hook::QualityChange), 0);
    }

    #[test]
    fn subtitle_change_settles_into_paused_and_audio_change_is_ignored_while_stalled() {
        let (test, player, mut adapter) = adapter();
        start_playing(&test, &mut adapter);
        player.set(|state| state.paused = true);
        adapter.handle_signal(SdkEvent::SubtitleChanged);
        assert_eq!(adapter.state_machine().state(), PlaybackState::Paused);
        assert_eq!(test.hooks.count(|hook| *hook == Hook::SubtitleChange), 1);

        adapter.handle_signal(SdkEvent::StallStarted);
        adapter.handle_signal(SdkEvent::AudioChanged);
        assert_eq!(adapter.state_machine().state(), PlaybackState::Buffering);
        assert_eq!(test.hooks.count(|hook| *hook == Hook::AudioChange), 0);
    }

    #[test]
    fn transient_change_settles_into_buffering_while_stalled() {
        let (test, player, mut adapter) = adapter();
        start_playing(&test, &mut adapter);
        adapter.handle_signal(SdkEvent::StallStarted);
        player.set(|state| state.paused = true);
        adapter.handle_signal(SdkEvent::Paused);
        assert_eq!(adapter.state_machine().state(), PlaybackState::Paused);

        adapter.handle_signal(SdkEvent::SubtitleChanged);
        assert_eq!(test.hooks.count(|hook| *hook == Hook::SubtitleChange), 1);
        assert_eq!(adapter.state_machine().state(), PlaybackState::Buffering);
    }

    #[test]
    fn subtitle_change_before_first_play_is_ignored() {
        let (test, player, mut adapter) = adapter();
        adapter.handle_signal(SdkEvent::Ready);
        player.set(|state| state.paused = true);
        adapter.handle_signal(SdkEvent::Paused);
        assert_eq!(adapter.state_machine().state(), PlaybackState::Paused);

        adapter.handle_signal(SdkEvent::SubtitleChanged);
        assert_eq!(adapter.state_machine().state(), PlaybackState::Paused);
        assert_eq!(test.hooks.count(|hook| *hook == Hook::SubtitleChange), 0);
    }

    #[test]
    fn destroy_after_a_timeout_reports_no_second_failure() {
        let (test, _player, mut adapter) = adapter();
        adapter.handle_signal(SdkEvent::Play);
        let fired = test.scheduler.fire(TimerKind::VideoStartTimeout).unwrap();
        adapter.handle_timer(fired);

        let first = adapter.create_event_data();
        assert_eq!(first.video_start_failed_reason, Some(StartFailureReason::Timeout));

        adapter.destroy();
        let second = adapter.create_event_data();
        assert_eq!(second.video_start_failed_reason, None);
        assert!(!second.video_start_failed);
        assert_eq!(
            test.hooks
                .count(|hook| matches!(hook, Hook::PlayAttemptFailed(_))),
            1
        );
    }

    #[test]
    fn source_unload_then_destroy_reports_page_closed_once() {
        let (test, _player, mut adapter) = adapter();
        adapter.handle_signal(SdkEvent::Play);
        adapter.handle_signal(SdkEvent::SourceUnload);
        adapter.destroy();

        assert_eq!(
            adapter.create_event_data().video_start_failed_reason,
            Some(StartFailureReason::PageClosed)
        );
        assert_eq!(
            test.hooks
                .count(|hook| matches!(hook, Hook::PlayAttemptFailed(_))),
            1
        );
    }

    #[test]
    fn error_before_first_play_is_a_start_failure() {
        let (test, _player, mut adapter) = adapter();
        adapter.handle_signal(SdkEvent::Play);
        adapter.handle_signal(SdkEvent::SourceError(ErrorPayload::new(2_001, "manifest")));

        assert_eq!(adapter.state_machine().state(), PlaybackState::PlayAttemptFailed);
        assert!(test
            .hooks
            .hooks()
            .contains(&Hook::PlayAttemptFailed(StartFailureReason::PlayerError)));
        assert!(!test.scheduler.is_live(TimerKind::VideoStartTimeout));
    }

    #[test]
    fn error_after_first_play_is_an_error_state() {
        let (test, _player, mut adapter) = adapter();
        start_playing(&test, &mut adapter);
        let error = ErrorPayload::new(3_001, "decode");
        adapter.handle_signal(SdkEvent::PlayerError(error.clone()));

        assert_eq!(adapter.state_machine().state(), PlaybackState::Error);
        assert!(test.hooks.hooks().contains(&Hook::Error(Some(error))));
        assert!(adapter.create_event_data().video_start_failed_reason.is_none());
    }

    #[test]
    fn destroy_records_page_closed_once() {
        let (test, player, mut adapter) = adapter();
        adapter.handle_signal(SdkEvent::Play);

        adapter.destroy();
        adapter.destroy();

        assert!(adapter.is_destroyed());
        assert_eq!(player.state.lock().unwrap().unsubscribe_calls, 1);
        assert_eq!(
            test.hooks
                .count(|hook| *hook == Hook::PlayAttemptFailed(StartFailureReason::PageClosed)),
            1
        );
        assert!(!test.scheduler.is_live(TimerKind::VideoStartTimeout));
    }

    #[test]
    fn source_unloaded_starts_a_new_impression() {
        let (test, _player, mut adapter) = adapter();
        start_playing(&test, &mut adapter);
        let first = adapter.state_machine().impression_id();

        adapter.handle_signal(SdkEvent::SourceUnload);
        adapter.handle_signal(SdkEvent::SourceUnloaded);

        assert_ne!(adapter.state_machine().impression_id(), first);
        assert_eq!(adapter.state_machine().state(), PlaybackState::Setup);
        assert!(!test.scheduler.is_live(TimerKind::Heartbeat));
    }

    #[test]
    fn ad_breaks_enter_ad_states_and_reach_the_listener() {
        #[derive(Default)]
        struct Calls(Mutex<Vec<&'static str>>);

        impl AdEventListener for Calls {
            fn on_ad_break_started(&self, _ad_break: &AdBreak) {
                self.0.lock().unwrap().push("break-started");
            }
            fn on_ad_break_finished(&self, _ad_break: &AdBreak) {
                self.0.lock().unwrap().push("break-finished");
            }
            fn on_ad_started(&self, _ad: &Ad) {
                self.0.lock().unwrap().push("ad-started");
            }
            fn on_ad_finished(&self, _ad: &Ad) {
                self.0.lock().unwrap().push("ad-finished");
            }
        }

        let (_test, _player, adapter) = adapter();
        let calls = Arc::new(Calls::default());
        let mut adapter = adapter.with_ad_listener(calls.clone());

        adapter.handle_signal(SdkEvent::AdBreakStarted(AdBreak::default()));
        assert_eq!(adapter.state_machine().state(), PlaybackState::Ad);
        adapter.handle_signal(SdkEvent::AdStarted(Ad::default()));
        adapter.handle_signal(SdkEvent::AdFinished(Ad::default()));
        adapter.handle_signal(SdkEvent::AdBreakFinished(AdBreak::default()));
        assert_eq!(adapter.state_machine().state(), PlaybackState::AdFinished);

        assert_eq!(
            *calls.0.lock().unwrap(),
            vec!["break-started", "ad-started", "ad-finished", "break-finished"]
        );
    }

    #[test]
    fn event_data_describes_source_quality_and_downloads() {
        let (test, player, mut adapter) = adapter();
        player.set(|state| {
            state.duration = 120.5;
            state.source = Some(SourceDescription {
                url: "https://cdn.example/vod/manifest.mpd".into(),
                stream_type: None,
                drm: Some(DrmType::Widevine),
            });
            state.quality = Some(VideoQuality {
                bitrate: Some(2_400_000),
                width: Some(1280),
                height: Some(720),
                codec: Some("avc1".into()),
                ..VideoQuality::default()
            });
            state.subtitle = Some(SubtitleTrack {
                id: "sub-1".into(),
                language: None,
                label: Some("English".into()),
            });
        });
        start_playing(&test, &mut adapter);

        adapter.handle_signal(SdkEvent::DownloadFinished {
            kind: DownloadKind::DrmCertificate,
            size_bytes: 1_000,
            download_time_ms: Some(40),
        });
        adapter.handle_signal(SdkEvent::DownloadFinished {
            kind: DownloadKind::DrmLicense,
            size_bytes: 1_000,
            download_time_ms: Some(60),
        });
        adapter.handle_signal(SdkEvent::DownloadFinished {
            kind: DownloadKind::MediaSegment,
            size_bytes: 500_000,
            download_time_ms: Some(250),
        });

        let data = adapter.create_event_data();
        assert_eq!(data.player, PlayerKind::Sdk);
        assert_eq!(data.version.as_deref(), Some("sdk-3.1.0"));
        assert_eq!(data.stream_format, Some(StreamType::Dash));
        assert_eq!(data.mpd_url.as_deref(), Some("https://cdn.example/vod/manifest.mpd"));
        assert_eq!(data.video_duration_ms, Some(120_500));
        assert!(!data.is_live);
        assert_eq!(data.drm_type, Some(DrmType::Widevine));
        assert_eq!(data.drm_load_time_ms, Some(100));
        assert_eq!(data.video_bitrate, Some(2_400_000.0));
        assert_eq!(data.video_playback_height, Some(720));
        assert_eq!(data.subtitle_language.as_deref(), Some("English"));
        assert_eq!(data.download_speed.segments_download_size, 500_000);
        assert_eq!(data.startup_time_ms, Some(400));
        assert_eq!(data.state, PlaybackState::Playing);
    }

    #[test]
    fn live_source_is_reported_live() {
        let (_test, player, mut adapter) = adapter();
        player.set(|state| {
            state.duration = f64::INFINITY;
            state.source = Some(SourceDescription {
                url: "https://cdn.example/live/index.m3u8".into(),
                stream_type: Some(StreamType::Hls),
                drm: None,
            });
        });
        let data = adapter.create_event_data();
        assert!(data.is_live);
        assert!(data.video_duration_ms.is_none());
        assert!(data.m3u8_url.is_some());
    }

    #[test]
    fn backgrounding_suspends_the_start_timeout() {
        let (test, _player, mut adapter) = adapter();
        adapter.handle_signal(SdkEvent::Play);
        adapter.on_background();
        assert!(!test.scheduler.is_live(TimerKind::VideoStartTimeout));
        adapter.on_foreground();
        assert!(test.scheduler.is_live(TimerKind::VideoStartTimeout));
    }
}
