use std::sync::{Arc, Mutex};
use std::time::Duration;

use playback_analytics::adapters::{ItemStatus, TimeControlStatus};
use playback_analytics::models::{AccessLogEntry, VideoQuality};
use playback_analytics::{
    CollectorConfig, CollectorHandle, CollectorOptions, ErrorPayload, NativeEvent, NativePlayer,
    NativePlayerAdapter, PlaybackState, SdkEvent, SdkPlayer, SdkPlayerAdapter, SessionRecorder,
    SignalSink, StartFailureReason,
};
use tokio::time::sleep;

#[derive(Default)]
struct SdkState {
    paused: bool,
    unsubscribe_calls: usize,
}

#[derive(Clone, Default)]
struct FakeSdkPlayer {
    state: Arc<Mutex<SdkState>>,
}

impl SdkPlayer for FakeSdkPlayer {
    fn subscribe(&mut self, _sink: SignalSink<SdkEvent>) {}

    fn unsubscribe(&mut self) {
        self.state.lock().unwrap().unsubscribe_calls += 1;
    }

    fn current_time(&self) -> f64 {
        0.0
    }

    fn duration(&self) -> f64 {
        120.0
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
        Some(VideoQuality::with_bitrate(2_500_000))
    }

    fn source(&self) -> Option<playback_analytics::adapters::SourceDescription> {
        None
    }

    fn subtitle(&self) -> Option<playback_analytics::adapters::SubtitleTrack> {
        None
    }

    fn audio_language(&self) -> Option<String> {
        None
    }

    fn version(&self) -> Option<String> {
        Some("3.1.0".into())
    }
}

#[derive(Default)]
struct NativeState {
    rate: f64,
    access_log: Vec<AccessLogEntry>,
}

#[derive(Clone, Default)]
struct FakeNativePlayer {
    state: Arc<Mutex<NativeState>>,
}

impl FakeNativePlayer {
    fn watch_bitrate(&self, bitrate: f64) {
        self.state.lock().unwrap().access_log.push(AccessLogEntry {
            indicated_bitrate: bitrate,
            duration_watched_secs: 4.0,
            ..AccessLogEntry::default()
        });
    }
}

impl NativePlayer for FakeNativePlayer {
    fn subscribe(&mut self, _sink: SignalSink<NativeEvent>) {}

    fn unsubscribe(&mut self) {}

    fn current_time(&self) -> f64 {
        1.0
    }

    fn rate(&self) -> f64 {
        self.state.lock().unwrap().rate
    }

    fn item_duration(&self) -> Option<f64> {
        Some(600.0)
    }

    fn volume(&self) -> f32 {
        1.0
    }

    fn is_external_playback_active(&self) -> bool {
        false
    }

    fn asset_url(&self) -> Option<String> {
        Some("https://cdn.example/vod/manifest.mpd".into())
    }

    fn presentation_size(&self) -> Option<(u32, u32)> {
        Some((1280, 720))
    }

    fn audio_bitrate(&self) -> Option<f64> {
        Some(128_000.0)
    }

    fn access_log(&self) -> Vec<AccessLogEntry> {
        self.state.lock().unwrap().access_log.clone()
    }

    fn item_error(&self) -> Option<ErrorPayload> {
        None
    }

    fn version(&self) -> Option<String> {
        None
    }
}

fn spawn_sdk(
    player: &FakeSdkPlayer,
    recorder: &SessionRecorder,
) -> CollectorHandle<SdkEvent> {
    let player = player.clone();
    let options = CollectorOptions::new(CollectorConfig::default())
        .with_delegate(Arc::new(recorder.clone()));
    CollectorHandle::spawn(options, move |context, signals| {
        SdkPlayerAdapter::new(player, context, signals)
    })
    .unwrap()
}

fn spawn_native(
    player: &FakeNativePlayer,
    recorder: &SessionRecorder,
) -> CollectorHandle<NativeEvent> {
    let player = player.clone();
    let options = CollectorOptions::new(CollectorConfig::default())
        .with_delegate(Arc::new(recorder.clone()));
    CollectorHandle::spawn(options, move |context, signals| {
        NativePlayerAdapter::new(player, context, signals)
    })
    .unwrap()
}

#[test]
fn spawning_outside_a_runtime_fails() {
    let result = CollectorHandle::spawn(CollectorOptions::default(), |context, signals| {
        SdkPlayerAdapter::new(FakeSdkPlayer::default(), context, signals)
    });
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn unstarted_playback_times_out_and_is_reported_once() {
    let recorder = SessionRecorder::new();
    let collector = spawn_sdk(&FakeSdkPlayer::default(), &recorder);

    collector.post(SdkEvent::Ready);
    collector.post(SdkEvent::Play);
    sleep(Duration::from_millis(1_500)).await;

    assert_eq!(
        collector.state().await.unwrap(),
        PlaybackState::PlayAttemptFailed
    );

    let first = collector.event_data().await.unwrap();
    assert!(first.video_start_failed);
    assert_eq!(
        first.video_start_failed_reason,
        Some(StartFailureReason::Timeout)
    );

    let second = collector.event_data().await.unwrap();
    assert!(!second.video_start_failed);
    assert_eq!(second.video_start_failed_reason, None);

    assert_eq!(
        recorder.snapshot().start_failure,
        Some(StartFailureReason::Timeout)
    );
    collector.destroy().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn backgrounding_holds_the_start_timeout_until_foreground() {
    let recorder = SessionRecorder::new();
    let collector = spawn_sdk(&FakeSdkPlayer::default(), &recorder);

    collector.post(SdkEvent::Play);
    collector.background();
    sleep(Duration::from_millis(3_000)).await;

    assert_eq!(collector.state().await.unwrap(), PlaybackState::Setup);
    assert!(!collector.event_data().await.unwrap().video_start_failed);

    collector.foreground();
    sleep(Duration::from_millis(1_500)).await;

    let data = collector.event_data().await.unwrap();
    assert_eq!(
        data.video_start_failed_reason,
        Some(StartFailureReason::Timeout)
    );
    collector.destroy().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn recorder_follows_startup_and_rebuffering() {
    let recorder = SessionRecorder::new();
    let collector = spawn_sdk(&FakeSdkPlayer::default(), &recorder);

    collector.post(SdkEvent::Ready);
    collector.post(SdkEvent::Play);
    collector.post(SdkEvent::Playing);
    collector.post(SdkEvent::StallStarted);
    collector.post(SdkEvent::StallEnded);
    sleep(Duration::from_millis(2_000)).await;

    let data = collector.event_data().await.unwrap();
    assert_eq!(data.state, PlaybackState::Playing);
    assert!(!data.video_start_failed);

    let snapshot = recorder.snapshot();
    assert_eq!(snapshot.impression_id, Some(data.impression_id));
    assert!(snapshot.startup_time_ms.is_some());
    assert_eq!(snapshot.rebuffer_count, 1);
    assert_eq!(snapshot.start_failure, None);

    collector.destroy().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn destroy_before_first_play_records_page_closed() {
    let recorder = SessionRecorder::new();
    let player = FakeSdkPlayer::default();
    let collector = spawn_sdk(&player, &recorder);

    collector.post(SdkEvent::Play);
    collector.destroy().await.unwrap();
    collector.clone().destroy().await.unwrap();

    assert!(!collector.is_running());
    assert_eq!(player.state.lock().unwrap().unsubscribe_calls, 1);
    assert_eq!(
        recorder.snapshot().start_failure,
        Some(StartFailureReason::PageClosed)
    );
    assert!(collector.event_data().await.is_err());
    assert!(collector.state().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn signals_posted_through_the_sink_reach_the_adapter() {
    let recorder = SessionRecorder::new();
    let collector = spawn_sdk(&FakeSdkPlayer::default(), &recorder);
    let signals = collector.signals();

    signals.post(SdkEvent::Ready);
    signals.post(SdkEvent::Play);
    signals.post(SdkEvent::Playing);
    signals.post(SdkEvent::Paused);

    assert_eq!(collector.state().await.unwrap(), PlaybackState::Paused);
    collector.destroy().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn native_bitrate_poll_reports_quality_changes() {
    let recorder = SessionRecorder::new();
    let player = FakeNativePlayer::default();
    let collector = spawn_native(&player, &recorder);

    player.watch_bitrate(1_000_000.0);
    player.state.lock().unwrap().rate = 1.0;
    collector.post(NativeEvent::TimeControlStatusChanged(
        TimeControlStatus::WaitingToPlay,
    ));
    collector.post(NativeEvent::ItemStatusChanged(ItemStatus::ReadyToPlay));
    collector.post(NativeEvent::TimeControlStatusChanged(
        TimeControlStatus::Playing,
    ));
    sleep(Duration::from_millis(1_500)).await;

    assert_eq!(collector.state().await.unwrap(), PlaybackState::Playing);
    assert_eq!(recorder.snapshot().quality_change_count, 0);

    player.watch_bitrate(3_000_000.0);
    sleep(Duration::from_millis(1_000)).await;

    assert_eq!(collector.state().await.unwrap(), PlaybackState::Playing);
    assert_eq!(recorder.snapshot().quality_change_count, 1);

    let data = collector.event_data().await.unwrap();
    assert_eq!(data.video_bitrate, Some(3_000_000.0));
    collector.destroy().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reset_source_starts_a_new_impression() {
    let recorder = SessionRecorder::new();
    let collector = spawn_sdk(&FakeSdkPlayer::default(), &recorder);

    let before = collector.event_data().await.unwrap().impression_id;
    collector.reset_source();
    let after = collector.event_data().await.unwrap().impression_id;

    assert_ne!(before, after);
    assert_eq!(collector.state().await.unwrap(), PlaybackState::Setup);
    collector.destroy().await.unwrap();
}
