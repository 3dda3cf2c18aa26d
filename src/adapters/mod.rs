pub mod ads;
pub mod native;
pub mod sdk;

use std::fmt;
use std::sync::Arc;

use crate::clock::Clock;
use crate::models::{EventData, PlayerKind};
use crate::settings::CollectorConfig;
use crate::state::{PlaybackStateMachine, SessionDelegate};
use crate::timer::{Scheduler, TimerFired};
use crate::tracking::{QualityChangeCounter, SeekCorrelator, VideoStartWatchdog};

pub use ads::{Ad, AdBreak, AdEventListener};
pub use native::{ItemStatus, NativeEvent, NativePlayer, NativePlayerAdapter, TimeControlStatus};
pub use sdk::{DownloadKind, SdkEvent, SdkPlayer, SdkPlayerAdapter, SourceDescription, SubtitleTrack};

/// Host application lifecycle changes the adapters react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycle {
    Background,
    Foreground,
}

/// Normalizes one backend's signals into state machine transitions.
///
/// Every method runs on the collector task, one message at a time.
pub trait PlayerAdapter: Send + 'static {
    type Signal: Send + 'static;

    fn kind(&self) -> PlayerKind;

    fn handle_signal(&mut self, signal: Self::Signal);

    fn handle_timer(&mut self, fired: TimerFired);

    fn on_background(&mut self);

    fn on_foreground(&mut self);

    /// Snapshot of the session and player. Clears a pending start failure.
    fn create_event_data(&mut self) -> EventData;

    /// Forgets everything about the current source and starts a new impression.
    fn reset_source_state(&mut self);

    /// Unsubscribes from the backend and cancels every alarm. Idempotent.
    fn destroy(&mut self);

    fn is_destroyed(&self) -> bool;

    fn state_machine(&self) -> &PlaybackStateMachine;

    fn on_lifecycle(&mut self, event: AppLifecycle) {
        match event {
            AppLifecycle::Background => self.on_background(),
            AppLifecycle::Foreground => self.on_foreground(),
        }
    }
}

/// Where a backend posts its signals. Cheap to clone; posting never blocks.
pub struct SignalSink<S> {
    post: Arc<dyn Fn(S) + Send + Sync>,
}

impl<S> SignalSink<S> {
    pub fn new(post: impl Fn(S) + Send + Sync + 'static) -> Self {
        Self {
            post: Arc::new(post),
        }
    }

    pub fn post(&self, signal: S) {
        (self.post)(signal);
    }
}

impl<S> Clone for SignalSink<S> {
    fn clone(&self) -> Self {
        Self {
            post: Arc::clone(&self.post),
        }
    }
}

impl<S> fmt::Debug for SignalSink<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignalSink")
    }
}

/// Shared collaborators an adapter is built from.
#[derive(Clone)]
pub struct AdapterContext {
    pub config: Arc<CollectorConfig>,
    pub clock: Arc<dyn Clock>,
    pub scheduler: Arc<dyn Scheduler>,
    pub delegate: Arc<dyn SessionDelegate>,
}

impl AdapterContext {
    pub fn new(
        config: Arc<CollectorConfig>,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
        delegate: Arc<dyn SessionDelegate>,
    ) -> Self {
        Self {
            config,
            clock,
            scheduler,
            delegate,
        }
    }

    pub fn state_machine(&self) -> PlaybackStateMachine {
        PlaybackStateMachine::new(
            Arc::clone(&self.clock),
            Arc::clone(&self.scheduler),
            Arc::clone(&self.delegate),
            self.config.heartbeat_interval(),
        )
    }

    pub fn watchdog(&self) -> VideoStartWatchdog {
        VideoStartWatchdog::new(Arc::clone(&self.scheduler), self.config.video_start_timeout())
    }

    pub fn quality_change_counter(&self) -> QualityChangeCounter {
        QualityChangeCounter::from_config(Arc::clone(&self.scheduler), &self.config)
    }

    pub fn seek_correlator(&self) -> SeekCorrelator {
        SeekCorrelator::from_config(&self.config)
    }
}
