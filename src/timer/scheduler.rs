use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::alarm::{Alarm, AlarmId, Scheduler, TimerFired, TimerKind};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Receives alarm firings. Must not block: it is called from timer tasks.
pub type TimerSink = Arc<dyn Fn(TimerFired) + Send + Sync>;

/// Runs every alarm as its own tokio task that races its sleep against the
/// alarm's cancellation token.
#[derive(Clone)]
pub struct TokioScheduler {
    runtime: Handle,
    sink: TimerSink,
}

impl TokioScheduler {
    pub fn new(runtime: Handle, sink: TimerSink) -> Self {
        Self { runtime, sink }
    }

    pub fn from_current(sink: TimerSink) -> Result<Self> {
        let runtime = Handle::try_current().context("alarms need a running tokio runtime")?;
        Ok(Self::new(runtime, sink))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, kind: TimerKind, delay: Duration) -> Alarm {
        let id = AlarmId::next();
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let sink = Arc::clone(&self.sink);

        self.runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {}
                _ = time::sleep(delay) => sink(TimerFired { kind, id }),
            }
        });

        Alarm::new(kind, id, token)
    }

    fn schedule_repeating(&self, kind: TimerKind, period: Duration) -> Alarm {
        let id = AlarmId::next();
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let sink = Arc::clone(&self.sink);
        let period = period.max(MIN_PERIOD);

        self.runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => sink(TimerFired { kind, id }),
                }
            }
        });

        Alarm::new(kind, id, token)
    }
}
