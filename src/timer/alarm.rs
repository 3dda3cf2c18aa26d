use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

static NEXT_ALARM_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one scheduled alarm. Fired messages carry it so that a firing
/// that raced with a cancel can be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmId(u64);

impl AlarmId {
    pub fn next() -> Self {
        Self(NEXT_ALARM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Repeating tick while the session is in `Playing`.
    Heartbeat,
    /// Single-fire video start timeout.
    VideoStartTimeout,
    /// Repeating access-log bitrate poll of the native backend.
    BitratePoll,
    /// Single-fire reset of the quality change counter.
    QualityChangeReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub id: AlarmId,
}

/// Handle to a scheduled alarm.
///
/// Cancelling is idempotent and dropping the handle cancels the alarm, so
/// replacing an `Option<Alarm>` slot never leaves two live alarms behind.
#[derive(Debug)]
pub struct Alarm {
    id: AlarmId,
    kind: TimerKind,
    token: CancellationToken,
}

impl Alarm {
    pub fn new(kind: TimerKind, id: AlarmId, token: CancellationToken) -> Self {
        Self { id, kind, token }
    }

    pub fn id(&self) -> AlarmId {
        self.id
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True if `fired` was produced by this alarm and it is still live.
    pub fn matches(&self, fired: &TimerFired) -> bool {
        fired.id == self.id && fired.kind == self.kind && !self.is_cancelled()
    }
}

impl Drop for Alarm {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Schedules alarms whose firings are delivered back as [`TimerFired`]
/// messages to whoever owns the scheduler's sink.
pub trait Scheduler: Send + Sync {
    fn schedule_once(&self, kind: TimerKind, delay: Duration) -> Alarm;

    fn schedule_repeating(&self, kind: TimerKind, period: Duration) -> Alarm;
}

/// Cancels and clears the alarm in `slot`, returning whether one was live.
pub fn cancel_slot(slot: &mut Option<Alarm>) -> bool {
    match slot.take() {
        Some(alarm) => {
            let was_live = !alarm.is_cancelled();
            alarm.cancel();
            was_live
        }
        None => false,
    }
}

/// True if the alarm in `slot` produced `fired`.
pub fn slot_matches(slot: &Option<Alarm>, fired: &TimerFired) -> bool {
    slot.as_ref().is_some_and(|alarm| alarm.matches(fired))
}
