use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::alarm::{Alarm, AlarmId, Scheduler, TimerFired, TimerKind};

#[derive(Debug, Clone)]
struct ScheduledAlarm {
    fired: TimerFired,
    delay: Duration,
    repeating: bool,
    token: CancellationToken,
}

/// Scheduler that never fires on its own.
///
/// Hosts and tests ask it which alarms are live and hand the resulting
/// [`TimerFired`] to the adapter themselves, which keeps timing fully
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    alarms: Arc<Mutex<Vec<ScheduledAlarm>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn alarms(&self) -> MutexGuard<'_, Vec<ScheduledAlarm>> {
        match self.alarms.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Live (not cancelled, not yet fired) alarms of `kind`.
    pub fn live_count(&self, kind: TimerKind) -> usize {
        self.alarms()
            .iter()
            .filter(|alarm| alarm.fired.kind == kind && !alarm.token.is_cancelled())
            .count()
    }

    pub fn is_live(&self, kind: TimerKind) -> bool {
        self.live_count(kind) > 0
    }

    /// Delay or period of the most recent live alarm of `kind`.
    pub fn delay_of(&self, kind: TimerKind) -> Option<Duration> {
        self.alarms()
            .iter()
            .rev()
            .find(|alarm| alarm.fired.kind == kind && !alarm.token.is_cancelled())
            .map(|alarm| alarm.delay)
    }

    /// Fires the most recent live alarm of `kind`.
    ///
    /// Single-fire alarms are consumed; repeating ones stay live.
    pub fn fire(&self, kind: TimerKind) -> Option<TimerFired> {
        let mut alarms = self.alarms();
        let index = alarms
            .iter()
            .rposition(|alarm| alarm.fired.kind == kind && !alarm.token.is_cancelled())?;
        let fired = alarms[index].fired;
        if !alarms[index].repeating {
            alarms.remove(index);
        }
        Some(fired)
    }

    fn push(&self, kind: TimerKind, delay: Duration, repeating: bool) -> Alarm {
        let id = AlarmId::next();
        let token = CancellationToken::new();
        let mut alarms = self.alarms();
        alarms.retain(|alarm| !alarm.token.is_cancelled());
        alarms.push(ScheduledAlarm {
            fired: TimerFired { kind, id },
            delay,
            repeating,
            token: token.clone(),
        });
        Alarm::new(kind, id, token)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&self, kind: TimerKind, delay: Duration) -> Alarm {
        self.push(kind, delay, false)
    }

    fn schedule_repeating(&self, kind: TimerKind, period: Duration) -> Alarm {
        self.push(kind, period, true)
    }
}
