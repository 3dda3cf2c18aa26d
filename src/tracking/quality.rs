use std::sync::Arc;
use std::time::Duration;

use crate::settings::CollectorConfig;
use crate::timer::{cancel_slot, slot_matches, Alarm, Scheduler, TimerFired, TimerKind};

/// Caps how many quality changes are reported per interval.
///
/// The interval starts with the first counted change and the count drops
/// back to zero when it ends.
pub struct QualityChangeCounter {
    scheduler: Arc<dyn Scheduler>,
    threshold: u32,
    reset_interval: Duration,
    count: u32,
    reset_alarm: Option<Alarm>,
}

impl QualityChangeCounter {
    pub fn new(scheduler: Arc<dyn Scheduler>, threshold: u32, reset_interval: Duration) -> Self {
        Self {
            scheduler,
            threshold,
            reset_interval,
            count: 0,
            reset_alarm: None,
        }
    }

    pub fn from_config(scheduler: Arc<dyn Scheduler>, config: &CollectorConfig) -> Self {
        Self::new(
            scheduler,
            config.quality_change_threshold,
            config.quality_change_reset_interval(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.count < self.threshold
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn increase(&mut self) {
        self.count = self.count.saturating_add(1);
        if self.reset_alarm.is_none() {
            self.reset_alarm = Some(
                self.scheduler
                    .schedule_once(TimerKind::QualityChangeReset, self.reset_interval),
            );
        }
    }

    pub fn handle_timer(&mut self, fired: &TimerFired) -> bool {
        if !slot_matches(&self.reset_alarm, fired) {
            return false;
        }
        self.reset_alarm = None;
        self.count = 0;
        true
    }

    pub fn reset(&mut self) {
        cancel_slot(&mut self.reset_alarm);
        self.count = 0;
    }
}
