pub mod alarm;
pub mod manual;
pub mod scheduler;

pub use alarm::{cancel_slot, slot_matches, Alarm, AlarmId, Scheduler, TimerFired, TimerKind};
pub use manual::ManualScheduler;
pub use scheduler::{TimerSink, TokioScheduler};
