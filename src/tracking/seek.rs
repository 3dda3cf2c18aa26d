use crate::clock::MediaTime;
use crate::settings::CollectorConfig;

/// An unconfirmed seek: a time discontinuity waiting for the player to
/// become ready again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekWindow {
    pub started_at_ms: i64,
    pub media_position: Option<MediaTime>,
    /// The first Playing/Paused entry had already happened when the jump was seen.
    pub after_first_ready: bool,
}

#[derive(Debug, Clone)]
pub struct SeekCorrelator {
    window: Option<SeekWindow>,
    last_jump_ms: Option<i64>,
    max_seek_operation_ms: i64,
    duplicate_tolerance_ms: i64,
}

impl SeekCorrelator {
    pub fn new(max_seek_operation_ms: i64, duplicate_tolerance_ms: i64) -> Self {
        Self {
            window: None,
            last_jump_ms: None,
            max_seek_operation_ms,
            duplicate_tolerance_ms,
        }
    }

    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(
            config.max_seek_operation_ms,
            config.time_jump_duplicate_tolerance_ms,
        )
    }

    /// Records a time discontinuity. Jumps within the duplicate tolerance of
    /// the previous one are the same jump reported twice and are dropped.
    pub fn on_time_jump(
        &mut self,
        now_ms: i64,
        media_position: Option<MediaTime>,
        first_ready_known: bool,
    ) -> bool {
        if self
            .last_jump_ms
            .is_some_and(|last| now_ms - last <= self.duplicate_tolerance_ms)
        {
            return false;
        }
        self.last_jump_ms = Some(now_ms);
        self.window = Some(SeekWindow {
            started_at_ms: now_ms,
            media_position,
            after_first_ready: first_ready_known,
        });
        true
    }

    /// Consumes the candidate if it can still be confirmed at `now_ms`.
    ///
    /// Candidates older than the max seek operation, or seen before the
    /// first ready state, are discarded.
    pub fn take_confirmable(&mut self, now_ms: i64) -> Option<SeekWindow> {
        let window = self.window.take()?;
        let elapsed = now_ms - window.started_at_ms;
        (window.after_first_ready && elapsed <= self.max_seek_operation_ms).then_some(window)
    }

    /// A candidate exists that could still be confirmed at `now_ms`.
    pub fn is_pending(&self, now_ms: i64) -> bool {
        self.window.as_ref().is_some_and(|window| {
            window.after_first_ready && now_ms - window.started_at_ms <= self.max_seek_operation_ms
        })
    }

    pub fn candidate(&self) -> Option<&SeekWindow> {
        self.window.as_ref()
    }

    pub fn clear(&mut self) {
        self.window = None;
    }

    pub fn reset(&mut self) {
        self.window = None;
        self.last_jump_ms = None;
    }
}
