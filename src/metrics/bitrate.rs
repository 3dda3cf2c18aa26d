use crate::models::AccessLogEntry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitrateSample {
    pub indicated_bitrate: f64,
}

impl BitrateSample {
    /// `None` for non-finite or non-positive bitrates.
    pub fn new(indicated_bitrate: f64) -> Option<Self> {
        (indicated_bitrate.is_finite() && indicated_bitrate > 0.0)
            .then_some(Self { indicated_bitrate })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BitrateChange {
    /// First sample of the session. Not a user-visible change.
    Initial(f64),
    Unchanged,
    Changed { previous: f64, current: f64 },
}

/// Last-known video bitrate of a session.
#[derive(Debug, Clone, Default)]
pub struct BitrateSampler {
    last: Option<BitrateSample>,
}

impl BitrateSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_known(&self) -> Option<f64> {
        self.last.map(|sample| sample.indicated_bitrate)
    }

    /// Classifies `sample` against the last-known bitrate without storing it.
    pub fn peek(&self, sample: BitrateSample) -> BitrateChange {
        match self.last {
            None => BitrateChange::Initial(sample.indicated_bitrate),
            Some(last) if last == sample => BitrateChange::Unchanged,
            Some(last) => BitrateChange::Changed {
                previous: last.indicated_bitrate,
                current: sample.indicated_bitrate,
            },
        }
    }

    pub fn commit(&mut self, sample: BitrateSample) {
        self.last = Some(sample);
    }

    /// Classifies and stores `sample`.
    pub fn observe(&mut self, sample: BitrateSample) -> BitrateChange {
        let change = self.peek(sample);
        self.commit(sample);
        change
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Exact comparison of two optional bitrates.
    pub fn did_change(old: Option<u64>, new: Option<u64>) -> bool {
        old != new
    }

    /// The entry currently being watched: the last one with watched time.
    pub fn latest_watched_entry(entries: &[AccessLogEntry]) -> Option<&AccessLogEntry> {
        entries
            .iter()
            .rev()
            .find(|entry| entry.duration_watched_secs > 0.0)
    }
}
