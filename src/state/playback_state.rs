use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Setup,
    Buffering,
    Error,
    Playing,
    Paused,
    QualityChange,
    Seeking,
    SubtitleChange,
    AudioChange,
    Ad,
    AdFinished,
    PlayAttemptFailed,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Setup => "setup",
            PlaybackState::Buffering => "buffering",
            PlaybackState::Error => "error",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::QualityChange => "qualitychange",
            PlaybackState::Seeking => "seeking",
            PlaybackState::SubtitleChange => "subtitlechange",
            PlaybackState::AudioChange => "audiochange",
            PlaybackState::Ad => "ad",
            PlaybackState::AdFinished => "adfinished",
            PlaybackState::PlayAttemptFailed => "playattemptfailed",
        }
    }

    /// Playing, Paused or Buffering.
    pub fn is_steady(&self) -> bool {
        matches!(
            self,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Buffering
        )
    }

    /// States that must be left again right after they were entered.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackState::QualityChange
                | PlaybackState::SubtitleChange
                | PlaybackState::AudioChange
                | PlaybackState::Seeking
        )
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
