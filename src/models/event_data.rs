use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::MediaTime;
use crate::metrics::DownloadSpeedInfo;
use crate::settings::{CollectorConfig, SourceMetadata};
use crate::state::PlaybackState;

use super::error::StartFailureReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Dash,
    Hls,
    Progressive,
}

impl StreamType {
    /// Guesses the stream format from the URL's file extension.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.to_ascii_lowercase();
        let path = path.split(['?', '#']).next().unwrap_or_default();

        if path.ends_with(".m3u8") {
            Some(StreamType::Hls)
        } else if [".mp4", ".m4v", ".m4a", ".webm"]
            .iter()
            .any(|suffix| path.ends_with(suffix))
        {
            Some(StreamType::Progressive)
        } else if path.ends_with(".mpd") {
            Some(StreamType::Dash)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Dash => "dash",
            StreamType::Hls => "hls",
            StreamType::Progressive => "progressive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrmType {
    Widevine,
    PlayReady,
    Fairplay,
    ClearKey,
}

/// Which adapter produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Sdk,
    Native,
}

impl PlayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerKind::Sdk => "sdk",
            PlayerKind::Native => "native",
        }
    }

    pub fn tech(&self) -> &'static str {
        match self {
            PlayerKind::Sdk => "rust:sdk",
            PlayerKind::Native => "rust:native",
        }
    }
}

/// Point-in-time view of a session and its player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub impression_id: Uuid,
    pub player: PlayerKind,
    pub player_tech: String,
    pub version: Option<String>,
    pub state: PlaybackState,

    pub stream_format: Option<StreamType>,
    pub mpd_url: Option<String>,
    pub m3u8_url: Option<String>,
    pub prog_url: Option<String>,

    pub video_duration_ms: Option<i64>,
    pub is_live: bool,
    pub is_casting: bool,
    pub is_muted: bool,

    pub video_bitrate: Option<f64>,
    pub audio_bitrate: Option<f64>,
    pub video_playback_width: Option<u32>,
    pub video_playback_height: Option<u32>,
    pub video_codec: Option<String>,

    pub subtitle_enabled: bool,
    pub subtitle_language: Option<String>,
    pub audio_language: Option<String>,

    pub drm_type: Option<DrmType>,
    pub drm_load_time_ms: Option<i64>,

    pub startup_time_ms: Option<i64>,
    pub video_time_start: Option<MediaTime>,
    pub video_time_end: Option<MediaTime>,
    pub download_speed: DownloadSpeedInfo,

    pub source: SourceMetadata,

    pub video_start_failed: bool,
    pub video_start_failed_reason: Option<StartFailureReason>,
}

impl EventData {
    pub fn new(config: &CollectorConfig, impression_id: Uuid, player: PlayerKind) -> Self {
        Self {
            impression_id,
            player,
            player_tech: player.tech().to_string(),
            version: None,
            state: PlaybackState::Setup,
            stream_format: None,
            mpd_url: None,
            m3u8_url: None,
            prog_url: None,
            video_duration_ms: None,
            is_live: config.live_default(),
            is_casting: false,
            is_muted: false,
            video_bitrate: None,
            audio_bitrate: None,
            video_playback_width: None,
            video_playback_height: None,
            video_codec: None,
            subtitle_enabled: false,
            subtitle_language: None,
            audio_language: None,
            drm_type: None,
            drm_load_time_ms: None,
            startup_time_ms: None,
            video_time_start: None,
            video_time_end: None,
            download_speed: DownloadSpeedInfo::default(),
            source: config.source.clone(),
            video_start_failed: false,
            video_start_failed_reason: None,
        }
    }

    /// Records the stream format and stores the URL in the matching field.
    pub fn set_stream(&mut self, format: StreamType, url: impl Into<String>) {
        let url = Some(url.into());
        self.stream_format = Some(format);
        match format {
            StreamType::Dash => self.mpd_url = url,
            StreamType::Hls => self.m3u8_url = url,
            StreamType::Progressive => self.prog_url = url,
        }
    }

    pub fn set_start_failure(&mut self, reason: Option<StartFailureReason>) {
        self.video_start_failed = reason.is_some();
        self.video_start_failed_reason = reason;
    }
}

/// Player-reported live flag once the player is ready, the configured one
/// before that.
pub fn resolve_is_live(player_ready: bool, from_config: bool, from_player: bool) -> bool {
    if player_ready {
        from_player
    } else {
        from_config
    }
}
