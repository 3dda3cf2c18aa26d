use serde::{Deserialize, Serialize};

/// Why a session never reached its first play-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartFailureReason {
    Timeout,
    PlayerError,
    PageClosed,
    Unknown,
}

impl StartFailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartFailureReason::Timeout => "TIMEOUT",
            StartFailureReason::PlayerError => "PLAYER_ERROR",
            StartFailureReason::PageClosed => "PAGE_CLOSED",
            StartFailureReason::Unknown => "UNKNOWN",
        }
    }
}

/// Error reported by a player backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ErrorPayload {
    pub const UNKNOWN_CODE: i64 = 1;
    pub const UNKNOWN_MESSAGE: &'static str = "Unknown";

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN_CODE, Self::UNKNOWN_MESSAGE)
    }

    /// Fills whatever the backend left out with the unknown defaults.
    pub fn from_parts(code: Option<i64>, message: Option<String>) -> Self {
        Self::new(
            code.unwrap_or(Self::UNKNOWN_CODE),
            message
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| Self::UNKNOWN_MESSAGE.to_string()),
        )
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl Default for ErrorPayload {
    fn default() -> Self {
        Self::unknown()
    }
}
