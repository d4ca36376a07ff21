//! Shared types for the avatar kiosk workspace.
//!
//! This crate holds the data model shared by the voice proxy, the session
//! controller and the server: voice options, avatar presets, the session
//! configuration with its compiled-in defaults, and the mirror of the SDK's
//! session and connection-quality states.
//!
//! The SDK owns the session state machine; the enums here only mirror the
//! states it reports so the rest of the workspace can react to them.

pub mod preset;
pub mod voice;

pub use preset::{find_preset, AvatarPreset};
pub use voice::{extract_voice_items, normalize_voices, VoiceListResponse, VoiceOption};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Emotions accepted by the avatar voice.
pub const VOICE_EMOTIONS: &[&str] = &["excited", "serious", "friendly", "soothing", "broadcaster"];

/// Session durations offered in the settings form, in minutes.
pub const TIMER_PRESETS_MINUTES: &[u32] = &[5, 10, 15, 20];

/// Session lifecycle states reported by the avatar SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// No session has been started.
    #[default]
    Inactive,
    /// The SDK is establishing the connection.
    Connecting,
    /// The avatar stream is live.
    Connected,
    /// The session ended.
    Disconnected,
}

impl SessionState {
    /// Returns `true` while a session is live or being established.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

/// Connection quality reported by the SDK while connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionQuality {
    #[default]
    Unknown,
    Good,
    Bad,
}

impl fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "UNKNOWN",
            Self::Good => "GOOD",
            Self::Bad => "BAD",
        };
        f.write_str(label)
    }
}

/// Which surface of the kiosk is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionMode {
    /// Full voice session driven by the SDK's own conversation engine.
    #[default]
    Full,
    /// Custom session where the host drives the avatar with text.
    Custom,
}

/// Error returned when parsing an unknown [`SessionMode`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown session mode: {0}")]
pub struct ParseSessionModeError(pub String);

impl FromStr for SessionMode {
    type Err = ParseSessionModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FULL" => Ok(Self::Full),
            "CUSTOM" => Ok(Self::Custom),
            _ => Err(ParseSessionModeError(s.to_string())),
        }
    }
}

/// Compiled-in fallbacks used when the settings store holds no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub avatar_id: String,
    pub voice_id: String,
    pub language: String,
    pub emotion: String,
    pub context_id: String,
    /// Image shown while no session is live.
    pub background_image: Option<String>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            avatar_id: String::new(),
            voice_id: String::new(),
            language: "en".to_string(),
            emotion: "friendly".to_string(),
            context_id: String::new(),
            background_image: Some("/headshot.png".to_string()),
        }
    }
}

/// The locally owned configuration of an avatar session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Avatar override; empty means "use the SDK token's avatar".
    pub avatar_id: String,
    pub voice_id: String,
    pub language: String,
    pub emotion: String,
    pub context_id: String,
    pub background_image: Option<String>,
    pub timer_duration_minutes: Option<u32>,
}

impl From<&SessionDefaults> for SessionConfig {
    fn from(defaults: &SessionDefaults) -> Self {
        Self {
            avatar_id: defaults.avatar_id.clone(),
            voice_id: defaults.voice_id.clone(),
            language: defaults.language.clone(),
            emotion: defaults.emotion.clone(),
            context_id: defaults.context_id.clone(),
            background_image: defaults.background_image.clone(),
            timer_duration_minutes: None,
        }
    }
}

impl SessionConfig {
    /// Builds the payload handed to the host when it should start a fresh
    /// session with this configuration. Empty ids are sent as absent.
    pub fn restart_config(&self) -> RestartConfig {
        RestartConfig {
            avatar_id: non_empty(&self.avatar_id),
            language: Some(self.language.clone()),
            emotion: Some(self.emotion.clone()),
            context_id: non_empty(&self.context_id),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Configuration passed to the host's restart callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

/// Snapshot of the session countdown.
///
/// `remaining_seconds` is only set while the session is connected and a
/// duration was configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub duration_minutes: Option<u32>,
    pub remaining_seconds: Option<u64>,
}

impl TimerState {
    /// Formats the remaining time as `m:ss`, or `None` when no countdown runs.
    pub fn display(&self) -> Option<String> {
        self.remaining_seconds
            .filter(|secs| *secs > 0)
            .map(|secs| format!("{}:{:02}", secs / 60, secs % 60))
    }
}

/// Voice chat flags reported by the SDK.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceChatStatus {
    pub active: bool,
    pub muted: bool,
    pub loading: bool,
    pub avatar_talking: bool,
    pub user_talking: bool,
}

/// Parses a custom session duration typed by the user.
///
/// Only positive whole minutes are accepted; anything else clears the timer.
pub fn parse_custom_duration(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|minutes| *minutes > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_config_omits_empty_ids() {
        let config = SessionConfig::from(&SessionDefaults::default());
        let restart = config.restart_config();

        assert_eq!(restart.avatar_id, None);
        assert_eq!(restart.context_id, None);
        assert_eq!(restart.language.as_deref(), Some("en"));
        assert_eq!(restart.emotion.as_deref(), Some("friendly"));

        let json = serde_json::to_value(&restart).unwrap();
        assert!(json.get("avatar_id").is_none());
        assert_eq!(json["language"], "en");
    }

    #[test]
    fn custom_duration_requires_positive_minutes() {
        assert_eq!(parse_custom_duration("12"), Some(12));
        assert_eq!(parse_custom_duration(" 3 "), Some(3));
        assert_eq!(parse_custom_duration("0"), None);
        assert_eq!(parse_custom_duration("-4"), None);
        assert_eq!(parse_custom_duration("abc"), None);
    }

    #[test]
    fn timer_display_formats_minutes_and_seconds() {
        let timer = TimerState {
            duration_minutes: Some(5),
            remaining_seconds: Some(65),
        };
        assert_eq!(timer.display().as_deref(), Some("1:05"));
        assert_eq!(TimerState::default().display(), None);
    }

    #[test]
    fn session_mode_parses_case_insensitively() {
        assert_eq!("custom".parse::<SessionMode>(), Ok(SessionMode::Custom));
        assert_eq!("FULL".parse::<SessionMode>(), Ok(SessionMode::Full));
        assert!("voice".parse::<SessionMode>().is_err());
    }

    #[test]
    fn session_state_serializes_like_the_sdk() {
        let json = serde_json::to_string(&SessionState::Connected).unwrap();
        assert_eq!(json, "\"CONNECTED\"");
        assert!(SessionState::Connecting.is_live());
        assert!(!SessionState::Disconnected.is_live());
    }
}
