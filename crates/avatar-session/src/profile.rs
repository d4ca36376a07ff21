//! Per-app session profiles.
//!
//! Each branded kiosk ships a TOML profile naming its mode, its compiled-in
//! defaults and its preset catalog. Every section is optional.
//!
//! ```toml
//! mode = "FULL"
//! restart_on_expiry = false
//!
//! [defaults]
//! language = "en"
//! emotion = "friendly"
//!
//! [[presets]]
//! name = "Jane Doe"
//! avatar_id = "..."
//! context_id = "..."
//! ```

use avatar_types::{AvatarPreset, SessionDefaults, SessionMode};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionProfile {
    pub mode: SessionMode,
    /// Ask the host for a fresh session when the countdown expires.
    pub restart_on_expiry: bool,
    pub defaults: SessionDefaults,
    pub presets: Vec<AvatarPreset>,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read session profile: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse session profile: {0}")]
    Parse(#[from] toml::de::Error),
}

impl SessionProfile {
    pub fn from_toml(contents: &str) -> Result<Self, ProfileError> {
        Ok(toml::from_str(contents)?)
    }
}

/// Reads a profile from disk.
pub fn load_profile(path: impl AsRef<Path>) -> Result<SessionProfile, ProfileError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let profile = SessionProfile::from_toml(&contents)?;
    tracing::debug!(
        path = %path.display(),
        mode = ?profile.mode,
        presets = profile.presets.len(),
        "loaded session profile"
    );
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_profile_uses_defaults() {
        let profile = SessionProfile::from_toml("").unwrap();
        assert_eq!(profile.mode, SessionMode::Full);
        assert!(!profile.restart_on_expiry);
        assert_eq!(profile.defaults, SessionDefaults::default());
        assert!(profile.presets.is_empty());
    }

    #[test]
    fn partial_defaults_keep_the_rest() {
        let profile = SessionProfile::from_toml(
            r#"
mode = "CUSTOM"

[defaults]
language = "es"
"#,
        )
        .unwrap();

        assert_eq!(profile.mode, SessionMode::Custom);
        assert_eq!(profile.defaults.language, "es");
        assert_eq!(profile.defaults.emotion, "friendly");
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let err = SessionProfile::from_toml(r#"mode = "VOICE""#).unwrap_err();
        assert!(matches!(err, ProfileError::Parse(_)));
    }

    #[test]
    fn bundled_profile_loads() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../profiles/nurs-6286.toml");
        let profile = load_profile(path).unwrap();

        assert_eq!(profile.presets.len(), 5);
        assert!(profile.presets.iter().any(|p| p.name == "Jane Doe"));
        assert_eq!(profile.defaults.background_image.as_deref(), Some("/headshot.png"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_profile(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ProfileError::FileRead(_)));
    }
}
