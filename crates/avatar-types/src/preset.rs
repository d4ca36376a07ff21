//! Avatar presets: named pairings of an avatar and a knowledge-base context.

use serde::{Deserialize, Serialize};

/// A one-click avatar configuration.
///
/// Selecting a preset always replaces the avatar id and the context id
/// together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarPreset {
    pub name: String,
    pub avatar_id: String,
    pub context_id: String,
}

impl AvatarPreset {
    pub fn new(
        name: impl Into<String>,
        avatar_id: impl Into<String>,
        context_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            avatar_id: avatar_id.into(),
            context_id: context_id.into(),
        }
    }

    /// Returns `true` when both ids match the given configuration.
    pub fn matches(&self, avatar_id: &str, context_id: &str) -> bool {
        self.avatar_id == avatar_id && self.context_id == context_id
    }
}

/// Finds the preset matching the current avatar/context pair, if any.
pub fn find_preset<'a>(
    presets: &'a [AvatarPreset],
    avatar_id: &str,
    context_id: &str,
) -> Option<&'a AvatarPreset> {
    presets.iter().find(|p| p.matches(avatar_id, context_id))
}
