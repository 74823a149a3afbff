//! User preferences.

use serde::{Deserialize, Serialize};

/// Player-facing toggles persisted by the platform layer. Loading always
/// yields a full struct: missing fields take the defaults below and
/// malformed payloads fall back entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    pub haptics: bool,
    pub sounds: bool,
    pub dark_mode: bool,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            haptics: true,
            sounds: false,
            dark_mode: false,
        }
    }
}

impl Prefs {
    /// Parse persisted prefs, falling back to defaults on malformed data.
    #[must_use]
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
