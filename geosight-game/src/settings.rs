//! Player-facing configuration, persisted between sessions.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::Difficulty;
use crate::round::AttemptPolicy;

/// Bounds for a limited attempt budget after sanitization.
pub const MIN_ATTEMPTS: u32 = 1;
pub const MAX_ATTEMPTS: u32 = 10;

/// Base layer requested from the map collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    #[default]
    Satellite,
    Map,
    Hybrid,
}

impl MapStyle {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Satellite => "satellite",
            Self::Map => "map",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for MapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "satellite" => Ok(Self::Satellite),
            "map" => Ok(Self::Map),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(()),
        }
    }
}

/// Flat settings record, read at startup and written on save. Every field
/// carries a serde default so a partially valid payload still loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub map_style: MapStyle,
    pub attempts: AttemptPolicy,
    pub difficulty_ceiling: Difficulty,
    pub hints_enabled: bool,
    pub auto_restart: bool,
    pub quiz_mode: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            map_style: MapStyle::Satellite,
            attempts: AttemptPolicy::default(),
            difficulty_ceiling: Difficulty::default(),
            hints_enabled: true,
            auto_restart: false,
            quiz_mode: false,
        }
    }
}

impl GameSettings {
    /// Clamp persisted values into supported ranges. A limited attempt
    /// budget of zero would start rounds already exhausted, so it is
    /// raised to the minimum.
    pub fn sanitize(&mut self) {
        if let AttemptPolicy::Limited(count) = self.attempts {
            self.attempts = AttemptPolicy::Limited(count.clamp(MIN_ATTEMPTS, MAX_ATTEMPTS));
        }
        self.difficulty_ceiling = Difficulty::clamped(self.difficulty_ceiling.get());
    }

    /// Load settings from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed; callers recover by
    /// falling back to defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
