//! Landmark hints shown on the map during a round.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::catalog::GeoPoint;

/// Category of a landmark hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintKind {
    Landmark,
    Museum,
    Historical,
    Religious,
    Nature,
    Industrial,
    Infrastructure,
    Education,
    Tourist,
    Navigation,
    Geography,
    Street,
    Park,
}

impl HintKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landmark => "landmark",
            Self::Museum => "museum",
            Self::Historical => "historical",
            Self::Religious => "religious",
            Self::Nature => "nature",
            Self::Industrial => "industrial",
            Self::Infrastructure => "infrastructure",
            Self::Education => "education",
            Self::Tourist => "tourist",
            Self::Navigation => "navigation",
            Self::Geography => "geography",
            Self::Street => "street",
            Self::Park => "park",
        }
    }
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One landmark near a catalog city, placed on the map as a hint marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub text: String,
    pub kind: HintKind,
}

impl Hint {
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Hints grouped per city name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HintBook {
    pub cities: HashMap<String, Vec<Hint>>,
}

impl HintBook {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            cities: HashMap::new(),
        }
    }

    /// Load a hint book from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid hint data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Embedded default hint book shipped with the crate.
    #[must_use]
    pub fn default_book() -> Self {
        serde_json::from_str(include_str!("../assets/hints.json"))
            .expect("embedded hint book is valid JSON")
    }

    /// Hints for a city, empty when none exist. Lookup is case-insensitive.
    #[must_use]
    pub fn hints_for(&self, city_name: &str) -> &[Hint] {
        if let Some(hints) = self.cities.get(city_name) {
            return hints;
        }
        let folded = city_name.trim().to_lowercase();
        self.cities
            .iter()
            .find(|(name, _)| name.to_lowercase() == folded)
            .map_or(&[], |(_, hints)| hints.as_slice())
    }

    #[must_use]
    pub fn has_hints(&self, city_name: &str) -> bool {
        !self.hints_for(city_name).is_empty()
    }
}

/// Cycling cursor over a round's hints, wrapping back to the first hint
/// after the last one was shown. Reset when a new round starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintCursor {
    next: usize,
}

impl HintCursor {
    pub fn advance<'a>(&mut self, hints: &'a [Hint]) -> Option<&'a Hint> {
        if hints.is_empty() {
            return None;
        }
        if self.next >= hints.len() {
            self.next = 0;
        }
        let hint = &hints[self.next];
        self.next += 1;
        Some(hint)
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}
