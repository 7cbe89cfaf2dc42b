//! Static city catalog and coordinate primitives.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use twox_hash::XxHash64;

const CITY_ID_DOMAIN: u64 = 0x4745_4f53; // "GEOS"

/// Stable numeric identifier derived from a city name.
///
/// The catalog file carries no explicit ids; hashing the folded name keeps
/// ids stable when the file is reordered or extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(pub u64);

impl CityId {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(XxHash64::oneshot(
            CITY_ID_DOMAIN,
            name.trim().to_lowercase().as_bytes(),
        ))
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Ordinal difficulty tier; lower tiers are easier and selected first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(pub u8);

impl Difficulty {
    pub const EASIEST: Self = Self(1);
    pub const HARDEST: Self = Self(5);

    /// Clamp an arbitrary tier value into the supported range.
    #[must_use]
    pub fn clamped(value: u8) -> Self {
        Self(value.clamp(Self::EASIEST.0, Self::HARDEST.0))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(2)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both coordinates fall inside the WGS84 envelope.
    #[must_use]
    pub fn is_valid(self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A candidate location in the catalog. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl City {
    #[must_use]
    pub fn id(&self) -> CityId {
        CityId::from_name(&self.name)
    }

    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Validation failures for a loaded catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate city name: {name}")]
    DuplicateName { name: String },
    #[error("city {name} has coordinates outside the WGS84 envelope")]
    InvalidCoordinates { name: String },
    #[error("city {name} has difficulty {value}, expected 1..=5")]
    InvalidDifficulty { name: String, value: u8 },
}

/// Container for all candidate cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CityCatalog {
    pub cities: Vec<City>,
}

impl CityCatalog {
    /// Create an empty catalog (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self { cities: Vec::new() }
    }

    /// Create a catalog from pre-parsed cities.
    #[must_use]
    pub fn from_cities(cities: Vec<City>) -> Self {
        Self { cities }
    }

    /// Load a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid city data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Embedded default catalog shipped with the crate.
    #[must_use]
    pub fn default_catalog() -> Self {
        serde_json::from_str(include_str!("../assets/cities.json"))
            .expect("embedded catalog is valid JSON")
    }

    /// Check structural invariants: unique folded names, coordinates inside
    /// the WGS84 envelope, difficulty tiers inside 1..=5.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = std::collections::HashSet::new();
        for city in &self.cities {
            let folded = city.name.trim().to_lowercase();
            if !seen.insert(folded) {
                return Err(CatalogError::DuplicateName {
                    name: city.name.clone(),
                });
            }
            if !city.point().is_valid() {
                return Err(CatalogError::InvalidCoordinates {
                    name: city.name.clone(),
                });
            }
            if city.difficulty < Difficulty::EASIEST || city.difficulty > Difficulty::HARDEST {
                return Err(CatalogError::InvalidDifficulty {
                    name: city.name.clone(),
                    value: city.difficulty.get(),
                });
            }
        }
        Ok(())
    }

    /// Cities whose difficulty is at or below the given ceiling.
    #[must_use]
    pub fn filtered(&self, ceiling: Difficulty) -> Vec<&City> {
        self.cities
            .iter()
            .filter(|city| city.difficulty <= ceiling)
            .collect()
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&City> {
        let folded = name.trim().to_lowercase();
        self.cities
            .iter()
            .find(|city| city.name.to_lowercase() == folded)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CityCatalog {
        CityCatalog::from_cities(vec![
            City {
                name: "Moscow".to_string(),
                lat: 55.7558,
                lon: 37.6173,
                difficulty: Difficulty(1),
            },
            City {
                name: "Kazan".to_string(),
                lat: 55.7963,
                lon: 49.1088,
                difficulty: Difficulty(2),
            },
        ])
    }

    #[test]
    fn catalog_parses_from_json() {
        let json = r#"{
            "cities": [
                { "name": "Moscow", "lat": 55.7558, "lon": 37.6173, "difficulty": 1 },
                { "name": "Kazan", "lat": 55.7963, "lon": 49.1088 }
            ]
        }"#;
        let catalog = CityCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.cities[0].difficulty, Difficulty(1));
        // difficulty falls back to the default tier when omitted
        assert_eq!(catalog.cities[1].difficulty, Difficulty::default());
    }

    #[test]
    fn filtered_respects_ceiling() {
        let catalog = sample();
        let easy = catalog.filtered(Difficulty(1));
        assert_eq!(easy.len(), 1);
        assert_eq!(easy[0].name, "Moscow");
        assert_eq!(catalog.filtered(Difficulty(5)).len(), 2);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = sample();
        assert!(catalog.get(" moscow ").is_some());
        assert!(catalog.get("MOSCOW").is_some());
        assert!(catalog.get("Minsk").is_none());
    }

    #[test]
    fn city_id_is_stable_across_case_and_padding() {
        assert_eq!(CityId::from_name("Moscow"), CityId::from_name(" moscow "));
        assert_ne!(CityId::from_name("Moscow"), CityId::from_name("Kazan"));
    }

    #[test]
    fn validate_rejects_duplicates_and_bad_coords() {
        let mut catalog = sample();
        catalog.cities.push(City {
            name: "MOSCOW".to_string(),
            lat: 55.0,
            lon: 37.0,
            difficulty: Difficulty(1),
        });
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::DuplicateName { .. })
        ));

        let bad = CityCatalog::from_cities(vec![City {
            name: "Nowhere".to_string(),
            lat: 123.0,
            lon: 37.0,
            difficulty: Difficulty(1),
        }]);
        assert!(matches!(
            bad.validate(),
            Err(CatalogError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn embedded_catalog_is_valid() {
        let catalog = CityCatalog::default_catalog();
        assert!(!catalog.is_empty());
        catalog.validate().unwrap();
        // the easiest tier must never be empty or default settings could
        // strand the round selector
        assert!(!catalog.filtered(Difficulty::EASIEST).is_empty());
    }
}
