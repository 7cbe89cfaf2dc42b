//! Geosight Game Engine
//!
//! Platform-agnostic core logic for the Geosight satellite guessing game.
//! This crate provides round selection, guess evaluation, quiz generation,
//! statistics, and remote mirroring without UI or platform-specific
//! dependencies. Map rendering and the hosted store are modeled as opaque
//! collaborators behind traits and plain-data directives.

use log::warn;

pub mod catalog;
pub mod hints;
pub mod map;
pub mod quiz;
pub mod rng;
pub mod round;
pub mod select;
pub mod session;
pub mod settings;
pub mod stats;
pub mod suggest;
pub mod sync;
pub mod timer;

// Re-export commonly used types
pub use catalog::{CatalogError, City, CityCatalog, CityId, Difficulty, GeoPoint};
pub use hints::{Hint, HintBook, HintCursor, HintKind};
pub use map::{MapBehaviors, MapCamera, MapDirective, Marker, MarkerIcon};
pub use quiz::{QUIZ_OPTION_COUNT, QuizSheet};
pub use rng::{CountingRng, RngBundle};
pub use round::{
    AttemptPolicy, GuessOutcome, RoundError, RoundId, RoundPhase, RoundState, normalize_guess,
};
pub use select::{DEFAULT_JITTER_RADIUS, SelectError, jitter_point, pick_city};
pub use session::{
    GameSession, GuessReport, HintReport, RoundResolution, RoundSetup, SessionError, TimerEvent,
};
pub use settings::{GameSettings, MapStyle};
pub use stats::{CityRecord, RemoteCityStats, RemoteStats, StatsRecord, StatsSource, StatsView};
pub use suggest::{MAX_SUGGESTIONS, MIN_QUERY_LEN, SuggestIndex};
pub use sync::{
    RemoteSnapshot, RemoteStatsStore, StatsUpdate, SyncError, SyncQueue, anonymous_user_id,
};
pub use timer::{AUTO_RESTART_DELAY_MS, TimerKind, TimerQueue, TimerTask};

/// Trait for abstracting static data loading.
/// Platform-specific implementations should provide this.
pub trait CatalogSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the city catalog from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<CityCatalog, Self::Error>;

    /// Load the hint book from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the hint data cannot be loaded.
    fn load_hints(&self) -> Result<HintBook, Self::Error>;
}

/// Trait for abstracting the persisted player profile.
/// Platform-specific implementations should provide this.
pub trait ProfileStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be saved.
    fn save_settings(&self, settings: &GameSettings) -> Result<(), Self::Error>;

    /// Load persisted settings, `None` on a fresh profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload exists but cannot be read.
    fn load_settings(&self) -> Result<Option<GameSettings>, Self::Error>;

    /// Persist statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics cannot be saved.
    fn save_stats(&self, stats: &StatsRecord) -> Result<(), Self::Error>;

    /// Load persisted statistics, `None` on a fresh profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload exists but cannot be read.
    fn load_stats(&self) -> Result<Option<StatsRecord>, Self::Error>;

    /// Remove persisted statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics cannot be removed.
    fn clear_stats(&self) -> Result<(), Self::Error>;
}

/// Errors for file/JSON-backed profile storage adapters. Malformed
/// persisted state is recovered by falling back to defaults, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("persisted state is malformed: {0}")]
    InvalidPersistedState(#[from] serde_json::Error),
}

/// Main engine binding a catalog source and profile storage.
pub struct GameEngine<L, S>
where
    L: CatalogSource,
    S: ProfileStorage,
{
    source: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: CatalogSource,
    S: ProfileStorage,
{
    /// Create a new engine with the provided catalog source and storage.
    pub const fn new(source: L, storage: S) -> Self {
        Self { source, storage }
    }

    /// Build a session from persisted state. The catalog is required and
    /// validated; hints, settings, and statistics degrade to defaults
    /// when missing or malformed, with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error only when the catalog cannot be loaded or fails
    /// validation.
    pub fn start_session(&self, seed: u64, user_id: String) -> Result<GameSession, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let catalog = self.source.load_catalog().map_err(Into::into)?;
        catalog.validate()?;

        let hints = match self.source.load_hints() {
            Ok(hints) => hints,
            Err(err) => {
                warn!("hint data unavailable, continuing without hints: {err}");
                HintBook::empty()
            }
        };
        let settings = match self.storage.load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => GameSettings::default(),
            Err(err) => {
                warn!("stored settings unreadable, using defaults: {err}");
                GameSettings::default()
            }
        };
        let stats = match self.storage.load_stats() {
            Ok(Some(stats)) => stats,
            Ok(None) => StatsRecord::default(),
            Err(err) => {
                warn!("stored statistics unreadable, starting fresh: {err}");
                StatsRecord::default()
            }
        };

        Ok(GameSession::new(
            settings, catalog, hints, stats, seed, user_id,
        ))
    }

    /// Persist the session's settings and statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if either document cannot be saved.
    pub fn persist(&self, session: &GameSession) -> Result<(), S::Error> {
        self.storage.save_settings(session.settings())?;
        self.storage.save_stats(session.stats())
    }

    /// Wipe the session's statistics and the persisted copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted statistics cannot be cleared.
    pub fn reset_profile(&self, session: &mut GameSession) -> Result<(), S::Error> {
        session.reset_stats();
        self.storage.clear_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Copy, Default)]
    struct FixtureSource;

    impl CatalogSource for FixtureSource {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<CityCatalog, Self::Error> {
            Ok(CityCatalog::from_cities(vec![
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
            ]))
        }

        fn load_hints(&self) -> Result<HintBook, Self::Error> {
            Ok(HintBook::empty())
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        settings: Rc<RefCell<Option<GameSettings>>>,
        stats: Rc<RefCell<Option<StatsRecord>>>,
    }

    impl ProfileStorage for MemoryStorage {
        type Error = Infallible;

        fn save_settings(&self, settings: &GameSettings) -> Result<(), Self::Error> {
            *self.settings.borrow_mut() = Some(*settings);
            Ok(())
        }

        fn load_settings(&self) -> Result<Option<GameSettings>, Self::Error> {
            Ok(*self.settings.borrow())
        }

        fn save_stats(&self, stats: &StatsRecord) -> Result<(), Self::Error> {
            *self.stats.borrow_mut() = Some(stats.clone());
            Ok(())
        }

        fn load_stats(&self) -> Result<Option<StatsRecord>, Self::Error> {
            Ok(self.stats.borrow().clone())
        }

        fn clear_stats(&self) -> Result<(), Self::Error> {
            *self.stats.borrow_mut() = None;
            Ok(())
        }
    }

    /// Storage whose reads always fail, for fallback tests.
    #[derive(Clone, Copy, Default)]
    struct CorruptStorage;

    #[derive(Debug, thiserror::Error)]
    #[error("corrupt payload")]
    struct Corrupt;

    impl ProfileStorage for CorruptStorage {
        type Error = Corrupt;

        fn save_settings(&self, _settings: &GameSettings) -> Result<(), Self::Error> {
            Ok(())
        }

        fn load_settings(&self) -> Result<Option<GameSettings>, Self::Error> {
            Err(Corrupt)
        }

        fn save_stats(&self, _stats: &StatsRecord) -> Result<(), Self::Error> {
            Ok(())
        }

        fn load_stats(&self) -> Result<Option<StatsRecord>, Self::Error> {
            Err(Corrupt)
        }

        fn clear_stats(&self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn engine_persists_and_restores_a_profile() {
        let storage = MemoryStorage::default();
        let engine = GameEngine::new(FixtureSource, storage.clone());
        let mut session = engine.start_session(0xABCD, "anon-a".to_string()).unwrap();

        session.start_round(0).unwrap();
        let target = session.round().unwrap().city.name.clone();
        session.submit_guess(&target, 1_000).unwrap();
        engine.persist(&session).unwrap();

        let restored = engine.start_session(0xABCD, "anon-a".to_string()).unwrap();
        assert_eq!(restored.stats().total_rounds, 1);
        assert_eq!(restored.stats().current_streak, 1);
    }

    #[test]
    fn corrupt_profile_falls_back_to_defaults() {
        let engine = GameEngine::new(FixtureSource, CorruptStorage);
        let session = engine.start_session(1, "anon-b".to_string()).unwrap();
        assert_eq!(session.stats().total_rounds, 0);
        assert_eq!(*session.settings(), GameSettings::default());
    }

    #[test]
    fn reset_profile_clears_local_and_persisted_state() {
        let storage = MemoryStorage::default();
        let engine = GameEngine::new(FixtureSource, storage.clone());
        let mut session = engine.start_session(2, "anon-c".to_string()).unwrap();
        session.start_round(0).unwrap();
        let target = session.round().unwrap().city.name.clone();
        session.submit_guess(&target, 500).unwrap();
        engine.persist(&session).unwrap();

        engine.reset_profile(&mut session).unwrap();
        assert_eq!(session.stats().total_rounds, 0);
        assert!(storage.stats.borrow().is_none());
    }
}
