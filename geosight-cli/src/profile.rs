//! File-backed profile storage and remote mirror for the terminal build.
//!
//! The browser build keeps these documents in browser storage and a hosted
//! database; here they live as JSON files under the profile directory so a
//! terminal session has the same durable profile semantics.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use geosight_game::{
    CatalogSource, CityCatalog, GameSettings, HintBook, ProfileError, ProfileStorage,
    RemoteCityStats, RemoteStats, RemoteStatsStore, StatsRecord, anonymous_user_id,
};

const SETTINGS_FILE: &str = "settings.json";
const STATS_FILE: &str = "stats.json";
const USER_ID_FILE: &str = "user_id";

/// Catalog source backed by the assets embedded in the game crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSource;

impl CatalogSource for EmbeddedSource {
    type Error = Infallible;

    fn load_catalog(&self) -> Result<CityCatalog, Self::Error> {
        Ok(CityCatalog::default_catalog())
    }

    fn load_hints(&self) -> Result<HintBook, Self::Error> {
        Ok(HintBook::default_book())
    }
}

/// Profile documents stored as JSON files in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create the storage, making the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: &Path) -> Result<Self, ProfileError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// The persisted anonymous user id, generated on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the id file cannot be read or written.
    pub fn load_or_create_user_id(&self) -> Result<String, ProfileError> {
        let path = self.dir.join(USER_ID_FILE);
        match fs::read_to_string(&path) {
            Ok(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
            Ok(_) | Err(_) => {
                let id = anonymous_user_id();
                fs::write(&path, &id)?;
                Ok(id)
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, ProfileError> {
        let path = self.dir.join(file);
        let payload = match fs::read_to_string(&path) {
            Ok(payload) => payload,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&payload)?))
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<(), ProfileError> {
        let payload = serde_json::to_string_pretty(value)?;
        fs::write(self.dir.join(file), payload)?;
        Ok(())
    }
}

impl ProfileStorage for FileStorage {
    type Error = ProfileError;

    fn save_settings(&self, settings: &GameSettings) -> Result<(), Self::Error> {
        self.write_json(SETTINGS_FILE, settings)
    }

    fn load_settings(&self) -> Result<Option<GameSettings>, Self::Error> {
        self.read_json(SETTINGS_FILE)
    }

    fn save_stats(&self, stats: &StatsRecord) -> Result<(), Self::Error> {
        self.write_json(STATS_FILE, stats)
    }

    fn load_stats(&self) -> Result<Option<StatsRecord>, Self::Error> {
        self.read_json(STATS_FILE)
    }

    fn clear_stats(&self) -> Result<(), Self::Error> {
        match fs::remove_file(self.dir.join(STATS_FILE)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// On-disk shape of the mirror file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MirrorFile {
    #[serde(default)]
    stats: HashMap<String, RemoteStats>,
    #[serde(default)]
    cities: HashMap<String, RemoteCityStats>,
}

/// Remote statistics store simulated by a single JSON file. Stands in for
/// the hosted document store during terminal play; failures degrade the
/// session to local-only statistics exactly like a network outage would.
#[derive(Debug, Clone)]
pub struct FileRemote {
    path: PathBuf,
}

impl FileRemote {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read(&self) -> Result<MirrorFile, ProfileError> {
        let payload = match fs::read_to_string(&self.path) {
            Ok(payload) => payload,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(MirrorFile::default()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&payload)?)
    }

    fn write(&self, file: &MirrorFile) -> Result<(), ProfileError> {
        let payload = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }

    fn city_key(user_id: &str, city_name: &str) -> String {
        format!("{user_id}|{city_name}")
    }
}

impl RemoteStatsStore for FileRemote {
    type Error = ProfileError;

    fn fetch_stats(&self, user_id: &str) -> Result<Option<RemoteStats>, Self::Error> {
        Ok(self.read()?.stats.get(user_id).cloned())
    }

    fn push_stats(&mut self, stats: &RemoteStats) -> Result<(), Self::Error> {
        let mut file = self.read()?;
        file.stats.insert(stats.user_id.clone(), stats.clone());
        self.write(&file)
    }

    fn fetch_city_stats(
        &self,
        user_id: &str,
        city_name: &str,
    ) -> Result<Option<RemoteCityStats>, Self::Error> {
        Ok(self
            .read()?
            .cities
            .get(&Self::city_key(user_id, city_name))
            .cloned())
    }

    fn push_city_stats(&mut self, stats: &RemoteCityStats) -> Result<(), Self::Error> {
        let mut file = self.read()?;
        file.cities.insert(
            Self::city_key(&stats.user_id, &stats.city_name),
            stats.clone(),
        );
        self.write(&file)
    }
}
