//! Durable gameplay statistics and the remote mirror schema.
//!
//! The local record is the source of truth for gameplay continuity; the
//! remote documents are a best-effort mirror preferred for display when a
//! fresh snapshot exists.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-city counters. `ever_guessed`, once set, never reverts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CityRecord {
    #[serde(default)]
    pub times_seen: u32,
    #[serde(default)]
    pub times_correct: u32,
    #[serde(default)]
    pub ever_guessed: bool,
    #[serde(default)]
    pub first_seen_ms: u64,
    #[serde(default)]
    pub last_seen_ms: u64,
}

impl CityRecord {
    /// Share of rounds on this city answered correctly, rounded percent.
    #[must_use]
    pub fn accuracy_pct(&self) -> u32 {
        rounded_pct(self.times_correct, self.times_seen)
    }
}

/// Session-spanning counters, mutated exactly once per round resolution.
///
/// Invariants: `best_streak >= current_streak` after every update;
/// `current_streak` resets to zero on any non-correct outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatsRecord {
    #[serde(default)]
    pub total_rounds: u32,
    #[serde(default)]
    pub correct_rounds: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub best_streak: u32,
    #[serde(default)]
    pub cities: HashMap<String, CityRecord>,
}

impl StatsRecord {
    /// Fold one resolved round into the record. Atomic from the caller's
    /// perspective: no partial update is observable.
    pub fn apply_round(&mut self, correct: bool, city_name: &str, now_ms: u64) {
        self.total_rounds = self.total_rounds.saturating_add(1);
        if correct {
            self.correct_rounds = self.correct_rounds.saturating_add(1);
            self.current_streak = self.current_streak.saturating_add(1);
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }

        let entry = self
            .cities
            .entry(city_name.to_string())
            .or_insert_with(|| CityRecord {
                first_seen_ms: now_ms,
                ..CityRecord::default()
            });
        entry.times_seen = entry.times_seen.saturating_add(1);
        entry.last_seen_ms = now_ms;
        if correct {
            entry.times_correct = entry.times_correct.saturating_add(1);
            entry.ever_guessed = true;
        }
    }

    #[must_use]
    pub fn accuracy_pct(&self) -> u32 {
        rounded_pct(self.correct_rounds, self.total_rounds)
    }

    #[must_use]
    pub fn seen_city_count(&self) -> u32 {
        u32::try_from(self.cities.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn guessed_city_count(&self) -> u32 {
        let count = self
            .cities
            .values()
            .filter(|record| record.ever_guessed)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Restore the zero record.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Load a record from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed; callers recover by
    /// falling back to the default record.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn rounded_pct(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let scaled = u64::from(part) * 100 + u64::from(whole) / 2;
    u32::try_from(scaled / u64::from(whole)).unwrap_or(100)
}

/// Per-user statistics document as stored remotely. Field names follow the
/// established wire schema of the hosted store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct RemoteStats {
    pub user_id: String,
    pub total_plays: u32,
    pub correct_plays: u32,
    pub incorrect_plays: u32,
    pub current_winstreak: u32,
    pub best_winstreak: u32,
}

impl RemoteStats {
    #[must_use]
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Self::default()
        }
    }

    /// Mirror of `StatsRecord::apply_round` for the remote counters.
    pub fn apply_round(&mut self, correct: bool) {
        self.total_plays = self.total_plays.saturating_add(1);
        if correct {
            self.correct_plays = self.correct_plays.saturating_add(1);
            self.current_winstreak = self.current_winstreak.saturating_add(1);
            self.best_winstreak = self.best_winstreak.max(self.current_winstreak);
        } else {
            self.incorrect_plays = self.incorrect_plays.saturating_add(1);
            self.current_winstreak = 0;
        }
    }
}

/// Per-user, per-city document as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct RemoteCityStats {
    pub user_id: String,
    pub city_name: String,
    pub guess_count: u32,
    pub correct_count: u32,
    pub is_guessed: bool,
    pub is_showed: bool,
}

impl RemoteCityStats {
    #[must_use]
    pub fn for_city(user_id: &str, city_name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            city_name: city_name.to_string(),
            ..Self::default()
        }
    }

    pub fn apply_round(&mut self, correct: bool) {
        self.guess_count = self.guess_count.saturating_add(1);
        if correct {
            self.correct_count = self.correct_count.saturating_add(1);
            self.is_guessed = true;
        }
        self.is_showed = true;
    }
}

/// Which record backed a rendered statistics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    Remote,
    Local,
}

/// Display-ready statistics. Headline counters come from the remote mirror
/// when a snapshot is present, otherwise from the local record; the city
/// breakdown always comes from the local record. The two are never merged
/// structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub source: StatsSource,
    pub total_rounds: u32,
    pub correct_rounds: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub accuracy_pct: u32,
    pub seen_cities: u32,
    pub guessed_cities: u32,
}

impl StatsView {
    #[must_use]
    pub fn resolve(local: &StatsRecord, remote: Option<&RemoteStats>) -> Self {
        match remote {
            Some(remote) => Self {
                source: StatsSource::Remote,
                total_rounds: remote.total_plays,
                correct_rounds: remote.correct_plays,
                current_streak: remote.current_winstreak,
                best_streak: remote.best_winstreak,
                accuracy_pct: rounded_pct(remote.correct_plays, remote.total_plays),
                seen_cities: local.seen_city_count(),
                guessed_cities: local.guessed_city_count(),
            },
            None => Self {
                source: StatsSource::Local,
                total_rounds: local.total_rounds,
                correct_rounds: local.correct_rounds,
                current_streak: local.current_streak,
                best_streak: local.best_streak,
                accuracy_pct: local.accuracy_pct(),
                seen_cities: local.seen_city_count(),
                guessed_cities: local.guessed_city_count(),
            },
        }
    }
}
