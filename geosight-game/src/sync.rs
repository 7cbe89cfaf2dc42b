//! Best-effort mirroring of statistics to a remote store.
//!
//! Gameplay never waits on the remote: resolved rounds enqueue an update
//! and a later flush pushes whatever is pending. A failed flush leaves the
//! queue intact and is logged, not surfaced.
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

use crate::round::RoundId;
use crate::stats::{RemoteCityStats, RemoteStats};

/// Remote document store keyed by an opaque per-installation user id.
/// Platform adapters wrap the hosted backend; all calls may fail
/// independently of gameplay.
pub trait RemoteStatsStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the per-user statistics document.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unreachable.
    fn fetch_stats(&self, user_id: &str) -> Result<Option<RemoteStats>, Self::Error>;

    /// Replace the per-user statistics document.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unreachable.
    fn push_stats(&mut self, stats: &RemoteStats) -> Result<(), Self::Error>;

    /// Fetch one per-city document for the user.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unreachable.
    fn fetch_city_stats(
        &self,
        user_id: &str,
        city_name: &str,
    ) -> Result<Option<RemoteCityStats>, Self::Error>;

    /// Replace one per-city document for the user.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unreachable.
    fn push_city_stats(&mut self, stats: &RemoteCityStats) -> Result<(), Self::Error>;
}

/// Sync failures degrade to local-only statistics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("remote store unavailable: {reason}")]
    RemoteUnavailable { reason: String },
}

/// Generate an opaque anonymous user identifier for a fresh installation.
#[must_use]
pub fn anonymous_user_id() -> String {
    let mut rng = ChaCha20Rng::from_entropy();
    let hi = rng.next_u64();
    let lo = rng.next_u64();
    format!("anon-{hi:016x}{lo:016x}")
}

/// One resolved round, staged for mirroring. Tagged with the round it
/// belongs to so stale work can be told apart from current work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsUpdate {
    pub round_id: RoundId,
    pub city_name: String,
    pub correct: bool,
    pub at_ms: u64,
}

/// A remote read taken at a known point in round history. Consumers drop
/// snapshots older than their last resolved round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSnapshot {
    pub as_of_round: RoundId,
    pub stats: RemoteStats,
}

/// FIFO of pending mirror updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQueue {
    pending: VecDeque<StatsUpdate>,
}

impl SyncQueue {
    pub fn enqueue(&mut self, update: StatsUpdate) {
        self.pending.push_back(update);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Push pending updates in order, stopping at the first store failure.
    /// Updates already pushed are dropped from the queue; the failed update
    /// and everything behind it stay queued for the next flush. The local
    /// record is never rolled back.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RemoteUnavailable` when the store fails; the
    /// queue retains all unflushed updates.
    pub fn flush<S: RemoteStatsStore>(
        &mut self,
        user_id: &str,
        store: &mut S,
    ) -> Result<usize, SyncError> {
        let mut flushed = 0;
        while let Some(update) = self.pending.front() {
            push_update(user_id, update, store).map_err(|err| SyncError::RemoteUnavailable {
                reason: err.to_string(),
            })?;
            self.pending.pop_front();
            flushed += 1;
        }
        Ok(flushed)
    }
}

fn push_update<S: RemoteStatsStore>(
    user_id: &str,
    update: &StatsUpdate,
    store: &mut S,
) -> Result<(), S::Error> {
    let mut stats = store
        .fetch_stats(user_id)?
        .unwrap_or_else(|| RemoteStats::for_user(user_id));
    stats.apply_round(update.correct);
    store.push_stats(&stats)?;

    let mut city = store
        .fetch_city_stats(user_id, &update.city_name)?
        .unwrap_or_else(|| RemoteCityStats::for_city(user_id, &update.city_name));
    city.apply_round(update.correct);
    store.push_city_stats(&city)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::convert::Infallible;

    #[derive(Debug, Default)]
    struct MemoryRemote {
        stats: HashMap<String, RemoteStats>,
        cities: HashMap<(String, String), RemoteCityStats>,
    }

    impl RemoteStatsStore for MemoryRemote {
        type Error = Infallible;

        fn fetch_stats(&self, user_id: &str) -> Result<Option<RemoteStats>, Self::Error> {
            Ok(self.stats.get(user_id).cloned())
        }

        fn push_stats(&mut self, stats: &RemoteStats) -> Result<(), Self::Error> {
            self.stats.insert(stats.user_id.clone(), stats.clone());
            Ok(())
        }

        fn fetch_city_stats(
            &self,
            user_id: &str,
            city_name: &str,
        ) -> Result<Option<RemoteCityStats>, Self::Error> {
            Ok(self
                .cities
                .get(&(user_id.to_string(), city_name.to_string()))
                .cloned())
        }

        fn push_city_stats(&mut self, stats: &RemoteCityStats) -> Result<(), Self::Error> {
            self.cities.insert(
                (stats.user_id.clone(), stats.city_name.clone()),
                stats.clone(),
            );
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    #[error("store offline")]
    struct Offline;

    /// Always-failing store for degradation tests.
    #[derive(Debug, Default)]
    struct DeadRemote;

    impl RemoteStatsStore for DeadRemote {
        type Error = Offline;

        fn fetch_stats(&self, _user_id: &str) -> Result<Option<RemoteStats>, Self::Error> {
            Err(Offline)
        }

        fn push_stats(&mut self, _stats: &RemoteStats) -> Result<(), Self::Error> {
            Err(Offline)
        }

        fn fetch_city_stats(
            &self,
            _user_id: &str,
            _city_name: &str,
        ) -> Result<Option<RemoteCityStats>, Self::Error> {
            Err(Offline)
        }

        fn push_city_stats(&mut self, _stats: &RemoteCityStats) -> Result<(), Self::Error> {
            Err(Offline)
        }
    }

    fn update(round: u64, city: &str, correct: bool) -> StatsUpdate {
        StatsUpdate {
            round_id: RoundId(round),
            city_name: city.to_string(),
            correct,
            at_ms: round * 1_000,
        }
    }

    #[test]
    fn flush_applies_updates_in_order() {
        let mut queue = SyncQueue::default();
        queue.enqueue(update(1, "Moscow", true));
        queue.enqueue(update(2, "Kazan", false));
        queue.enqueue(update(3, "Moscow", true));

        let mut store = MemoryRemote::default();
        let flushed = queue.flush("anon-1", &mut store).unwrap();
        assert_eq!(flushed, 3);
        assert!(queue.is_empty());

        let stats = &store.stats["anon-1"];
        assert_eq!(stats.total_plays, 3);
        assert_eq!(stats.correct_plays, 2);
        assert_eq!(stats.incorrect_plays, 1);
        assert_eq!(stats.current_winstreak, 1);
        assert_eq!(stats.best_winstreak, 1);

        let moscow = &store.cities[&("anon-1".to_string(), "Moscow".to_string())];
        assert_eq!(moscow.guess_count, 2);
        assert_eq!(moscow.correct_count, 2);
        assert!(moscow.is_guessed);
    }

    #[test]
    fn failed_flush_retains_the_queue() {
        let mut queue = SyncQueue::default();
        queue.enqueue(update(1, "Moscow", true));
        queue.enqueue(update(2, "Kazan", false));

        let mut store = DeadRemote;
        let err = queue.flush("anon-1", &mut store).unwrap_err();
        assert!(matches!(err, SyncError::RemoteUnavailable { .. }));
        assert_eq!(queue.len(), 2);

        // a later flush against a healthy store drains everything
        let mut store = MemoryRemote::default();
        assert_eq!(queue.flush("anon-1", &mut store).unwrap(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn anonymous_ids_are_distinct_and_prefixed() {
        let a = anonymous_user_id();
        let b = anonymous_user_id();
        assert!(a.starts_with("anon-"));
        assert_eq!(a.len(), "anon-".len() + 32);
        assert_ne!(a, b);
    }
}
