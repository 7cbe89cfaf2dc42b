//! Round lifecycle: attempt tracking, guess evaluation, and the one-way
//! phase machine. Exactly one round is live per session.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::catalog::{City, GeoPoint};

/// Attempt count that marks a round as unlimited in persisted settings.
/// Kept for compatibility with existing saved profiles.
pub const LEGACY_UNLIMITED_SENTINEL: u32 = 999;

/// Per-round guess budget. Serialized as the raw attempt count with the
/// legacy `999` sentinel standing in for `Unlimited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptPolicy {
    Limited(u32),
    Unlimited,
}

impl AttemptPolicy {
    #[must_use]
    pub const fn from_count(raw: u32) -> Self {
        if raw >= LEGACY_UNLIMITED_SENTINEL {
            Self::Unlimited
        } else {
            Self::Limited(raw)
        }
    }

    #[must_use]
    pub const fn as_count(self) -> u32 {
        match self {
            Self::Limited(count) => count,
            Self::Unlimited => LEGACY_UNLIMITED_SENTINEL,
        }
    }

    #[must_use]
    pub const fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self::Limited(3)
    }
}

impl Serialize for AttemptPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.as_count())
    }
}

impl<'de> Deserialize<'de> for AttemptPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u32::deserialize(deserializer)?;
        Ok(Self::from_count(raw))
    }
}

/// Monotonically increasing per-session round identifier. Statistics
/// updates and timers are tagged with the round they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Phase machine for a round. Transitions are one-way; no phase is
/// re-entered, and every terminal entry triggers statistics accumulation
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    #[default]
    Active,
    Correct,
    Exhausted,
    Revealed,
}

impl RoundPhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Whether this terminal phase counts as a win for streak purposes.
    /// `Revealed` accumulates as incorrect.
    #[must_use]
    pub const fn counts_as_correct(self) -> bool {
        matches!(self, Self::Correct)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Correct => "correct",
            Self::Exhausted => "exhausted",
            Self::Revealed => "revealed",
        }
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single guess submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct,
    /// Wrong answer with the round still live. `attempts_left` is `None`
    /// under unlimited attempts.
    Incorrect { attempts_left: Option<u32> },
    /// Wrong answer that spent the last attempt.
    Exhausted,
}

/// Caller errors at the round surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("round is already resolved")]
    AlreadyResolved,
    #[error("reveal requires unlimited attempts")]
    RevealNeedsUnlimited,
}

/// Trim and case-fold player input for comparison. Matching is exact after
/// normalization: no fuzzy matching, no diacritic folding.
#[must_use]
pub fn normalize_guess(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// One live play instance from target selection to terminal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub id: RoundId,
    pub city: City,
    /// Jittered coordinates shown to the player, not the catalog truth.
    pub display_point: GeoPoint,
    attempts_left: Option<u32>,
    phase: RoundPhase,
}

impl RoundState {
    #[must_use]
    pub fn new(id: RoundId, city: City, display_point: GeoPoint, policy: AttemptPolicy) -> Self {
        let attempts_left = match policy {
            AttemptPolicy::Limited(count) => Some(count),
            AttemptPolicy::Unlimited => None,
        };
        Self {
            id,
            city,
            display_point,
            attempts_left,
            phase: RoundPhase::Active,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Remaining guesses, `None` when unlimited.
    #[must_use]
    pub const fn attempts_left(&self) -> Option<u32> {
        self.attempts_left
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Evaluate a free-text guess against the target name.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::AlreadyResolved` when called after a terminal
    /// phase was reached; resolved rounds accept no further input.
    pub fn submit_guess(&mut self, raw: &str) -> Result<GuessOutcome, RoundError> {
        if self.phase.is_terminal() {
            return Err(RoundError::AlreadyResolved);
        }
        if normalize_guess(raw) == normalize_guess(&self.city.name) {
            self.phase = RoundPhase::Correct;
            return Ok(GuessOutcome::Correct);
        }
        match self.attempts_left.as_mut() {
            Some(left) => {
                *left = left.saturating_sub(1);
                if *left == 0 {
                    self.phase = RoundPhase::Exhausted;
                    Ok(GuessOutcome::Exhausted)
                } else {
                    Ok(GuessOutcome::Incorrect {
                        attempts_left: Some(*left),
                    })
                }
            }
            None => Ok(GuessOutcome::Incorrect {
                attempts_left: None,
            }),
        }
    }

    /// Surrender the round and show the answer. Only permitted when
    /// attempts are unlimited; accumulates as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyResolved` on a terminal round and
    /// `RevealNeedsUnlimited` under a limited attempt budget.
    pub fn reveal(&mut self) -> Result<(), RoundError> {
        if self.phase.is_terminal() {
            return Err(RoundError::AlreadyResolved);
        }
        if self.attempts_left.is_some() {
            return Err(RoundError::RevealNeedsUnlimited);
        }
        self.phase = RoundPhase::Revealed;
        Ok(())
    }

    /// Force the round into `Exhausted`, spending any remaining attempts.
    /// Used by single-pick input modes where one wrong answer ends the round.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyResolved` on a terminal round.
    pub fn exhaust(&mut self) -> Result<(), RoundError> {
        if self.phase.is_terminal() {
            return Err(RoundError::AlreadyResolved);
        }
        if let Some(left) = self.attempts_left.as_mut() {
            *left = 0;
        }
        self.phase = RoundPhase::Exhausted;
        Ok(())
    }
}
