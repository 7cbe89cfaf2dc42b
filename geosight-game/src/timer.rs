//! Scheduled, cancellable single-shot tasks keyed by round.
//!
//! The queue never runs its own thread; the host polls it with a clock in
//! milliseconds. Tasks belonging to a superseded round are cancelled when
//! the next round starts, so a stale countdown can never act on fresh
//! state.
use serde::{Deserialize, Serialize};

use crate::round::RoundId;

/// Countdown before an auto-restarted round begins.
pub const AUTO_RESTART_DELAY_MS: u64 = 3_000;

/// What a fired task should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Start the animated zoom-in on the round map.
    ZoomIn,
    /// Begin the next round.
    AutoRestart,
}

/// A single-shot task owned by one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerTask {
    pub round_id: RoundId,
    pub kind: TimerKind,
    pub fires_at_ms: u64,
}

/// Pending tasks, at most one per `(round, kind)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerQueue {
    tasks: Vec<TimerTask>,
}

impl TimerQueue {
    /// Add a task, replacing any pending task of the same kind for the
    /// same round.
    pub fn schedule(&mut self, task: TimerTask) {
        self.tasks
            .retain(|pending| !(pending.round_id == task.round_id && pending.kind == task.kind));
        self.tasks.push(task);
    }

    /// Drop every task belonging to the given round.
    pub fn cancel_round(&mut self, round_id: RoundId) {
        self.tasks.retain(|pending| pending.round_id != round_id);
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    /// Remove and return all tasks due at `now_ms`, ordered by fire time.
    #[must_use]
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TimerTask> {
        let mut due: Vec<TimerTask> = self
            .tasks
            .iter()
            .copied()
            .filter(|task| task.fires_at_ms <= now_ms)
            .collect();
        self.tasks.retain(|task| task.fires_at_ms > now_ms);
        due.sort_by_key(|task| task.fires_at_ms);
        due
    }

    /// Earliest pending fire time, if any.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.tasks.iter().map(|task| task.fires_at_ms).min()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
