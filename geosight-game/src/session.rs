//! Session context binding settings, catalog, the live round, and
//! statistics. All gameplay state transitions go through this type as
//! direct reactions to player input or polled timers.
use log::{debug, warn};

use crate::catalog::{City, CityCatalog};
use crate::hints::{Hint, HintBook, HintCursor};
use crate::map::{
    INITIAL_ZOOM, MINI_MAP_ZOOM, MapBehaviors, MapCamera, MapDirective, Marker, MarkerIcon,
    TARGET_ZOOM, ZOOM_ANIMATION_MS, ZOOM_START_DELAY_MS,
};
use crate::quiz::QuizSheet;
use crate::rng::RngBundle;
use crate::round::{GuessOutcome, RoundError, RoundId, RoundPhase, RoundState};
use crate::select::{DEFAULT_JITTER_RADIUS, SelectError, jitter_point, pick_city};
use crate::settings::GameSettings;
use crate::stats::{RemoteStats, StatsRecord, StatsView};
use crate::suggest::SuggestIndex;
use crate::sync::{RemoteSnapshot, RemoteStatsStore, StatsUpdate, SyncQueue};
use crate::timer::{AUTO_RESTART_DELAY_MS, TimerKind, TimerQueue, TimerTask};
use thiserror::Error;

/// Errors surfaced by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error(transparent)]
    Round(#[from] RoundError),
    #[error("no active round")]
    NoActiveRound,
    #[error("quiz sheet not generated for this round")]
    QuizNotActive,
    #[error("quiz option {index} is out of range")]
    QuizOptionOutOfRange { index: usize },
}

/// Everything the host needs to present a freshly started round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSetup {
    pub round_id: RoundId,
    pub directives: Vec<MapDirective>,
    /// Present only in quiz mode.
    pub quiz: Option<QuizSheet>,
    /// Remaining guesses, `None` when unlimited.
    pub attempts_left: Option<u32>,
}

/// Outcome of entering a terminal phase, produced exactly once per round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResolution {
    pub round_id: RoundId,
    pub phase: RoundPhase,
    pub city: City,
    pub correct: bool,
    pub directives: Vec<MapDirective>,
    /// When auto-restart is enabled, the time the next round begins.
    pub auto_restart_at_ms: Option<u64>,
}

/// Result of one guess or quiz pick.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessReport {
    pub outcome: GuessOutcome,
    /// Present when the guess ended the round.
    pub resolution: Option<RoundResolution>,
}

/// A hint advanced by the player, with its map placement.
#[derive(Debug, Clone, PartialEq)]
pub struct HintReport {
    pub hint: Hint,
    pub directives: Vec<MapDirective>,
}

/// Something a polled timer did.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    Map(MapDirective),
    RoundStarted(RoundSetup),
}

/// The explicit session context: one per player, one live round at a time.
#[derive(Debug)]
pub struct GameSession {
    settings: GameSettings,
    catalog: CityCatalog,
    hints: HintBook,
    suggest: SuggestIndex,
    rng: RngBundle,
    stats: StatsRecord,
    remote_view: Option<RemoteStats>,
    sync: SyncQueue,
    timers: TimerQueue,
    round: Option<RoundState>,
    quiz: Option<QuizSheet>,
    hint_cursor: HintCursor,
    next_round: u64,
    last_resolved: Option<RoundId>,
    user_id: String,
}

impl GameSession {
    #[must_use]
    pub fn new(
        mut settings: GameSettings,
        catalog: CityCatalog,
        hints: HintBook,
        stats: StatsRecord,
        seed: u64,
        user_id: String,
    ) -> Self {
        settings.sanitize();
        let suggest = SuggestIndex::new(&catalog);
        Self {
            settings,
            catalog,
            hints,
            suggest,
            rng: RngBundle::from_user_seed(seed),
            stats,
            remote_view: None,
            sync: SyncQueue::default(),
            timers: TimerQueue::default(),
            round: None,
            quiz: None,
            hint_cursor: HintCursor::default(),
            next_round: 1,
            last_resolved: None,
            user_id,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Replace settings (sanitized). The change takes effect on the next
    /// round; callers start one right after saving, as the host UI does.
    pub fn update_settings(&mut self, mut settings: GameSettings) {
        settings.sanitize();
        self.settings = settings;
    }

    #[must_use]
    pub const fn stats(&self) -> &StatsRecord {
        &self.stats
    }

    #[must_use]
    pub const fn catalog(&self) -> &CityCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    #[must_use]
    pub const fn quiz(&self) -> Option<&QuizSheet> {
        self.quiz.as_ref()
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub const fn last_resolved(&self) -> Option<RoundId> {
        self.last_resolved
    }

    #[must_use]
    pub const fn sync_queue(&self) -> &SyncQueue {
        &self.sync
    }

    /// Begin a new round, replacing any prior one. The prior round's
    /// timers are cancelled and its display artifacts torn down before the
    /// new target is drawn, so stale visuals never outlive their round.
    ///
    /// # Errors
    ///
    /// Returns `SelectError::EmptyCatalog` when the difficulty filter
    /// leaves no candidates; no round is live afterwards and the caller
    /// must surface the message instead of starting play.
    pub fn start_round(&mut self, now_ms: u64) -> Result<RoundSetup, SessionError> {
        let mut directives = Vec::new();
        if let Some(prior) = self.round.take() {
            self.timers.cancel_round(prior.id);
            directives.push(MapDirective::ClearMarkers);
            directives.push(MapDirective::HideMiniMap);
        }
        self.quiz = None;
        self.hint_cursor.reset();

        let ceiling = self.settings.difficulty_ceiling;
        let city = pick_city(&self.catalog, ceiling, &mut *self.rng.select())?.clone();
        let display_point = jitter_point(
            city.point(),
            DEFAULT_JITTER_RADIUS,
            &mut *self.rng.jitter(),
        );

        let id = RoundId(self.next_round);
        self.next_round += 1;
        debug!("round {id} targets {}", city.name);

        directives.push(MapDirective::InitCamera {
            camera: MapCamera {
                center: display_point,
                zoom: INITIAL_ZOOM,
            },
            style: self.settings.map_style,
            behaviors: MapBehaviors::locked(),
        });
        self.timers.schedule(TimerTask {
            round_id: id,
            kind: TimerKind::ZoomIn,
            fires_at_ms: now_ms + ZOOM_START_DELAY_MS,
        });

        let round = RoundState::new(id, city, display_point, self.settings.attempts);
        let quiz = if self.settings.quiz_mode {
            let sheet = QuizSheet::build(
                &round.city,
                &self.catalog,
                ceiling,
                &mut *self.rng.shuffle(),
            );
            self.quiz = Some(sheet.clone());
            Some(sheet)
        } else {
            None
        };
        let attempts_left = round.attempts_left();
        self.round = Some(round);

        Ok(RoundSetup {
            round_id: id,
            directives,
            quiz,
            attempts_left,
        })
    }

    /// Evaluate a free-text guess against the live round.
    ///
    /// # Errors
    ///
    /// `NoActiveRound` before the first round, `AlreadyResolved` after a
    /// terminal phase.
    pub fn submit_guess(&mut self, raw: &str, now_ms: u64) -> Result<GuessReport, SessionError> {
        let outcome = {
            let round = self.round.as_mut().ok_or(SessionError::NoActiveRound)?;
            round.submit_guess(raw)?
        };
        let resolution = match outcome {
            GuessOutcome::Correct | GuessOutcome::Exhausted => Some(self.resolve_current(now_ms)),
            GuessOutcome::Incorrect { .. } => None,
        };
        Ok(GuessReport {
            outcome,
            resolution,
        })
    }

    /// Answer the quiz by option index. A single pick resolves the round:
    /// a wrong pick reveals the answer, so remaining attempts are spent
    /// and the round accumulates as exhausted.
    ///
    /// # Errors
    ///
    /// `QuizNotActive` outside quiz mode, `QuizOptionOutOfRange` for a bad
    /// index, plus the `submit_guess` errors.
    pub fn choose_quiz_option(
        &mut self,
        index: usize,
        now_ms: u64,
    ) -> Result<GuessReport, SessionError> {
        let name = {
            let sheet = self.quiz.as_ref().ok_or(SessionError::QuizNotActive)?;
            sheet
                .option(index)
                .ok_or(SessionError::QuizOptionOutOfRange { index })?
                .to_string()
        };
        let outcome = {
            let round = self.round.as_mut().ok_or(SessionError::NoActiveRound)?;
            let outcome = round.submit_guess(&name)?;
            if round.phase().is_terminal() {
                outcome
            } else {
                round.exhaust()?;
                GuessOutcome::Exhausted
            }
        };
        let resolution = Some(self.resolve_current(now_ms));
        Ok(GuessReport {
            outcome,
            resolution,
        })
    }

    /// Surrender the round and show the answer. Only permitted under
    /// unlimited attempts; accumulates as incorrect.
    ///
    /// # Errors
    ///
    /// `NoActiveRound`, `AlreadyResolved`, or `RevealNeedsUnlimited`.
    pub fn reveal_answer(&mut self, now_ms: u64) -> Result<RoundResolution, SessionError> {
        {
            let round = self.round.as_mut().ok_or(SessionError::NoActiveRound)?;
            round.reveal()?;
        }
        Ok(self.resolve_current(now_ms))
    }

    /// Advance to the next hint for the live round, cycling past the end.
    /// Returns `None` when hints are disabled, no round is live, the round
    /// is resolved, or the city has no hints.
    pub fn next_hint(&mut self) -> Option<HintReport> {
        if !self.settings.hints_enabled {
            return None;
        }
        let round = self.round.as_ref()?;
        if round.phase().is_terminal() {
            return None;
        }
        let hints = self.hints.hints_for(&round.city.name);
        let hint = self.hint_cursor.advance(hints)?.clone();
        let marker = Marker {
            point: hint.point(),
            label: hint.name.clone(),
            detail: hint.text.clone(),
            icon: MarkerIcon::Hint,
        };
        let directives = vec![
            MapDirective::ClearMarkers,
            MapDirective::PlaceMarker {
                marker: marker.clone(),
            },
            MapDirective::PanTo {
                camera: MapCamera {
                    center: hint.point(),
                    zoom: TARGET_ZOOM,
                },
            },
        ];
        Some(HintReport { hint, directives })
    }

    /// Ranked name suggestions for partial free-text input.
    #[must_use]
    pub fn suggestions(&self, input: &str) -> Vec<&str> {
        self.suggest.query(input)
    }

    /// Fire every due timer. Tasks belonging to a round other than the
    /// live one are discarded unfired.
    pub fn poll_timers(&mut self, now_ms: u64) -> Vec<TimerEvent> {
        let due = self.timers.take_due(now_ms);
        let mut events = Vec::new();
        for task in due {
            if self.round.as_ref().map(|round| round.id) != Some(task.round_id) {
                continue;
            }
            match task.kind {
                TimerKind::ZoomIn => events.push(TimerEvent::Map(MapDirective::AnimateZoom {
                    zoom: TARGET_ZOOM,
                    duration_ms: ZOOM_ANIMATION_MS,
                })),
                TimerKind::AutoRestart => match self.start_round(now_ms) {
                    Ok(setup) => events.push(TimerEvent::RoundStarted(setup)),
                    Err(err) => warn!("auto-restart skipped: {err}"),
                },
            }
        }
        events
    }

    /// Accept a remote statistics snapshot for display. Snapshots taken
    /// before the last resolved round are stale and ignored, so an
    /// in-flight read from a superseded round cannot mask newer counters.
    pub fn apply_remote_snapshot(&mut self, snapshot: RemoteSnapshot) -> bool {
        if let Some(last) = self.last_resolved
            && snapshot.as_of_round < last
        {
            debug!(
                "discarding stale remote snapshot from round {}",
                snapshot.as_of_round
            );
            return false;
        }
        self.remote_view = Some(snapshot.stats);
        true
    }

    /// Display-ready statistics, preferring the remote mirror when a
    /// fresh snapshot exists.
    #[must_use]
    pub fn stats_view(&self) -> StatsView {
        StatsView::resolve(&self.stats, self.remote_view.as_ref())
    }

    /// Push pending mirror updates. Failures degrade to local-only
    /// statistics: logged, never surfaced, queue retained for retry.
    pub fn flush_remote<S: RemoteStatsStore>(&mut self, store: &mut S) -> usize {
        let before = self.sync.len();
        match self.sync.flush(&self.user_id, store) {
            Ok(flushed) => flushed,
            Err(err) => {
                warn!("statistics sync degraded to local-only: {err}");
                before - self.sync.len()
            }
        }
    }

    /// Wipe local statistics, the remote display snapshot, and pending
    /// mirror updates.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
        self.remote_view = None;
        self.sync.clear();
    }

    /// The single statistics trigger: runs when a round enters a terminal
    /// phase, exactly once per round.
    fn resolve_current(&mut self, now_ms: u64) -> RoundResolution {
        let (id, phase, city) = {
            let round = self
                .round
                .as_ref()
                .expect("resolution requires a live round");
            (round.id, round.phase(), round.city.clone())
        };
        debug_assert!(phase.is_terminal());
        debug_assert!(
            self.last_resolved != Some(id),
            "a round accumulates statistics once"
        );

        let correct = phase.counts_as_correct();
        self.stats.apply_round(correct, &city.name, now_ms);
        self.sync.enqueue(StatsUpdate {
            round_id: id,
            city_name: city.name.clone(),
            correct,
            at_ms: now_ms,
        });
        self.last_resolved = Some(id);
        debug!("round {id} resolved {phase}");

        let marker = Marker {
            point: city.point(),
            label: city.name.clone(),
            detail: city.name.clone(),
            icon: MarkerIcon::Reveal,
        };
        let directives = vec![MapDirective::ShowMiniMap {
            camera: MapCamera {
                center: city.point(),
                zoom: MINI_MAP_ZOOM,
            },
            marker,
        }];

        let auto_restart_at_ms = if self.settings.auto_restart {
            let fires_at_ms = now_ms + AUTO_RESTART_DELAY_MS;
            self.timers.schedule(TimerTask {
                round_id: id,
                kind: TimerKind::AutoRestart,
                fires_at_ms,
            });
            Some(fires_at_ms)
        } else {
            None
        };

        RoundResolution {
            round_id: id,
            phase,
            city,
            correct,
            directives,
            auto_restart_at_ms,
        }
    }
}
