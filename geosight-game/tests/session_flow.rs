use geosight_game::catalog::{CityCatalog, Difficulty};
use geosight_game::hints::HintBook;
use geosight_game::round::{AttemptPolicy, GuessOutcome, RoundPhase};
use geosight_game::session::{GameSession, TimerEvent};
use geosight_game::settings::GameSettings;
use geosight_game::stats::{RemoteCityStats, RemoteStats, StatsRecord, StatsSource};
use geosight_game::sync::RemoteStatsStore;
use geosight_game::timer::AUTO_RESTART_DELAY_MS;
use std::collections::HashMap;
use std::convert::Infallible;

fn catalog() -> CityCatalog {
    CityCatalog::default_catalog()
}

fn session_with(settings: GameSettings, seed: u64) -> GameSession {
    GameSession::new(
        settings,
        catalog(),
        HintBook::default_book(),
        StatsRecord::default(),
        seed,
        "anon-flow".to_string(),
    )
}

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

#[test]
fn long_campaign_keeps_statistics_invariants() {
    let mut session = session_with(GameSettings::default(), 0xC0FFEE);
    let mut clock = 0_u64;
    let mut expected_total = 0_u32;
    let mut expected_correct = 0_u32;
    let mut expected_streak = 0_u32;
    let mut expected_best = 0_u32;

    for round_index in 0..100_u32 {
        clock += 1_000;
        session.start_round(clock).unwrap();
        let target = session.round().unwrap().city.name.clone();

        // miss every third round by exhausting the attempt budget
        let answer_correctly = round_index % 3 != 0;
        clock += 500;
        if answer_correctly {
            let report = session.submit_guess(&target, clock).unwrap();
            assert_eq!(report.outcome, GuessOutcome::Correct);
            expected_correct += 1;
            expected_streak += 1;
            expected_best = expected_best.max(expected_streak);
        } else {
            loop {
                let report = session.submit_guess("заведомо не город", clock).unwrap();
                match report.outcome {
                    GuessOutcome::Incorrect { attempts_left } => {
                        assert!(attempts_left.unwrap() > 0);
                    }
                    GuessOutcome::Exhausted => break,
                    GuessOutcome::Correct => unreachable!("guess text matches no city"),
                }
            }
            expected_streak = 0;
        }
        expected_total += 1;

        let stats = session.stats();
        assert_eq!(stats.total_rounds, expected_total);
        assert_eq!(stats.correct_rounds, expected_correct);
        assert_eq!(stats.current_streak, expected_streak);
        assert_eq!(stats.best_streak, expected_best);
        assert!(stats.best_streak >= stats.current_streak);
    }

    assert_eq!(session.sync_queue().len(), 100);
}

#[test]
fn remote_mirror_converges_with_local_counters() {
    let mut session = session_with(GameSettings::default(), 0xFEED);
    let mut store = MemoryRemote::default();
    let mut clock = 0_u64;

    for round_index in 0..20_u32 {
        clock += 1_000;
        session.start_round(clock).unwrap();
        let target = session.round().unwrap().city.name.clone();
        if round_index % 4 == 0 {
            let mut exhausted = false;
            while !exhausted {
                let report = session.submit_guess("мимо", clock).unwrap();
                exhausted = matches!(report.outcome, GuessOutcome::Exhausted);
            }
        } else {
            session.submit_guess(&target, clock).unwrap();
        }
        // flush after every round, as the host does
        assert_eq!(session.flush_remote(&mut store), 1);
    }

    let local = session.stats();
    let remote = &store.stats["anon-flow"];
    assert_eq!(remote.total_plays, local.total_rounds);
    assert_eq!(remote.correct_plays, local.correct_rounds);
    assert_eq!(remote.current_winstreak, local.current_streak);
    assert_eq!(remote.best_winstreak, local.best_streak);
    assert_eq!(
        remote.incorrect_plays,
        local.total_rounds - local.correct_rounds
    );

    // per-city mirrors agree with the local breakdown
    for ((_, city_name), mirror) in &store.cities {
        let record = &local.cities[city_name];
        assert_eq!(mirror.guess_count, record.times_seen);
        assert_eq!(mirror.correct_count, record.times_correct);
        assert_eq!(mirror.is_guessed, record.ever_guessed);
        assert!(mirror.is_showed);
    }
}

#[test]
fn auto_restart_chains_rounds_without_double_counting() {
    let settings = GameSettings {
        auto_restart: true,
        ..GameSettings::default()
    };
    let mut session = session_with(settings, 0xAB);
    let mut clock = 0_u64;
    session.start_round(clock).unwrap();

    for _ in 0..10 {
        let target = session.round().unwrap().city.name.clone();
        clock += 100;
        let report = session.submit_guess(&target, clock).unwrap();
        let resolution = report.resolution.unwrap();
        let restart_at = resolution.auto_restart_at_ms.unwrap();
        assert_eq!(restart_at, clock + AUTO_RESTART_DELAY_MS);

        // polling before the deadline does nothing
        assert!(
            session
                .poll_timers(restart_at - 1)
                .iter()
                .all(|event| matches!(event, TimerEvent::Map(_)))
        );
        let events = session.poll_timers(restart_at);
        assert!(
            events
                .iter()
                .any(|event| matches!(event, TimerEvent::RoundStarted(_)))
        );
        clock = restart_at;
    }

    assert_eq!(session.stats().total_rounds, 10);
    assert_eq!(session.stats().correct_rounds, 10);
}

#[test]
fn quiz_campaign_resolves_every_round_exactly_once() {
    let settings = GameSettings {
        quiz_mode: true,
        difficulty_ceiling: Difficulty(3),
        ..GameSettings::default()
    };
    let mut session = session_with(settings, 0x9999);
    let mut clock = 0_u64;

    for round_index in 0..40_u32 {
        clock += 1_000;
        let setup = session.start_round(clock).unwrap();
        let sheet = setup.quiz.expect("quiz mode builds a sheet");
        assert!(!sheet.is_empty());
        let target = session.round().unwrap().city.name.clone();
        assert_eq!(sheet.correct_name(), target);

        let pick = if round_index % 2 == 0 {
            sheet.correct_index()
        } else {
            (0..sheet.len())
                .find(|index| !sheet.is_correct(*index))
                .expect("sheet always has a wrong option with this catalog")
        };
        let report = session.choose_quiz_option(pick, clock).unwrap();
        let resolution = report.resolution.expect("a quiz pick always resolves");
        assert!(resolution.phase.is_terminal());
        assert_eq!(session.stats().total_rounds, round_index + 1);
    }

    assert_eq!(session.stats().correct_rounds, 20);
}

#[test]
fn unlimited_reveal_counts_as_a_miss() {
    let settings = GameSettings {
        attempts: AttemptPolicy::Unlimited,
        hints_enabled: true,
        ..GameSettings::default()
    };
    let mut session = session_with(settings, 0x77);
    session.start_round(0).unwrap();

    // wrong guesses never exhaust an unlimited round
    for _ in 0..5 {
        let report = session.submit_guess("не тот город", 100).unwrap();
        assert_eq!(
            report.outcome,
            GuessOutcome::Incorrect {
                attempts_left: None
            }
        );
    }

    let resolution = session.reveal_answer(200).unwrap();
    assert_eq!(resolution.phase, RoundPhase::Revealed);
    assert_eq!(session.stats().total_rounds, 1);
    assert_eq!(session.stats().correct_rounds, 0);
    assert_eq!(session.stats().current_streak, 0);
}

#[test]
fn hints_cycle_only_while_the_round_is_live() {
    let settings = GameSettings {
        difficulty_ceiling: Difficulty(1),
        hints_enabled: true,
        ..GameSettings::default()
    };
    let mut session = session_with(settings, 0x31);
    session.start_round(0).unwrap();
    let target = session.round().unwrap().city.name.clone();

    // tier-one targets all carry hints in the embedded book
    let first = session.next_hint().expect("tier-one city has hints");
    let second = session.next_hint().unwrap();
    assert_ne!(first.hint.name, second.hint.name);

    session.submit_guess(&target, 500).unwrap();
    assert!(session.next_hint().is_none());
}

#[test]
fn suggestions_come_from_the_catalog() {
    let session = session_with(GameSettings::default(), 0x11);
    assert!(session.suggestions("м").is_empty());
    let hits = session.suggestions("мо");
    assert!(hits.contains(&"Москва"));
    for hit in hits {
        assert!(hit.to_lowercase().contains("мо"));
    }
}

#[test]
fn stats_view_switches_between_sources() {
    let mut session = session_with(GameSettings::default(), 0x55);
    session.start_round(0).unwrap();
    let target = session.round().unwrap().city.name.clone();
    session.submit_guess(&target, 100).unwrap();

    let view = session.stats_view();
    assert_eq!(view.source, StatsSource::Local);
    assert_eq!(view.total_rounds, 1);
    assert_eq!(view.accuracy_pct, 100);
    assert_eq!(view.guessed_cities, 1);
}
