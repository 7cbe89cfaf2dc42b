mod profile;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use geosight_game::{
    AttemptPolicy, Difficulty, GameEngine, GameSession, GuessOutcome, MapDirective,
    RoundResolution, SelectError, SessionError, TimerEvent,
};
use profile::{EmbeddedSource, FileRemote, FileStorage};

#[derive(Debug, Parser)]
#[command(name = "geosight", version)]
#[command(about = "Terminal build of the Geosight satellite guessing game")]
struct Args {
    /// Profile directory holding settings, statistics, and the mirror file
    #[arg(long, default_value = ".geosight")]
    profile_dir: PathBuf,

    /// Deterministic session seed; derived from the clock when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Number of rounds to play before printing the summary
    #[arg(long, default_value_t = 5)]
    rounds: u32,

    /// Multiple-choice mode instead of free-text guessing
    #[arg(long)]
    quiz: bool,

    /// Attempts per round; 999 means unlimited
    #[arg(long)]
    attempts: Option<u32>,

    /// Difficulty ceiling, 1 (easiest pool) to 5 (full catalog)
    #[arg(long)]
    difficulty: Option<u8>,

    /// Skip mirroring statistics to the profile's remote file
    #[arg(long)]
    offline: bool,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(0))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let storage = FileStorage::new(&args.profile_dir).context("creating profile directory")?;
    let user_id = storage
        .load_or_create_user_id()
        .context("reading the anonymous user id")?;
    let engine = GameEngine::new(EmbeddedSource, storage);

    let seed = args.seed.unwrap_or_else(now_ms);
    let mut session = engine
        .start_session(seed, user_id)
        .context("starting the game session")?;
    apply_overrides(&mut session, &args);
    log::debug!(
        "session ready: user {}, profile {}",
        session.user_id(),
        args.profile_dir.display()
    );

    let mut remote = (!args.offline).then(|| FileRemote::new(args.profile_dir.join("remote.json")));

    let ceiling = session.settings().difficulty_ceiling;
    println!(
        "{} seed {seed}, {} cities in play at difficulty {ceiling}",
        "Geosight".bold().cyan(),
        session.catalog().filtered(ceiling).len()
    );
    println!("Commands: {}, {}, {}\n", "/hint".bold(), "/reveal".bold(), "/stats".bold());

    let mut played = 0;
    for _ in 0..args.rounds {
        if !play_round(&mut session, remote.as_mut())? {
            break;
        }
        played += 1;
        engine.persist(&session).context("saving the profile")?;
    }

    if played > 0 {
        print_summary(&session);
    }
    Ok(())
}

fn apply_overrides(session: &mut GameSession, args: &Args) {
    let mut settings = *session.settings();
    if args.quiz {
        settings.quiz_mode = true;
    }
    if let Some(count) = args.attempts {
        settings.attempts = AttemptPolicy::from_count(count);
    }
    if let Some(ceiling) = args.difficulty {
        settings.difficulty_ceiling = Difficulty::clamped(ceiling);
    }
    session.update_settings(settings);
}

/// Run one round to resolution. Returns `false` when no round could start.
fn play_round(session: &mut GameSession, mut remote: Option<&mut FileRemote>) -> Result<bool> {
    let setup = match session.start_round(now_ms()) {
        Ok(setup) => setup,
        Err(SessionError::Select(err @ SelectError::EmptyCatalog { .. })) => {
            println!("{}", err.to_string().red().bold());
            println!("Relax the difficulty ceiling and try again.");
            return Ok(false);
        }
        Err(err) => return Err(err.into()),
    };

    println!("{}", format!("— Round {} —", setup.round_id).bold());
    for directive in &setup.directives {
        if let MapDirective::InitCamera { camera, style, .. } = directive {
            println!(
                "Map view ({style}) centered at {:.4}, {:.4}, zoom {}",
                camera.center.lat, camera.center.lon, camera.zoom
            );
        }
    }

    let resolution = if let Some(sheet) = setup.quiz {
        for (index, option) in sheet.options().iter().enumerate() {
            println!("  {}. {option}", index + 1);
        }
        quiz_loop(session, sheet.len())?
    } else {
        if let Some(left) = setup.attempts_left {
            println!("Attempts: {left}");
        }
        guess_loop(session)?
    };

    let Some(resolution) = resolution else {
        // input ended mid-round; nothing resolved, nothing to report
        return Ok(false);
    };
    report_resolution(&resolution);

    if let Some(store) = remote.as_deref_mut() {
        // best-effort: a failed push keeps the update queued
        session.flush_remote(store);
    }
    Ok(true)
}

fn quiz_loop(session: &mut GameSession, option_count: usize) -> Result<Option<RoundResolution>> {
    loop {
        let Some(line) = prompt("Pick an option: ")? else {
            return Ok(None);
        };
        match line.parse::<usize>() {
            Ok(number) if (1..=option_count).contains(&number) => {
                let report = session.choose_quiz_option(number - 1, now_ms())?;
                return Ok(report.resolution);
            }
            _ => println!("Enter a number from 1 to {option_count}."),
        }
    }
}

fn guess_loop(session: &mut GameSession) -> Result<Option<RoundResolution>> {
    loop {
        // drive pending zoom animation events between inputs
        for event in session.poll_timers(now_ms()) {
            if let TimerEvent::Map(MapDirective::AnimateZoom { zoom, .. }) = event {
                println!("{}", format!("…zooming in to level {zoom}").dimmed());
            }
        }

        let Some(line) = prompt("Your guess: ")? else {
            return Ok(None);
        };
        match line.as_str() {
            "" => {}
            "/hint" => show_hint(session),
            "/stats" => print_summary(session),
            "/reveal" => match session.reveal_answer(now_ms()) {
                Ok(resolution) => return Ok(Some(resolution)),
                Err(err) => println!("{}", err.to_string().yellow()),
            },
            guess => {
                let report = session.submit_guess(guess, now_ms())?;
                match report.outcome {
                    GuessOutcome::Incorrect { attempts_left } => {
                        suggest_alternatives(session, guess);
                        match attempts_left {
                            Some(left) => {
                                println!("{} {left} attempt(s) left.", "Wrong.".red())
                            }
                            None => println!("{}", "Wrong, try again.".red()),
                        }
                    }
                    GuessOutcome::Correct | GuessOutcome::Exhausted => {
                        return Ok(report.resolution);
                    }
                }
            }
        }
    }
}

fn show_hint(session: &mut GameSession) {
    match session.next_hint() {
        Some(report) => {
            println!(
                "{} {} — {} ({})",
                "Hint:".yellow().bold(),
                report.hint.name,
                report.hint.text,
                report.hint.kind
            );
        }
        None => println!("No hints available for this round."),
    }
}

fn suggest_alternatives(session: &GameSession, guess: &str) {
    let suggestions = session.suggestions(guess);
    if !suggestions.is_empty() {
        println!("{} {}", "Did you mean:".dimmed(), suggestions.join(", "));
    }
}

fn report_resolution(resolution: &RoundResolution) {
    if resolution.correct {
        println!(
            "{} It's {}.",
            "Correct!".green().bold(),
            resolution.city.name.bold()
        );
    } else {
        println!(
            "{} The answer was {}.",
            "Round over.".red().bold(),
            resolution.city.name.bold()
        );
    }
    for directive in &resolution.directives {
        if let MapDirective::ShowMiniMap { camera, .. } = directive {
            println!(
                "{}",
                format!(
                    "Mini-map: {:.4}, {:.4} at zoom {}",
                    camera.center.lat, camera.center.lon, camera.zoom
                )
                .dimmed()
            );
        }
    }
    println!();
}

fn print_summary(session: &GameSession) {
    let view = session.stats_view();
    println!("{}", "— Statistics —".bold());
    println!(
        "Rounds: {}  Correct: {} ({}%)",
        view.total_rounds, view.correct_rounds, view.accuracy_pct
    );
    println!(
        "Streak: {}  Best: {}",
        view.current_streak, view.best_streak
    );
    println!(
        "Cities seen: {}  guessed: {}",
        view.seen_cities, view.guessed_cities
    );
}

fn prompt(text: &str) -> Result<Option<String>> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
