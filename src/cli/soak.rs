//! Soak command implementation.
//!
//! Plays many scripted games in parallel and checks the engine invariants
//! after every decision. Any violation fails the run.

use super::CliError;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;
use tussle::rng::RandomSource;
use tussle::{
    BoardLayout, Catalog, CharacterId, Recording, ReplayEngine, Ruleset, TurnEngine,
    check_invariants,
};

/// Decision cap per game.
const MAX_STEPS: usize = 100_000;

/// How many violation reports to keep for the summary.
const REPORT_LIMIT: usize = 5;

#[derive(Debug, Default)]
struct SoakStats {
    games_played: u64,
    completed: u64,
    broken_games: u64,
    total_steps: u64,
    reports: Vec<String>,
}

impl SoakStats {
    fn merge(&mut self, other: Self) {
        self.games_played += other.games_played;
        self.completed += other.completed;
        self.broken_games += other.broken_games;
        self.total_steps += other.total_steps;
        for report in other.reports {
            if self.reports.len() < REPORT_LIMIT {
                self.reports.push(report);
            }
        }
    }
}

/// Execute the soak command.
///
/// # Errors
///
/// Returns an error if any game violates an engine invariant or fails to
/// play out.
pub(crate) fn execute(
    games: u64,
    players: usize,
    seed: Option<u64>,
    threads: Option<usize>,
    progress: bool,
) -> Result<(), CliError> {
    if !(1..=4).contains(&players) {
        return Err(CliError::new("player count must be between 1 and 4"));
    }

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    // Base seed
    let base_seed = seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(42))
            .unwrap_or(42)
    });

    // Progress bar
    let pb = if progress {
        let pb = ProgressBar::new(games);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
                .map_err(|e| CliError::new(format!("invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Run games in parallel, each thread folding into its own stats, merged
    // at the end. The hot path carries no shared state.
    let stats = (0..games)
        .into_par_iter()
        .fold(SoakStats::default, |mut local, i| {
            let game_seed = base_seed.wrapping_add(i);
            match soak_one(game_seed, players) {
                Ok(outcome) => {
                    local.games_played += 1;
                    local.total_steps += outcome.steps;
                    if outcome.completed {
                        local.completed += 1;
                    }
                    if let Some(report) = outcome.report {
                        local.broken_games += 1;
                        if local.reports.len() < REPORT_LIMIT {
                            local.reports.push(report);
                        }
                    }
                }
                Err(e) => {
                    local.games_played += 1;
                    local.broken_games += 1;
                    if local.reports.len() < REPORT_LIMIT {
                        local.reports.push(format!("seed {game_seed}: {e}"));
                    }
                }
            }
            local
        })
        .reduce(SoakStats::default, |mut a, b| {
            a.merge(b);
            a
        });

    if let Some(pb) = pb {
        pb.set_position(stats.games_played);
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    println!();
    println!(
        "Soaked {} games ({} completed, {} broken) in {:.2}s",
        stats.games_played,
        stats.completed,
        stats.broken_games,
        duration.as_secs_f64()
    );
    if stats.games_played > 0 {
        println!(
            "Average decisions per game: {}",
            stats.total_steps / stats.games_played
        );
    }
    for report in &stats.reports {
        println!("  {report}");
    }

    if stats.broken_games > 0 {
        return Err(CliError::new(format!(
            "{} of {} games violated engine invariants",
            stats.broken_games, stats.games_played
        )));
    }
    Ok(())
}

struct SoakOutcome {
    steps: u64,
    completed: bool,
    report: Option<String>,
}

/// Play one scripted game, checking invariants after every decision.
fn soak_one(seed: u64, players: usize) -> Result<SoakOutcome, CliError> {
    // Alternate rulesets across seeds so all four combinations soak.
    let ruleset = Ruleset {
        expansion: seed % 2 == 0,
        aggressive: seed % 4 < 2,
    };
    let catalog = Catalog::new(ruleset);
    let characters: Vec<CharacterId> = catalog
        .available_characters()
        .iter()
        .copied()
        .take(players)
        .collect();

    let mut engine = TurnEngine::new(seed, players, ruleset, BoardLayout::Standard);
    for (seat, &character) in characters.iter().enumerate() {
        engine.set_character(seat, character)?;
    }
    engine.start()?;

    let mut policy = RandomSource::seeded(seed ^ 0x9e37_79b9_7f4a_7c15);
    let mut report = None;
    while !engine.is_game_over() && !engine.options().is_empty() && engine.step() < MAX_STEPS {
        let count = u64::try_from(engine.options().len()).unwrap_or(1);
        let index = usize::try_from(policy.next_u64() % count).unwrap_or(0);
        engine.advance(index)?;
        let violations = check_invariants(&engine);
        if let Some(violation) = violations.first() {
            report = Some(format!(
                "seed {seed} step {}: {violation}",
                engine.step()
            ));
            break;
        }
    }

    // Re-replay the whole game from its log; any divergence is a
    // determinism bug.
    if report.is_none() {
        let recording =
            Recording::from_engine(seed, BoardLayout::Standard, characters, &engine);
        match replay_to_end(recording) {
            Ok(replayed) if replayed.board() == engine.board() => {}
            Ok(_) => {
                report = Some(format!("seed {seed}: replay reached a different state"));
            }
            Err(e) => report = Some(format!("seed {seed}: replay failed: {e}")),
        }
    }

    Ok(SoakOutcome {
        steps: u64::try_from(engine.step()).unwrap_or(u64::MAX),
        completed: engine.is_game_over(),
        report,
    })
}

fn replay_to_end(recording: Recording) -> Result<TurnEngine, CliError> {
    let mut replay = ReplayEngine::new(recording)?;
    while replay.step_forward()? {}
    Ok(replay.engine().clone())
}
