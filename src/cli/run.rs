//! Run command implementation.

use super::output::{JsonGameSummary, format_summary};
use super::{CliError, LayoutArg, OutputFormat};
use std::path::PathBuf;
use tussle::render::render_text;
use tussle::rng::RandomSource;
use tussle::{Catalog, CharacterId, Recording, Ruleset, TurnEngine};

/// Decision cap so a wandering scripted game cannot spin forever.
const MAX_STEPS: usize = 100_000;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the game fails to run or the recording cannot be
/// saved.
#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
pub(crate) fn execute(
    players: usize,
    seed: Option<u64>,
    expansion: bool,
    aggressive: bool,
    layout: LayoutArg,
    format: OutputFormat,
    save: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    if !(1..=4).contains(&players) {
        return Err(CliError::new("player count must be between 1 and 4"));
    }

    // Generate seed if not provided
    let seed = seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(42))
            .unwrap_or(42)
    });

    let ruleset = Ruleset {
        expansion,
        aggressive,
    };
    let layout = layout.into();
    let catalog = Catalog::new(ruleset);
    let characters: Vec<CharacterId> = catalog
        .available_characters()
        .iter()
        .copied()
        .take(players)
        .collect();

    if !quiet {
        println!("Running game with seed {seed}...");
        let names: Vec<&str> = characters
            .iter()
            .map(|&c| catalog.character(c).name)
            .collect();
        println!("Players: {}", names.join(", "));
        println!();
    }

    let mut engine = TurnEngine::new(seed, players, ruleset, layout);
    for (seat, &character) in characters.iter().enumerate() {
        engine.set_character(seat, character)?;
    }
    engine.start()?;

    // The scripted policy draws from its own stream so game rolls stay
    // reproducible from the seed alone.
    let mut policy = RandomSource::seeded(seed ^ 0x9e37_79b9_7f4a_7c15);
    let mut last_turn = engine.turn();
    while !engine.is_game_over() && !engine.options().is_empty() && engine.step() < MAX_STEPS {
        let count = u64::try_from(engine.options().len()).unwrap_or(1);
        let index = usize::try_from(policy.next_u64() % count).unwrap_or(0);
        engine.advance(index)?;
        if !quiet && format == OutputFormat::Text && engine.turn() != last_turn {
            last_turn = engine.turn();
            print!("{}", render_text(&engine));
            println!();
        }
    }

    // Save recording if requested
    if let Some(save_path) = save {
        let recording = Recording::from_engine(seed, layout, characters, &engine);
        recording
            .save(&save_path)
            .map_err(|e| CliError::new(format!("Failed to save recording: {e}")))?;
        if !quiet {
            println!("Recording saved to: {}", save_path.display());
            println!();
        }
    }

    // Output based on format
    match format {
        OutputFormat::Text => {
            print!("{}", render_text(&engine));
            println!();
            print!("{}", format_summary(seed, &engine));
        }
        OutputFormat::Json => {
            let summary = JsonGameSummary::from_engine(seed, &engine);
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
