//! Replay command implementation.

use super::CliError;
use std::path::Path;
use tussle::render::render_text;
use tussle::replay::{Recording, ReplayEngine};

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or diverges during
/// replay.
pub(crate) fn execute(
    recording: &Path,
    step: Option<usize>,
    verbose: bool,
) -> Result<(), CliError> {
    let recording = Recording::load(recording)
        .map_err(|e| CliError::new(format!("Failed to load recording: {e}")))?;
    let target = step.unwrap_or(recording.decisions.len());

    if verbose {
        let mut replay = ReplayEngine::new(recording)?;
        print!("{}", render_text(replay.engine()));
        while replay.step() < target {
            if !replay.step_forward()? {
                break;
            }
            println!();
            print!("{}", render_text(replay.engine()));
        }
    } else {
        let replay = ReplayEngine::new_at_step(recording, target)?;
        print!("{}", render_text(replay.engine()));
    }
    Ok(())
}
