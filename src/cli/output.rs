//! Output formatting shared by CLI commands.

use serde::Serialize;
use tussle::TurnEngine;

/// JSON summary of a finished (or halted) game.
#[derive(Debug, Serialize)]
pub(crate) struct JsonGameSummary {
    /// Seed the game was built from.
    pub(crate) seed: u64,
    /// Number of seats.
    pub(crate) players: usize,
    /// Turns played.
    pub(crate) turns: i64,
    /// Decisions logged.
    pub(crate) steps: usize,
    /// Whether the game reached an end state.
    pub(crate) game_over: bool,
    /// Seats in final-standing order; the winner first.
    pub(crate) rankings: Vec<usize>,
    /// Score per seat, in seat order.
    pub(crate) scores: Vec<u32>,
}

impl JsonGameSummary {
    pub(crate) fn from_engine(seed: u64, engine: &TurnEngine) -> Self {
        let scores = (0..engine.player_count())
            .map(|seat| engine.player_state(seat).score)
            .collect();
        Self {
            seed,
            players: engine.player_count(),
            turns: engine.turn(),
            steps: engine.step(),
            game_over: engine.is_game_over(),
            rankings: engine.final_rankings(),
            scores,
        }
    }
}

/// One-paragraph text summary of a finished game.
pub(crate) fn format_summary(seed: u64, engine: &TurnEngine) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Seed {seed}: {} turns, {} decisions, ",
        engine.turn(),
        engine.step()
    ));
    if engine.is_game_over() {
        let rankings = engine.final_rankings();
        match rankings.first() {
            Some(&winner) => {
                output.push_str(&format!(
                    "winner seat {winner} with score {}\n",
                    engine.player_state(winner).score
                ));
            }
            None => output.push_str("no survivors\n"),
        }
    } else {
        output.push_str("halted before the end\n");
    }
    output
}
