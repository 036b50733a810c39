#![no_main]

//! Full playout fuzzer.
//!
//! Builds a game from fuzzer-chosen construction arguments, drives it with
//! a fuzzer-chosen sequence of option indexes, and checks the structural
//! invariants after every decision. This catches rule-interaction bugs
//! that unit tests of individual mechanics miss.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tussle::{check_invariants, BoardLayout, Catalog, Ruleset, TurnEngine};

/// Structured input for playout fuzzing.
#[derive(Arbitrary, Debug)]
struct PlayoutInput {
    /// Board seed.
    seed: u64,
    /// Seat count, reduced to 1-4.
    players: u8,
    /// Expansion content on or off.
    expansion: bool,
    /// Aggressive ruleset on or off.
    aggressive: bool,
    /// Compact or standard board.
    compact: bool,
    /// Option indexes, each reduced modulo the live option count.
    choices: Vec<u8>,
}

fuzz_target!(|input: PlayoutInput| {
    let players = (input.players as usize % 4) + 1;
    let ruleset = Ruleset {
        expansion: input.expansion,
        aggressive: input.aggressive,
    };
    let layout = if input.compact {
        BoardLayout::Compact
    } else {
        BoardLayout::Standard
    };

    let catalog = Catalog::new(ruleset);
    let mut engine = TurnEngine::new(input.seed, players, ruleset, layout);
    for (seat, &character) in catalog
        .available_characters()
        .iter()
        .take(players)
        .enumerate()
    {
        engine.set_character(seat, character).expect("pick");
    }
    engine.start().expect("start");

    // Cap decisions to avoid excessive runtime
    for &choice in input.choices.iter().take(2000) {
        if engine.is_game_over() || engine.options().is_empty() {
            break;
        }
        let index = choice as usize % engine.options().len();
        engine.advance(index).expect("advance a listed option");

        let violations = check_invariants(&engine);
        assert!(
            violations.is_empty(),
            "Invariants violated at step {}: {:?}",
            engine.step(),
            violations
        );
    }
});
