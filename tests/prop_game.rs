//! Property-based tests for the turn engine.
//!
//! These tests verify structural properties of arbitrary playouts:
//! invariants hold at every step, play is deterministic, and recordings
//! replay without divergence.
//!
//! Run with: cargo test --release prop_game

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::cast_possible_truncation)]

use proptest::prelude::*;

use tussle::rng::RandomSource;
use tussle::{
    BoardLayout, Catalog, CharacterId, Recording, ReplayEngine, Ruleset, TurnEngine,
    check_invariants,
};

/// Build a started engine with the first characters in pick order.
fn started(seed: u64, players: usize, ruleset: Ruleset, layout: BoardLayout) -> TurnEngine {
    let catalog = Catalog::new(ruleset);
    let mut engine = TurnEngine::new(seed, players, ruleset, layout);
    for (seat, &character) in catalog
        .available_characters()
        .iter()
        .take(players)
        .enumerate()
    {
        engine.set_character(seat, character).unwrap();
    }
    engine.start().unwrap();
    engine
}

/// Play up to `steps` decisions with a seed-derived policy.
fn play(engine: &mut TurnEngine, policy_seed: u64, steps: usize) {
    let mut policy = RandomSource::seeded(policy_seed);
    for _ in 0..steps {
        if engine.is_game_over() || engine.options().is_empty() {
            break;
        }
        let index = (policy.next_u64() % engine.options().len() as u64) as usize;
        engine.advance(index).unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every reachable state satisfies the structural invariants.
    #[test]
    fn prop_playouts_preserve_invariants(
        seed in any::<u64>(),
        players in 1usize..=4,
        expansion in any::<bool>(),
        aggressive in any::<bool>(),
        steps in 1usize..300
    ) {
        let ruleset = Ruleset { expansion, aggressive };
        let mut engine = started(seed, players, ruleset, BoardLayout::Standard);
        let mut policy = RandomSource::seeded(seed.rotate_left(17));
        for _ in 0..steps {
            if engine.is_game_over() || engine.options().is_empty() {
                break;
            }
            let index = (policy.next_u64() % engine.options().len() as u64) as usize;
            engine.advance(index).unwrap();
            let violations = check_invariants(&engine);
            prop_assert!(violations.is_empty(), "at step {}: {violations:?}", engine.step());
        }
    }

    /// The same seed and choices always produce the same game.
    #[test]
    fn prop_play_is_deterministic(
        seed in any::<u64>(),
        steps in 1usize..200
    ) {
        let ruleset = Ruleset { expansion: true, aggressive: false };
        let mut first = started(seed, 2, ruleset, BoardLayout::Standard);
        let mut second = started(seed, 2, ruleset, BoardLayout::Standard);
        play(&mut first, seed ^ 1, steps);
        play(&mut second, seed ^ 1, steps);
        prop_assert_eq!(first.step(), second.step());
        prop_assert_eq!(first.board(), second.board());
        prop_assert_eq!(first.decision_log().entries(), second.decision_log().entries());
    }

    /// Player stats never escape their maxima, no matter the playout.
    #[test]
    fn prop_stats_stay_bounded(
        seed in any::<u64>(),
        steps in 1usize..250
    ) {
        let ruleset = Ruleset { expansion: seed % 2 == 0, aggressive: seed % 3 == 0 };
        let mut engine = started(seed, 2, ruleset, BoardLayout::Standard);
        play(&mut engine, seed.rotate_right(11), steps);
        for seat in 0..engine.player_count() {
            let state = engine.player_state(seat);
            prop_assert!(state.health <= state.max_health);
            prop_assert!(state.missiles <= state.max_missiles);
        }
    }

    /// Any prefix of a recording replays without divergence and lands on
    /// a choice boundary at or past the target.
    #[test]
    fn prop_recordings_replay_cleanly(
        seed in any::<u64>(),
        steps in 1usize..150,
        cut_permille in 0usize..1000
    ) {
        let ruleset = Ruleset { expansion: true, aggressive: true };
        let characters = vec![CharacterId::Scout, CharacterId::Frost];
        let mut engine = started(seed, 2, ruleset, BoardLayout::Standard);
        play(&mut engine, seed ^ 2, steps);
        let recording =
            Recording::from_engine(seed, BoardLayout::Standard, characters, &engine);

        let cut = recording.decisions.len() * cut_permille / 1000;
        let replay = ReplayEngine::new_at_step(recording, cut).unwrap();
        prop_assert!(replay.step() >= cut || replay.is_finished());
        let violations = check_invariants(replay.engine());
        prop_assert!(violations.is_empty(), "{violations:?}");
    }
}
