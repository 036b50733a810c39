//! Full-game integration tests.
//!
//! These tests play complete scripted games and verify that the engine
//! never panics, never violates its structural invariants, and reproduces
//! identically from a seed.
//!
//! Run with: cargo test --release game_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::cast_possible_truncation)]

use tussle::rng::RandomSource;
use tussle::{
    BoardLayout, Catalog, CharacterId, MemoryStore, Recording, Registry, ReplayEngine, Ruleset,
    TurnEngine, check_invariants,
};

const MAX_STEPS: usize = 50_000;

/// Play one game to the end with a seed-derived decision policy.
fn play_scripted(seed: u64, players: usize, ruleset: Ruleset, layout: BoardLayout) -> TurnEngine {
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

    let mut policy = RandomSource::seeded(seed ^ 0x9e37_79b9_7f4a_7c15);
    while !engine.is_game_over() && !engine.options().is_empty() && engine.step() < MAX_STEPS {
        let index = (policy.next_u64() % engine.options().len() as u64) as usize;
        engine.advance(index).unwrap();
    }
    engine
}

#[test]
fn test_full_game_no_panic() {
    let ruleset = Ruleset {
        expansion: true,
        aggressive: false,
    };
    let engine = play_scripted(42, 2, ruleset, BoardLayout::Standard);
    assert!(engine.step() > 0);
    let violations = check_invariants(&engine);
    assert!(violations.is_empty(), "violations: {violations:?}");
}

#[test]
fn test_multiple_seeds_no_panic() {
    for seed in 0..20u64 {
        let ruleset = Ruleset {
            expansion: seed % 2 == 0,
            aggressive: seed % 4 < 2,
        };
        let players = (seed as usize % 3) + 1;
        let engine = play_scripted(seed, players, ruleset, BoardLayout::Standard);
        let violations = check_invariants(&engine);
        assert!(violations.is_empty(), "seed {seed}: {violations:?}");
    }
}

#[test]
fn test_same_seed_reproduces_the_game() {
    let ruleset = Ruleset {
        expansion: false,
        aggressive: true,
    };
    let first = play_scripted(7, 3, ruleset, BoardLayout::Standard);
    let second = play_scripted(7, 3, ruleset, BoardLayout::Standard);
    assert_eq!(first.step(), second.step());
    assert_eq!(first.turn(), second.turn());
    assert_eq!(first.board(), second.board());
    assert_eq!(
        first.decision_log().entries(),
        second.decision_log().entries()
    );
}

#[test]
fn test_recorded_game_replays_to_the_same_state() {
    let ruleset = Ruleset {
        expansion: true,
        aggressive: true,
    };
    let characters = vec![CharacterId::Scout, CharacterId::Striker];
    let engine = play_scripted(99, 2, ruleset, BoardLayout::Standard);
    let recording = Recording::from_engine(99, BoardLayout::Standard, characters, &engine);

    let mut replay = ReplayEngine::new(recording).unwrap();
    while replay.step_forward().unwrap() {}
    assert_eq!(replay.engine().board(), engine.board());
    assert_eq!(replay.engine().turn(), engine.turn());
}

#[test]
fn test_registry_matches_a_direct_engine() {
    let ruleset = Ruleset {
        expansion: true,
        aggressive: false,
    };
    let player_ids = [501u64, 502u64];
    let mut registry = Registry::new(MemoryStore::new());
    let (id, _) = registry
        .new_game(player_ids.to_vec(), ruleset, BoardLayout::Standard, 2025)
        .unwrap();
    registry
        .pick_character(id, player_ids[0], CharacterId::Scout)
        .unwrap();
    registry
        .pick_character(id, player_ids[1], CharacterId::Striker)
        .unwrap();

    let mut direct = TurnEngine::new(2025, 2, ruleset, BoardLayout::Standard);
    direct.set_character(0, CharacterId::Scout).unwrap();
    direct.set_character(1, CharacterId::Striker).unwrap();
    direct.start().unwrap();

    let mut policy = RandomSource::seeded(8);
    for round in 0..200 {
        if direct.is_game_over() || direct.options().is_empty() {
            break;
        }
        let index = (policy.next_u64() % direct.options().len() as u64) as usize;
        let command = direct.options()[index].clone();
        let seat = command.acting_seat(direct.current_seat());
        registry.act(id, player_ids[seat], command.clone()).unwrap();
        direct.advance(index).unwrap();

        // Evictions force reconstruction from stored decisions.
        if round % 25 == 24 {
            registry.evict(id);
        }
    }

    let cached = registry.engine(id).unwrap();
    assert_eq!(cached.step(), direct.step());
    assert_eq!(cached.board(), direct.board());
}

#[test]
fn test_finished_games_rank_every_seat() {
    for seed in [3u64, 11, 29] {
        let ruleset = Ruleset {
            expansion: false,
            aggressive: false,
        };
        let engine = play_scripted(seed, 3, ruleset, BoardLayout::Standard);
        if !engine.is_game_over() {
            continue;
        }
        let mut rankings = engine.final_rankings();
        rankings.sort_unstable();
        assert_eq!(rankings, vec![0, 1, 2], "seed {seed}");
    }
}
