//! Benchmarks for full scripted playouts and client catch-up.
//!
//! The playout loop is the hot path for soak runs and replay; catch-up is
//! the hot path on the server.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use tussle::rng::RandomSource;
use tussle::sync::catch_up;
use tussle::{BoardLayout, Catalog, Ruleset, TurnEngine};

const MAX_STEPS: usize = 20_000;

/// Play one full scripted game.
fn play_game(seed: u64, players: usize) -> TurnEngine {
    let ruleset = Ruleset {
        expansion: true,
        aggressive: false,
    };
    let catalog = Catalog::new(ruleset);
    let mut engine = TurnEngine::new(seed, players, ruleset, BoardLayout::Standard);
    for (seat, &character) in catalog
        .available_characters()
        .iter()
        .take(players)
        .enumerate()
    {
        engine
            .set_character(seat, character)
            .expect("character pick");
    }
    engine.start().expect("start");
    let mut policy = RandomSource::seeded(seed ^ 0x9e37_79b9_7f4a_7c15);
    while !engine.is_game_over() && !engine.options().is_empty() && engine.step() < MAX_STEPS {
        let index = (policy.next_u64() % engine.options().len() as u64) as usize;
        engine.advance(index).expect("advance");
    }
    engine
}

fn bench_single_game(c: &mut Criterion) {
    c.bench_function("single_game_2p", |b| {
        b.iter(|| black_box(play_game(black_box(42), 2)));
    });
}

fn bench_single_game_4p(c: &mut Criterion) {
    c.bench_function("single_game_4p", |b| {
        b.iter(|| black_box(play_game(black_box(42), 4)));
    });
}

fn bench_full_catch_up(c: &mut Criterion) {
    let engine = play_game(42, 2);
    c.bench_function("full_catch_up", |b| {
        b.iter(|| black_box(catch_up(black_box(&engine), 42, BoardLayout::Standard, None)));
    });
}

criterion_group!(
    benches,
    bench_single_game,
    bench_single_game_4p,
    bench_full_catch_up
);
criterion_main!(benches);
