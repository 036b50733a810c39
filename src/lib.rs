// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Bounty Tussle: a deterministic, multiplayer, turn-based tactics engine.
//!
//! This crate provides a board-game engine designed for:
//! - Bit-exact deterministic play from a single seed
//! - A replayable decision log (choices in, rolls regenerated)
//! - Fog-of-war client synchronization without leaking hidden state
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Registry (persistence + auth)     │
//! ├──────────────────┬──────────────────┤
//! │   Sync payloads  │     Replay       │
//! ├──────────────────┴──────────────────┤
//! │      Turn Engine (game rules)       │
//! ├─────────────────────────────────────┤
//! │   Board graph / Catalog / RNG       │
//! └─────────────────────────────────────┘
//! ```

pub mod error;
pub mod game;
pub mod registry;
pub mod render;
pub mod replay;
pub mod rng;
pub mod sync;

pub use error::{TussleError, TussleResult};
pub use game::{
    Board, BoardLayout, Catalog, CharacterId, Command, Decision, EnemyId, Ruleset, StationId,
    TurnEngine, UpgradeId, assert_invariants, check_invariants,
};
pub use registry::{MemoryStore, Registry, RegistryError, Store, StoredGame};
pub use replay::{Recording, ReplayEngine, ReplayError};
pub use rng::RandomSource;
pub use sync::{CatchUpPayload, catch_up};
