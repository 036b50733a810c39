//! The game domain: stat catalog, board graph, tokens, commands, board
//! setup, the turn engine, and structural self-checks.

pub mod board;
pub mod catalog;
pub mod command;
pub mod engine;
pub mod invariants;
pub mod setup;
pub mod token;

pub use board::{Board, MapNode, NodeId, SeatId, TokenId};
pub use catalog::{Catalog, CharacterId, EnemyId, Ruleset, StationId, UpgradeId};
pub use command::{Command, Decision, DecisionLog, Weapon};
pub use engine::TurnEngine;
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use setup::{BoardLayout, build_board};
pub use token::{EnemyState, PlayerState, StationState, Token, TokenKind};
