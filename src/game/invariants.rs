//! Structural self-checks over a live engine.
//!
//! These are the properties that hold after every decision regardless of
//! ruleset or layout. The soak command and the integration tests run them
//! after each step; a violation means an engine bug, not a bad input.

use std::fmt;

use crate::game::board::{SeatId, TokenId};
use crate::game::command::Command;
use crate::game::engine::TurnEngine;
use crate::game::token::Token;

/// One violated invariant, with enough context to locate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A token's containing node does not list it, or lists it twice.
    TokenContainment {
        /// The inconsistent token.
        token: TokenId,
    },
    /// A node lists a token that is not actually in it.
    StrayNodeEntry {
        /// The token listed in the wrong node.
        token: TokenId,
    },
    /// A player's health or missiles exceed their maximum.
    StatAboveMaximum {
        /// The offending seat.
        seat: SeatId,
    },
    /// Player tokens are not the first tokens, in seat order.
    SeatOrder,
    /// An offered option points at a node or seat that does not exist.
    DanglingOption,
    /// A defeated enemy is still on the board.
    DeadEnemyOnBoard {
        /// The lingering token.
        token: TokenId,
    },
    /// The checkpoint or rewind cutoff is ahead of the decision log.
    CheckpointAhead,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::TokenContainment { token } => {
                write!(f, "token {token} and its node disagree about containment")
            }
            InvariantViolation::StrayNodeEntry { token } => {
                write!(f, "a node lists token {token} that is not in it")
            }
            InvariantViolation::StatAboveMaximum { seat } => {
                write!(f, "seat {seat} has health or missiles above maximum")
            }
            InvariantViolation::SeatOrder => {
                write!(f, "player tokens are not first in seat order")
            }
            InvariantViolation::DanglingOption => {
                write!(f, "an offered option references a nonexistent node or seat")
            }
            InvariantViolation::DeadEnemyOnBoard { token } => {
                write!(f, "defeated enemy {token} is still on the board")
            }
            InvariantViolation::CheckpointAhead => {
                write!(f, "checkpoint or rewind cutoff is ahead of the log")
            }
        }
    }
}

/// Check every structural invariant, returning all violations found.
#[must_use]
pub fn check_invariants(engine: &TurnEngine) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let board = engine.board();

    for (id, token) in board.tokens.iter().enumerate() {
        match token.node {
            Some(node) => {
                let listed = board
                    .tokens_at(node)
                    .iter()
                    .filter(|&&t| t == id)
                    .count();
                if listed != 1 {
                    violations.push(InvariantViolation::TokenContainment { token: id });
                }
            }
            None => {
                if board.nodes.iter().any(|n| n.tokens.contains(&id)) {
                    violations.push(InvariantViolation::TokenContainment { token: id });
                }
            }
        }
        if token.revealed && token.node.is_some() {
            if let Some(enemy) = token.as_enemy() {
                if !enemy.is_alive() {
                    violations.push(InvariantViolation::DeadEnemyOnBoard { token: id });
                }
            }
        }
    }

    for node in &board.nodes {
        for &id in &node.tokens {
            if id >= board.tokens.len() {
                violations.push(InvariantViolation::StrayNodeEntry { token: id });
            }
        }
    }

    let player_count = engine.player_count();
    let seats_first = board.tokens.iter().take(player_count).all(Token::is_player)
        && board
            .tokens
            .iter()
            .skip(player_count)
            .all(|t| !t.is_player());
    if !seats_first {
        violations.push(InvariantViolation::SeatOrder);
    }

    for seat in 0..player_count {
        let player = engine.player_state(seat);
        if player.health > player.max_health || player.missiles > player.max_missiles {
            violations.push(InvariantViolation::StatAboveMaximum { seat });
        }
    }

    let node_count = board.nodes.len();
    for option in engine.options() {
        let ok = match option {
            Command::PickStartLocation { node }
            | Command::Move { node }
            | Command::DodgeAndMove { node } => *node < node_count,
            Command::Attack { node, .. } => node.is_none_or(|n| n < node_count),
            Command::AcceptDefeat { seat }
            | Command::PermitAssist { seat, .. }
            | Command::RejectAssist { seat, .. } => *seat < player_count,
            _ => true,
        };
        if !ok {
            violations.push(InvariantViolation::DanglingOption);
        }
    }

    let log_ahead = engine.last_reversible_step() > engine.step() + 1
        || engine
            .checkpoint()
            .is_some_and(|checkpoint| checkpoint.step > engine.step());
    if log_ahead {
        violations.push(InvariantViolation::CheckpointAhead);
    }

    violations
}

/// Assert the invariants in debug builds.
///
/// # Panics
///
/// Panics if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(engine: &TurnEngine) {
    let violations = check_invariants(engine);
    assert!(
        violations.is_empty(),
        "engine invariants violated: {violations:?}"
    );
}

/// Assert the invariants in debug builds. No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_engine: &TurnEngine) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{CharacterId, Ruleset};
    use crate::game::setup::BoardLayout;

    #[test]
    fn test_fresh_game_has_no_violations() {
        let ruleset = Ruleset {
            expansion: true,
            aggressive: false,
        };
        let mut engine = TurnEngine::new(7, 2, ruleset, BoardLayout::Compact);
        engine.set_character(0, CharacterId::Scout).unwrap();
        engine.set_character(1, CharacterId::Volt).unwrap();
        engine.start().unwrap();
        assert_eq!(check_invariants(&engine), Vec::new());
    }

    #[test]
    fn test_violations_hold_through_play() {
        let ruleset = Ruleset {
            expansion: true,
            aggressive: true,
        };
        let mut engine = TurnEngine::new(1234, 3, ruleset, BoardLayout::Standard);
        engine.set_character(0, CharacterId::Scout).unwrap();
        engine.set_character(1, CharacterId::Frost).unwrap();
        engine.set_character(2, CharacterId::Blade).unwrap();
        engine.start().unwrap();
        for _ in 0..200 {
            if engine.is_game_over() || engine.options().is_empty() {
                break;
            }
            engine.advance(0).unwrap();
            assert_eq!(check_invariants(&engine), Vec::new());
        }
    }
}
