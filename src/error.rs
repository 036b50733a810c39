//! Error types for the turn engine.

use std::fmt;

/// Errors produced while validating or applying commands.
///
/// `InvalidCommand` and `NotYourTurn` are recoverable: the game state is
/// untouched and the caller may submit a different command. The desync
/// variants are fatal to the reconstruction that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TussleError {
    /// The submitted command does not structurally match any currently
    /// offered option.
    InvalidCommand,
    /// The command was submitted by a seat that is not allowed to act on it.
    NotYourTurn,
    /// The game has already ended; only defeat acceptance is still allowed.
    GameOver,
    /// The operation is recognized but deliberately not implemented.
    Unimplemented(&'static str),
    /// A scripted random source ran out of logged rolls.
    RollLogExhausted,
    /// A logged choice index does not fit the regenerated option set.
    DecisionOutOfRange {
        /// The logged index.
        index: usize,
        /// How many options the engine regenerated.
        available: usize,
    },
    /// A logged roll disagrees with the roll regenerated from the seed.
    RollMismatch {
        /// The value found in the log.
        logged: u32,
        /// The value the seeded generator produced.
        computed: u32,
    },
}

impl fmt::Display for TussleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TussleError::InvalidCommand => write!(f, "command does not match any offered option"),
            TussleError::NotYourTurn => write!(f, "command not available to this seat right now"),
            TussleError::GameOver => write!(f, "game has ended"),
            TussleError::Unimplemented(what) => write!(f, "not implemented: {what}"),
            TussleError::RollLogExhausted => {
                write!(f, "replay desync: ran out of logged rolls")
            }
            TussleError::DecisionOutOfRange { index, available } => {
                write!(
                    f,
                    "replay desync: choice index {index} out of range ({available} options)"
                )
            }
            TussleError::RollMismatch { logged, computed } => {
                write!(f, "replay desync: logged roll {logged} but regenerated {computed}")
            }
        }
    }
}

impl std::error::Error for TussleError {}

/// Result type for engine operations.
pub type TussleResult<T> = Result<T, TussleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_contains_detail() {
        let err = TussleError::DecisionOutOfRange {
            index: 7,
            available: 3,
        };
        let text = format!("{err}");
        assert!(text.contains('7'));
        assert!(text.contains('3'));

        let err = TussleError::Unimplemented("revert");
        assert!(format!("{err}").contains("revert"));
    }

    #[test]
    fn test_recoverable_errors_are_distinct() {
        assert_ne!(TussleError::InvalidCommand, TussleError::NotYourTurn);
        assert_ne!(TussleError::InvalidCommand, TussleError::GameOver);
    }
}
