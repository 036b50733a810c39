//! CLI command implementations for Tussle.

pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod soak;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;

use tussle::BoardLayout;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Board layout argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LayoutArg {
    /// The full board.
    Standard,
    /// The compact short-game board.
    Compact,
}

impl From<LayoutArg> for BoardLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Standard => Self::Standard,
            LayoutArg::Compact => Self::Compact,
        }
    }
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<tussle::TussleError> for CliError {
    fn from(e: tussle::TussleError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<tussle::ReplayError> for CliError {
    fn from(e: tussle::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}
