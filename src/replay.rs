//! Game recording and replay.
//!
//! Games are fully deterministic, so a replay needs only the construction
//! arguments (seed, seat count, ruleset, layout), the character picks, and
//! the decision log. To view step N, rebuild from step 0 and apply the
//! logged choices; the engine regenerates every roll from the seed, and the
//! regenerated rolls are checked against the logged ones so a stale or
//! tampered recording fails loudly instead of silently diverging.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TussleError;
use crate::game::{BoardLayout, CharacterId, Decision, Ruleset, TurnEngine};

/// Everything needed to reconstruct a game exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Seed the game was built from.
    pub seed: u64,
    /// Number of seats.
    pub player_count: usize,
    /// Ruleset in play.
    pub ruleset: Ruleset,
    /// Board layout the seed was applied to.
    pub layout: BoardLayout,
    /// Character picks, in seat order.
    pub characters: Vec<CharacterId>,
    /// The full decision log: every roll and choice, in order.
    pub decisions: Vec<Decision>,
}

impl Recording {
    /// Capture a recording from a live engine and its construction
    /// arguments.
    #[must_use]
    pub fn from_engine(
        seed: u64,
        layout: BoardLayout,
        characters: Vec<CharacterId>,
        engine: &TurnEngine,
    ) -> Self {
        Self {
            seed,
            player_count: engine.player_count(),
            ruleset: engine.ruleset(),
            layout,
            characters,
            decisions: engine.decision_log().entries().to_vec(),
        }
    }

    /// Save the recording as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load a recording from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// recording.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// Error type for replay operations.
#[derive(Debug)]
pub enum ReplayError {
    /// File read or write failed.
    Io(io::Error),
    /// The recording file is not valid JSON for a recording.
    Format(serde_json::Error),
    /// The engine rejected a logged decision.
    Engine(TussleError),
    /// A logged entry disagrees with what the rebuilt engine produced.
    Divergence {
        /// Log position of the first disagreement.
        step: usize,
    },
    /// A requested step is beyond the end of the recording.
    StepOutOfBounds {
        /// The requested step.
        requested: usize,
        /// Number of logged decisions.
        max_step: usize,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "recording file error: {e}"),
            Self::Format(e) => write!(f, "recording format error: {e}"),
            Self::Engine(e) => write!(f, "replay rejected: {e}"),
            Self::Divergence { step } => {
                write!(f, "replay diverged from the recording at step {step}")
            }
            Self::StepOutOfBounds { requested, max_step } => {
                write!(f, "step {requested} out of bounds (recording has {max_step})")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<io::Error> for ReplayError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(e)
    }
}

impl From<TussleError> for ReplayError {
    fn from(e: TussleError) -> Self {
        Self::Engine(e)
    }
}

/// Steps through a recorded game deterministically.
///
/// - Forward: apply the next logged choice; the engine re-rolls the dice
///   itself and the results are verified against the log.
/// - Backward or jump: rebuild from step 0 and apply choices up to the
///   target.
#[derive(Debug)]
pub struct ReplayEngine {
    recording: Recording,
    engine: TurnEngine,
}

impl ReplayEngine {
    /// Create a replay at step 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the recording cannot reconstruct a game.
    pub fn new(recording: Recording) -> Result<Self, ReplayError> {
        Self::new_at_step(recording, 0)
    }

    /// Create a replay advanced to the given step (log position).
    ///
    /// # Errors
    ///
    /// Returns an error if the step is out of bounds or the recording
    /// diverges from the rebuilt game.
    pub fn new_at_step(recording: Recording, target_step: usize) -> Result<Self, ReplayError> {
        if target_step > recording.decisions.len() {
            return Err(ReplayError::StepOutOfBounds {
                requested: target_step,
                max_step: recording.decisions.len(),
            });
        }
        let mut engine = TurnEngine::new(
            recording.seed,
            recording.player_count,
            recording.ruleset,
            recording.layout,
        );
        for (seat, &character) in recording.characters.iter().enumerate() {
            engine.set_character(seat, character)?;
        }
        engine.start()?;
        let mut replay = Self { recording, engine };
        replay.verify_prefix()?;
        while replay.engine.step() < target_step {
            if !replay.step_forward()? {
                break;
            }
        }
        Ok(replay)
    }

    /// The recording being replayed.
    #[must_use]
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// The reconstructed engine at the current step.
    #[must_use]
    pub fn engine(&self) -> &TurnEngine {
        &self.engine
    }

    /// Current log position.
    #[must_use]
    pub fn step(&self) -> usize {
        self.engine.step()
    }

    /// Whether the whole recording has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.engine.step() >= self.recording.decisions.len()
    }

    /// Apply the next logged choice. Returns false if the recording is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the choice or the regenerated
    /// rolls disagree with the logged ones.
    pub fn step_forward(&mut self) -> Result<bool, ReplayError> {
        let mut position = self.engine.step();
        loop {
            let Some(entry) = self.recording.decisions.get(position) else {
                return Ok(false);
            };
            match entry {
                // The engine produces roll entries on its own while applying
                // the choice that follows them.
                Decision::Roll { .. } => position += 1,
                Decision::Choice { index, .. } => {
                    let index = *index;
                    self.engine.advance(index)?;
                    self.verify_prefix()?;
                    crate::game::assert_invariants(&self.engine);
                    return Ok(true);
                }
            }
        }
    }

    /// Rebuild back to the previous choice boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if reconstruction fails.
    pub fn step_backward(&mut self) -> Result<(), ReplayError> {
        self.goto_step(self.engine.step().saturating_sub(1))
    }

    /// Jump to an arbitrary step by rebuilding from step 0. The replay
    /// lands on the last choice boundary at or before the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is out of bounds or reconstruction
    /// fails.
    pub fn goto_step(&mut self, target_step: usize) -> Result<(), ReplayError> {
        let recording = self.recording.clone();
        *self = Self::new_at_step(recording, target_step)?;
        Ok(())
    }

    /// Compare everything the engine has produced so far against the
    /// recorded log.
    fn verify_prefix(&self) -> Result<(), ReplayError> {
        let produced = self.engine.decision_log().entries();
        let expected = &self.recording.decisions;
        for (step, (have, want)) in produced.iter().zip(expected).enumerate() {
            if have != want {
                if let (
                    Decision::Roll { value: computed, .. },
                    Decision::Roll { value: logged, .. },
                ) = (have, want)
                {
                    return Err(ReplayError::Engine(TussleError::RollMismatch {
                        logged: *logged,
                        computed: *computed,
                    }));
                }
                return Err(ReplayError::Divergence { step });
            }
        }
        Ok(())
    }
}
