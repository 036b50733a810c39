//! Game registry: persistence, seat authorization, and the live cache.
//!
//! Persistent storage is deliberately minimal: the construction arguments
//! plus one integer per decision. The first `player_count` stored decisions
//! are character picks (indexes into the available-character list); the
//! rest are choice indexes into the engine's regenerated option lists.
//! Rolls are never stored, because the seed regenerates them. A game that
//! fell out of the live cache is rebuilt by replaying its stored decisions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TussleError;
use crate::game::{BoardLayout, Catalog, CharacterId, Command, Ruleset, TurnEngine};
use crate::sync::{self, CatchUpPayload};

/// Persistent game identifier.
pub type GameId = u64;

/// External player identifier, as known to the surrounding service.
pub type PlayerId = u64;

/// The full persistent record of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGame {
    /// Seed the board was built from.
    pub seed: u64,
    /// External ids of the players, in seat order.
    pub player_ids: Vec<PlayerId>,
    /// Ruleset in play.
    pub ruleset: Ruleset,
    /// Board layout.
    pub layout: BoardLayout,
    /// Character picks, then choice indexes, in order.
    pub decisions: Vec<usize>,
}

/// Errors from registry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// No game with that id exists.
    UnknownGame(GameId),
    /// The submitting player is not seated in this game.
    UnknownPlayer(PlayerId),
    /// The command belongs to a different seat right now.
    NotYourTurn,
    /// Character picks are only possible before the game starts.
    GameAlreadyStarted,
    /// Another player already picked that character.
    CharacterTaken,
    /// The engine rejected the command or a replayed decision.
    Engine(TussleError),
    /// A stored game failed to reconstruct; storage and engine disagree.
    Desync,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGame(id) => write!(f, "no game with id {id}"),
            Self::UnknownPlayer(id) => write!(f, "player {id} is not in this game"),
            Self::NotYourTurn => write!(f, "that command is not yours to give right now"),
            Self::GameAlreadyStarted => write!(f, "the game has already started"),
            Self::CharacterTaken => write!(f, "another player already picked that character"),
            Self::Engine(e) => write!(f, "{e}"),
            Self::Desync => write!(f, "stored game failed to reconstruct"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<TussleError> for RegistryError {
    fn from(e: TussleError) -> Self {
        Self::Engine(e)
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Persistent storage for games. One integer per decision is all that is
/// ever appended.
pub trait Store {
    /// Persist a new game record and return its id.
    fn create(&mut self, game: StoredGame) -> RegistryResult<GameId>;
    /// Append one decision to a game's record.
    fn append(&mut self, id: GameId, decision: usize) -> RegistryResult<()>;
    /// Read a game's record.
    fn read(&self, id: GameId) -> RegistryResult<StoredGame>;
    /// Ids of every game a player is seated in.
    fn find_for_player(&self, player: PlayerId) -> Vec<GameId>;
}

/// In-memory store, for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: HashMap<GameId, StoredGame>,
    next_id: GameId,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn create(&mut self, game: StoredGame) -> RegistryResult<GameId> {
        let id = self.next_id;
        self.next_id += 1;
        self.games.insert(id, game);
        Ok(id)
    }

    fn append(&mut self, id: GameId, decision: usize) -> RegistryResult<()> {
        let game = self.games.get_mut(&id).ok_or(RegistryError::UnknownGame(id))?;
        game.decisions.push(decision);
        Ok(())
    }

    fn read(&self, id: GameId) -> RegistryResult<StoredGame> {
        self.games
            .get(&id)
            .cloned()
            .ok_or(RegistryError::UnknownGame(id))
    }

    fn find_for_player(&self, player: PlayerId) -> Vec<GameId> {
        let mut ids: Vec<GameId> = self
            .games
            .iter()
            .filter(|(_, game)| game.player_ids.contains(&player))
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

struct LiveGame {
    engine: TurnEngine,
    seed: u64,
    layout: BoardLayout,
    player_ids: Vec<PlayerId>,
}

/// The authoritative multi-game front end: owns the store, keeps a live
/// cache of engines, authorizes every command by seat, and hands out
/// catch-up payloads.
pub struct Registry<S: Store> {
    store: S,
    live: HashMap<GameId, LiveGame>,
}

impl<S: Store> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("live_games", &self.live.len())
            .finish_non_exhaustive()
    }
}

impl<S: Store> Registry<S> {
    /// Create a registry over a store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            live: HashMap::new(),
        }
    }

    /// Start a new game and return its id plus the full payload the first
    /// client needs.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the new record.
    pub fn new_game(
        &mut self,
        player_ids: Vec<PlayerId>,
        ruleset: Ruleset,
        layout: BoardLayout,
        seed: u64,
    ) -> RegistryResult<(GameId, CatchUpPayload)> {
        let id = self.store.create(StoredGame {
            seed,
            player_ids: player_ids.clone(),
            ruleset,
            layout,
            decisions: Vec::new(),
        })?;
        let engine = TurnEngine::new(seed, player_ids.len(), ruleset, layout);
        let game = LiveGame {
            engine,
            seed,
            layout,
            player_ids,
        };
        let payload =
            sync::catch_up(&game.engine, game.seed, game.layout, None).ok_or(RegistryError::Desync)?;
        self.live.insert(id, game);
        Ok((id, payload))
    }

    /// A player picks a character. When the last pick lands, the game
    /// starts.
    ///
    /// # Errors
    ///
    /// Rejects picks after the game has started, picks of taken or
    /// unavailable characters, and players not seated in the game.
    pub fn pick_character(
        &mut self,
        id: GameId,
        player: PlayerId,
        character: CharacterId,
    ) -> RegistryResult<CatchUpPayload> {
        let picks = {
            let game = self.live_game(id)?;
            if game.engine.step() > 0 {
                return Err(RegistryError::GameAlreadyStarted);
            }
            let seat = seat_of(&game.player_ids, player)?;
            for other in 0..game.engine.player_count() {
                if other != seat && game.engine.player_state(other).character == Some(character) {
                    return Err(RegistryError::CharacterTaken);
                }
            }
            game.engine.set_character(seat, character)?;

            if game.engine.all_characters_picked() {
                let catalog = Catalog::new(game.engine.ruleset());
                let mut picks = Vec::with_capacity(game.engine.player_count());
                for seat in 0..game.engine.player_count() {
                    let picked = game.engine.player_state(seat).character;
                    let index = picked
                        .and_then(|c| catalog.available_characters().iter().position(|&a| a == c))
                        .ok_or(RegistryError::Desync)?;
                    picks.push(index);
                }
                Some(picks)
            } else {
                None
            }
        };

        // Persist every pick at once, in seat order, then start.
        if let Some(picks) = picks {
            for index in picks {
                self.store.append(id, index)?;
            }
            let game = self.live_game(id)?;
            game.engine.start()?;
        }

        let game = self.live_game(id)?;
        sync::catch_up(&game.engine, game.seed, game.layout, Some(0)).ok_or(RegistryError::Desync)
    }

    /// A player submits a command. The command is authorized by seat,
    /// matched against the current options, persisted, and applied. The
    /// returned payload catches the submitting player up from the decision
    /// count they last saw.
    ///
    /// # Errors
    ///
    /// Rejects commands from the wrong seat and commands that match no
    /// offered option.
    pub fn act(
        &mut self,
        id: GameId,
        player: PlayerId,
        command: Command,
    ) -> RegistryResult<CatchUpPayload> {
        let game = self.live_game(id)?;
        let seat = seat_of(&game.player_ids, player)?;
        if command.acting_seat(game.engine.current_seat()) != seat {
            return Err(RegistryError::NotYourTurn);
        }
        let index = game
            .engine
            .options()
            .iter()
            .position(|option| option == &command)
            .ok_or(RegistryError::Engine(TussleError::InvalidCommand))?;
        let before = sync::decision_count(&game.engine);
        self.store.append(id, index)?;

        let game = self.live_game(id)?;
        game.engine.order(command)?;
        sync::catch_up(&game.engine, game.seed, game.layout, Some(before))
            .ok_or(RegistryError::Desync)
    }

    /// Catch a client up from the number of decisions it has seen.
    /// `None` asks for the full board. Returns `None` when the client is
    /// already current.
    ///
    /// # Errors
    ///
    /// Returns an error if the game does not exist or fails to load.
    pub fn catch_up(
        &mut self,
        id: GameId,
        from: Option<usize>,
    ) -> RegistryResult<Option<CatchUpPayload>> {
        let game = self.live_game(id)?;
        Ok(sync::catch_up(&game.engine, game.seed, game.layout, from))
    }

    /// Games a player is seated in.
    pub fn games_for_player(&self, player: PlayerId) -> Vec<GameId> {
        self.store.find_for_player(player)
    }

    /// Drop a game from the live cache. It will be rebuilt from the store
    /// on next access.
    pub fn evict(&mut self, id: GameId) {
        self.live.remove(&id);
    }

    /// Direct read access to a live engine, loading it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the game does not exist or fails to load.
    pub fn engine(&mut self, id: GameId) -> RegistryResult<&TurnEngine> {
        Ok(&self.live_game(id)?.engine)
    }

    fn live_game(&mut self, id: GameId) -> RegistryResult<&mut LiveGame> {
        if !self.live.contains_key(&id) {
            let game = self.load(id)?;
            self.live.insert(id, game);
        }
        self.live
            .get_mut(&id)
            .ok_or(RegistryError::UnknownGame(id))
    }

    /// Rebuild a game from its stored record by replaying every decision.
    fn load(&mut self, id: GameId) -> RegistryResult<LiveGame> {
        let stored = self.store.read(id)?;
        let player_count = stored.player_ids.len();
        let mut engine =
            TurnEngine::new(stored.seed, player_count, stored.ruleset, stored.layout);
        let catalog = Catalog::new(stored.ruleset);

        for (seat, &pick) in stored.decisions.iter().take(player_count).enumerate() {
            let character = *catalog
                .available_characters()
                .get(pick)
                .ok_or(RegistryError::Desync)?;
            engine.set_character(seat, character)?;
        }
        if stored.decisions.len() >= player_count {
            engine.start()?;
            for &index in &stored.decisions[player_count..] {
                engine.advance(index)?;
            }
        }
        Ok(LiveGame {
            engine,
            seed: stored.seed,
            layout: stored.layout,
            player_ids: stored.player_ids,
        })
    }
}

fn seat_of(player_ids: &[PlayerId], player: PlayerId) -> RegistryResult<usize> {
    player_ids
        .iter()
        .position(|&p| p == player)
        .ok_or(RegistryError::UnknownPlayer(player))
}
