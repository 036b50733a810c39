//! Client synchronization payloads with fog-of-war redaction.
//!
//! The authority never ships full game state. A client that knows nothing
//! gets the node graph, the initial token placements, and the class of
//! every token that is revealed (or destroyed) so far; everything still
//! hidden is omitted entirely. From then on, deltas carry only the new
//! choice indexes, the new roll values, and class patches for newly
//! revealed tokens. The client replays the choices through its own engine,
//! with the authority's rolls fed to a scripted random source.

#![allow(clippy::struct_excessive_bools)]

use serde::{Deserialize, Serialize};

use crate::error::{TussleError, TussleResult};
use crate::game::{
    Board, BoardLayout, Catalog, CharacterId, EnemyId, MapNode, NodeId, Ruleset, StationId, Token,
    TokenId, TokenKind, TurnEngine, UpgradeId, setup,
};
use crate::rng::RandomSource;

/// Which kind a token is. The kind itself is public from setup; only the
/// class behind it is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenTag {
    /// A player token.
    Player,
    /// An enemy token.
    Enemy,
    /// A station token.
    Station,
}

/// One node of the graph, as shipped to clients. The graph never changes
/// after setup, so it is only sent in full payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Adjacent node ids.
    pub adjacent: Vec<NodeId>,
    /// Nest flag; public knowledge from setup.
    pub is_nest: bool,
    /// Tunnel flag.
    pub is_tunnel: bool,
    /// Landing-site flag.
    pub is_landing_site: bool,
    /// Superheated flag.
    pub is_superheated: bool,
}

/// Public information about one token. In full payloads every token gets
/// an entry with its kind and initial placement; class fields are present
/// only for tokens that are revealed or destroyed. Delta payloads carry
/// entries only for those, patching classes the client could not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPatch {
    /// The token this entry describes.
    pub token: TokenId,
    /// Token kind; present in full payloads only.
    pub kind: Option<TokenTag>,
    /// Initial placement; present in full payloads only.
    pub node: Option<NodeId>,
    /// Station reachable without a tunnel, for stations.
    pub early: bool,
    /// Initially revealed (ships are).
    pub revealed: bool,
    /// Character pick, once a player token's pick is known.
    pub character: Option<CharacterId>,
    /// Enemy species, once revealed.
    pub enemy: Option<EnemyId>,
    /// Station kind, once revealed.
    pub station: Option<StationId>,
    /// Station upgrade payload, once revealed.
    pub upgrade: Option<UpgradeId>,
}

/// Everything a client needs to catch up from a known decision count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchUpPayload {
    /// Choice indexes the client has not applied yet, in order.
    pub choice_indexes: Vec<usize>,
    /// Roll values the client has not applied yet, in order.
    pub rolls: Vec<u32>,
    /// The decision count to pass to the next catch-up request.
    pub next_decision: usize,
    /// Whether every seat has picked and the game has started.
    pub started: bool,
    /// Ruleset, so the client runs the same rules.
    pub ruleset: Ruleset,
    /// Node graph; full payloads only.
    pub map: Option<Vec<NodeSnapshot>>,
    /// Token entries or class patches.
    pub tokens: Vec<TokenPatch>,
}

/// Number of decisions in authority terms: character picks count before
/// engine steps do.
#[must_use]
pub fn decision_count(engine: &TurnEngine) -> usize {
    let picked = (0..engine.player_count())
        .filter(|&seat| engine.player_state(seat).character.is_some())
        .count();
    picked + engine.step()
}

/// Build a catch-up payload for a client that has seen `from` decisions.
/// `None` means the client knows nothing and needs the full board. Returns
/// `None` when there is nothing new to send.
#[must_use]
pub fn catch_up(
    engine: &TurnEngine,
    seed: u64,
    layout: BoardLayout,
    from: Option<usize>,
) -> Option<CatchUpPayload> {
    let player_count = engine.player_count();
    let total = decision_count(engine);
    if from.is_some_and(|f| f >= total) {
        return None;
    }
    let from_step = from.map_or(0, |f| f.saturating_sub(player_count));
    let log = engine.decision_log();

    let mut payload = CatchUpPayload {
        choice_indexes: log.choice_indexes_from(from_step),
        rolls: log.rolls_from(from_step),
        next_decision: total,
        started: total >= player_count && engine.all_characters_picked(),
        ruleset: engine.ruleset(),
        map: None,
        tokens: Vec::new(),
    };

    if from.is_none() {
        payload.map = Some(engine.board().nodes.iter().map(node_snapshot).collect());
        payload.tokens = full_token_entries(engine, seed, layout);
    } else {
        payload.tokens = patch_entries(engine);
    }
    Some(payload)
}

fn node_snapshot(node: &MapNode) -> NodeSnapshot {
    NodeSnapshot {
        adjacent: node.adjacent.clone(),
        is_nest: node.is_nest,
        is_tunnel: node.is_tunnel,
        is_landing_site: node.is_landing_site,
        is_superheated: node.is_superheated,
    }
}

/// Entries for every token: kind and placement from a fresh board built
/// with the game's seed, class overlays from the live board for whatever
/// has been revealed or destroyed since.
fn full_token_entries(engine: &TurnEngine, seed: u64, layout: BoardLayout) -> Vec<TokenPatch> {
    let catalog = Catalog::new(engine.ruleset());
    let mut rng = RandomSource::seeded(seed);
    let initial = setup::build_board(layout, &catalog, engine.player_count(), &mut rng);

    let mut entries: Vec<TokenPatch> = initial
        .tokens
        .iter()
        .enumerate()
        .map(|(id, token)| TokenPatch {
            token: id,
            kind: Some(match token.kind {
                TokenKind::Player(_) => TokenTag::Player,
                TokenKind::Enemy(_) => TokenTag::Enemy,
                TokenKind::Station(_) => TokenTag::Station,
            }),
            node: token.node,
            early: token.as_station().is_some_and(|s| s.early),
            revealed: token.revealed,
            character: None,
            enemy: None,
            station: None,
            upgrade: None,
        })
        .collect();

    for patch in patch_entries(engine) {
        let entry = &mut entries[patch.token];
        entry.character = patch.character;
        entry.enemy = patch.enemy;
        entry.station = patch.station;
        entry.upgrade = patch.upgrade;
    }
    entries
}

/// Class patches for every token whose hidden attributes are now public:
/// revealed tokens and tokens that have left the board.
fn patch_entries(engine: &TurnEngine) -> Vec<TokenPatch> {
    let board = engine.board();
    board
        .tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| token.revealed || token.node.is_none())
        .map(|(id, token)| {
            let mut patch = TokenPatch {
                token: id,
                kind: None,
                node: None,
                early: false,
                revealed: token.revealed,
                character: None,
                enemy: None,
                station: None,
                upgrade: None,
            };
            match &token.kind {
                TokenKind::Player(player) => patch.character = player.character,
                TokenKind::Enemy(enemy) => patch.enemy = Some(enemy.class),
                TokenKind::Station(station) => {
                    patch.station = Some(station.class);
                    patch.upgrade = station.upgrade;
                }
            }
            patch
        })
        .collect()
}

/// Build a fresh client replica from a full payload. Tokens whose class is
/// still hidden get a placeholder class; the class never matters until the
/// token is revealed, and the payload that carries the revealing decision
/// also carries the class patch.
///
/// # Errors
///
/// Returns `InvalidCommand` for a payload without a map, otherwise
/// whatever replaying the payload's decisions produces.
pub fn build_replica(payload: &CatchUpPayload) -> TussleResult<TurnEngine> {
    let Some(map) = &payload.map else {
        return Err(TussleError::InvalidCommand);
    };
    let mut board = Board::new();
    for snapshot in map {
        board.add_node(MapNode {
            adjacent: snapshot.adjacent.clone(),
            tokens: Vec::new(),
            is_nest: snapshot.is_nest,
            is_tunnel: snapshot.is_tunnel,
            is_landing_site: snapshot.is_landing_site,
            is_superheated: snapshot.is_superheated,
        });
    }
    for entry in &payload.tokens {
        let mut token = match entry.kind {
            Some(TokenTag::Player) | None => Token::player(),
            Some(TokenTag::Enemy) => Token::enemy(entry.enemy.unwrap_or(EnemyId::Crawler)),
            Some(TokenTag::Station) => {
                let mut station =
                    Token::station(entry.station.unwrap_or(StationId::Recharge), entry.upgrade);
                if let TokenKind::Station(state) = &mut station.kind {
                    state.early = entry.early;
                }
                station
            }
        };
        token.revealed = entry.revealed;
        let id = board.add_token(token);
        if let Some(node) = entry.node {
            board.place(id, node);
        }
    }

    let mut engine = TurnEngine::from_board(
        board,
        payload.ruleset,
        RandomSource::scripted(payload.rolls.iter().copied()),
    );
    for entry in &payload.tokens {
        if let Some(character) = entry.character {
            engine.set_character(entry.token, character)?;
        }
    }
    if payload.started {
        engine.start()?;
        for &index in &payload.choice_indexes {
            engine.advance(index)?;
        }
    }
    Ok(engine)
}

/// Apply a delta payload to an existing replica: patch newly revealed
/// classes, feed the new rolls, then replay the new choices.
///
/// # Errors
///
/// Returns an error if a replayed choice does not fit the replica's
/// regenerated options; that means the replica is out of sync.
pub fn apply_to_replica(engine: &mut TurnEngine, payload: &CatchUpPayload) -> TussleResult<()> {
    for entry in &payload.tokens {
        if entry.token >= engine.board().tokens.len() {
            return Err(TussleError::InvalidCommand);
        }
        match &mut engine.board_mut().token_mut(entry.token).kind {
            TokenKind::Enemy(enemy) => {
                if let Some(class) = entry.enemy {
                    enemy.class = class;
                }
            }
            TokenKind::Station(station) => {
                if let Some(class) = entry.station {
                    station.class = class;
                }
                if entry.upgrade.is_some() {
                    station.upgrade = entry.upgrade;
                }
            }
            TokenKind::Player(_) => {}
        }
        if let Some(character) = entry.character {
            if entry.token < engine.player_count()
                && engine.player_state(entry.token).character.is_none()
            {
                engine.set_character(entry.token, character)?;
            }
        }
    }
    for &roll in &payload.rolls {
        engine.push_roll(roll);
    }
    if payload.started && engine.step() == 0 && engine.options().is_empty() {
        engine.start()?;
    }
    for &index in &payload.choice_indexes {
        engine.advance(index)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority(steps: usize) -> TurnEngine {
        let ruleset = Ruleset {
            expansion: true,
            aggressive: false,
        };
        let mut engine = TurnEngine::new(404, 2, ruleset, BoardLayout::Compact);
        engine.set_character(0, CharacterId::Scout).unwrap();
        engine.set_character(1, CharacterId::Volt).unwrap();
        engine.start().unwrap();
        for _ in 0..steps {
            if engine.is_game_over() || engine.options().is_empty() {
                break;
            }
            engine.advance(0).unwrap();
        }
        engine
    }

    fn assert_replicas_match(a: &TurnEngine, b: &TurnEngine) {
        assert_eq!(a.step(), b.step());
        assert_eq!(a.turn(), b.turn());
        assert_eq!(a.current_seat(), b.current_seat());
        assert_eq!(a.options(), b.options());
        for seat in 0..a.player_count() {
            assert_eq!(a.player_state(seat), b.player_state(seat));
        }
        // Revealed tokens must agree exactly; hidden ones only in place.
        for (id, token) in a.board().tokens.iter().enumerate() {
            let other = b.board().token(id);
            assert_eq!(token.node, other.node);
            assert_eq!(token.revealed, other.revealed);
            if token.revealed {
                assert_eq!(token, other);
            }
        }
    }

    #[test]
    fn test_full_payload_redacts_hidden_classes() {
        let engine = authority(0);
        let payload = catch_up(&engine, 404, BoardLayout::Compact, None).unwrap();
        let tokens = &payload.tokens;

        // Hidden, on-board enemies must not leak their species.
        let hidden_enemy = tokens.iter().find(|t| {
            t.kind == Some(TokenTag::Enemy) && !t.revealed && t.node.is_some()
        });
        let hidden_enemy = hidden_enemy.expect("compact board starts with hidden enemies");
        assert_eq!(hidden_enemy.enemy, None);

        // Ships are revealed from setup and do ship their class.
        let ship = tokens
            .iter()
            .find(|t| t.revealed && t.kind == Some(TokenTag::Station))
            .expect("ships are revealed at setup");
        assert_eq!(ship.station, Some(StationId::Ship));

        assert!(payload.map.is_some());
        assert!(payload.started);
    }

    #[test]
    fn test_replica_follows_the_authority() {
        let engine = authority(12);
        let payload = catch_up(&engine, 404, BoardLayout::Compact, None).unwrap();
        let replica = build_replica(&payload).unwrap();
        assert_replicas_match(&engine, &replica);
    }

    #[test]
    fn test_delta_catch_up_extends_a_replica() {
        let mut engine = authority(6);
        let full = catch_up(&engine, 404, BoardLayout::Compact, None).unwrap();
        let mut replica = build_replica(&full).unwrap();
        assert_replicas_match(&engine, &replica);

        let seen = full.next_decision;
        for _ in 0..8 {
            if engine.is_game_over() || engine.options().is_empty() {
                break;
            }
            engine.advance(0).unwrap();
        }
        let delta = catch_up(&engine, 404, BoardLayout::Compact, Some(seen)).unwrap();
        assert!(delta.map.is_none());
        apply_to_replica(&mut replica, &delta).unwrap();
        assert_replicas_match(&engine, &replica);
    }

    #[test]
    fn test_caught_up_client_gets_nothing() {
        let engine = authority(4);
        let total = decision_count(&engine);
        assert!(catch_up(&engine, 404, BoardLayout::Compact, Some(total)).is_none());
        assert!(catch_up(&engine, 404, BoardLayout::Compact, Some(total - 1)).is_some());
    }
}
