//! The board: an undirected node graph plus the dense token arena.

#![allow(clippy::struct_excessive_bools)]

use crate::game::token::Token;

/// Index of a node in the board's node list.
pub type NodeId = usize;

/// Index of a token in the board's token list.
pub type TokenId = usize;

/// A player's seat. Player tokens are created first, so a seat equals its
/// player's `TokenId` and the turn order.
pub type SeatId = usize;

/// One space on the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapNode {
    /// Nodes reachable in one move. Links are always bidirectional.
    pub adjacent: Vec<NodeId>,
    /// Tokens currently in this node.
    pub tokens: Vec<TokenId>,
    /// Objective containment node; nests are public knowledge from setup.
    pub is_nest: bool,
    /// Only tunnel-capable players may enter.
    pub is_tunnel: bool,
    /// A player start location.
    pub is_landing_site: bool,
    /// Damages most players who start their turn here.
    pub is_superheated: bool,
}

/// The node graph and every token in the game.
///
/// Destroyed tokens leave their node but stay in the token list, so
/// `TokenId`s stay stable for the whole game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    /// All nodes.
    pub nodes: Vec<MapNode>,
    /// All tokens. Player tokens come first, in seat order.
    pub tokens: Vec<Token>,
}

impl Board {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id.
    pub fn add_node(&mut self, node: MapNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Link two nodes bidirectionally. Duplicate links are ignored.
    pub fn link(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        if !self.nodes[a].adjacent.contains(&b) {
            self.nodes[a].adjacent.push(b);
        }
        if !self.nodes[b].adjacent.contains(&a) {
            self.nodes[b].adjacent.push(a);
        }
    }

    /// Append an unplaced token and return its id.
    pub fn add_token(&mut self, token: Token) -> TokenId {
        self.tokens.push(token);
        self.tokens.len() - 1
    }

    /// A node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &MapNode {
        &self.nodes[id]
    }

    /// A token by id.
    #[must_use]
    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id]
    }

    /// A token by id, mutably.
    pub fn token_mut(&mut self, id: TokenId) -> &mut Token {
        &mut self.tokens[id]
    }

    /// Ids of the tokens in a node.
    #[must_use]
    pub fn tokens_at(&self, node: NodeId) -> &[TokenId] {
        &self.nodes[node].tokens
    }

    /// Nodes adjacent to the given one.
    #[must_use]
    pub fn adjacent(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].adjacent
    }

    /// Move a token into a node, removing it from its previous node first.
    pub fn place(&mut self, token: TokenId, node: NodeId) {
        self.remove_from_board(token);
        self.tokens[token].node = Some(node);
        self.nodes[node].tokens.push(token);
    }

    /// Take a token off the board. Its state is kept.
    pub fn remove_from_board(&mut self, token: TokenId) {
        if let Some(old) = self.tokens[token].node.take() {
            self.nodes[old].tokens.retain(|&t| t != token);
        }
    }

    /// The first enemy token in a node, if any. Setup never puts two
    /// enemies in one node.
    #[must_use]
    pub fn enemy_at(&self, node: NodeId) -> Option<TokenId> {
        self.nodes[node]
            .tokens
            .iter()
            .copied()
            .find(|&t| self.tokens[t].is_enemy())
    }

    /// The first station token in a node, if any.
    #[must_use]
    pub fn station_at(&self, node: NodeId) -> Option<TokenId> {
        self.nodes[node]
            .tokens
            .iter()
            .copied()
            .find(|&t| self.tokens[t].as_station().is_some())
    }

    /// All nest node ids.
    #[must_use]
    pub fn nest_nodes(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).filter(|&n| self.nodes[n].is_nest).collect()
    }

    /// All landing-site node ids.
    #[must_use]
    pub fn landing_sites(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|&n| self.nodes[n].is_landing_site)
            .collect()
    }
}
