//! The turn engine: option generation, command resolution, and the
//! deterministic decision log.
//!
//! The engine never trusts a command on its own terms. After every decision
//! it regenerates the full list of legal options; an incoming command must
//! structurally match one of them or it is rejected. Every die roll and
//! every validated choice is appended to the decision log, which together
//! with the board seed is enough to rebuild the game state exactly.

use crate::error::{TussleError, TussleResult};
use crate::game::board::{Board, NodeId, SeatId, TokenId};
use crate::game::catalog::{Catalog, CharacterId, Ruleset, StationClass};
use crate::game::command::{Command, Decision, DecisionLog, Weapon};
use crate::game::setup::{self, BoardLayout};
use crate::game::token::{EnemyState, PlayerState, Token};
use crate::rng::RandomSource;

/// Snapshot of the mutable state, taken after every irreversible event
/// (a die roll or a token reveal). Restoring one is not supported yet;
/// rebuilding from the decision log is the only rewind path. The snapshot
/// is kept so the rewind cutoff stays honest and auditable.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub(crate) struct Checkpoint {
    pub(crate) tokens: Vec<Token>,
    pub(crate) options: Vec<Command>,
    pub(crate) current: SeatId,
    pub(crate) turn: i64,
    pub(crate) step: usize,
}

/// The authoritative game state and rules interpreter.
#[derive(Debug, Clone)]
pub struct TurnEngine {
    catalog: Catalog,
    board: Board,
    rng: RandomSource,
    player_count: usize,
    current: SeatId,
    turn: i64,
    step: usize,
    last_reversible_step: usize,
    checkpoint: Option<Checkpoint>,
    rolled_to_move: bool,
    attacked_this_turn: bool,
    delay_thaw: bool,
    options: Vec<Command>,
    assist_rejected_nodes: Vec<NodeId>,
    available_landing_sites: Vec<NodeId>,
    log: DecisionLog,
}

impl TurnEngine {
    /// Build a new game from a seed. The board layout and every hidden
    /// token placement derive from the seed, so two engines built with the
    /// same arguments are identical.
    #[must_use]
    pub fn new(seed: u64, player_count: usize, ruleset: Ruleset, layout: BoardLayout) -> Self {
        let catalog = Catalog::new(ruleset);
        let mut rng = RandomSource::seeded(seed);
        let board = setup::build_board(layout, &catalog, player_count, &mut rng);
        Self::from_parts(catalog, board, rng)
    }

    /// Build an engine around an externally provided board, e.g. one
    /// received in a sync payload. The random source is usually scripted
    /// in that case, replaying the authority's rolls.
    #[must_use]
    pub fn from_board(board: Board, ruleset: Ruleset, rng: RandomSource) -> Self {
        Self::from_parts(Catalog::new(ruleset), board, rng)
    }

    fn from_parts(catalog: Catalog, board: Board, rng: RandomSource) -> Self {
        let player_count = board.tokens.iter().filter(|t| t.is_player()).count();
        let available_landing_sites = board.landing_sites();
        Self {
            catalog,
            board,
            rng,
            player_count,
            current: 0,
            turn: 0,
            step: 0,
            last_reversible_step: 0,
            checkpoint: None,
            rolled_to_move: false,
            attacked_this_turn: false,
            delay_thaw: false,
            options: Vec::new(),
            assist_rejected_nodes: Vec::new(),
            available_landing_sites,
            log: DecisionLog::new(),
        }
    }

    /// Assign a character to a seat before the game starts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCommand` if the seat does not exist or the character
    /// is not available under the current ruleset.
    pub fn set_character(&mut self, seat: SeatId, id: CharacterId) -> TussleResult<()> {
        if seat >= self.player_count || !self.catalog.available_characters().contains(&id) {
            return Err(TussleError::InvalidCommand);
        }
        let class = *self.catalog.character(id);
        if let Some(player) = self.board.token_mut(seat).as_player_mut() {
            player.set_character(id, &class);
        }
        Ok(())
    }

    /// Start the first turn. If start locations must be picked, that is
    /// the first round of decisions; otherwise the first player rolls for
    /// movement immediately.
    ///
    /// # Errors
    ///
    /// Returns a desync error if a scripted random source runs dry.
    pub fn start(&mut self) -> TussleResult<()> {
        self.current = 0;
        if !self.provide_start_location_options_if_needed() {
            self.move_roll()?;
        }
        Ok(())
    }

    /// Apply a player command. The command must structurally match one of
    /// the currently offered options.
    ///
    /// # Errors
    ///
    /// `GameOver` after the game has ended (except for `AcceptDefeat`),
    /// `InvalidCommand` if the command matches no offered option, or a
    /// desync error from a scripted random source.
    pub fn order(&mut self, command: Command) -> TussleResult<()> {
        if self.is_game_over() && !matches!(command, Command::AcceptDefeat { .. }) {
            return Err(TussleError::GameOver);
        }
        let turn_was = self.turn;
        let index = self
            .option_index(&command)
            .ok_or(TussleError::InvalidCommand)?;
        self.decided(Decision::Choice {
            index,
            command: command.clone(),
        });
        self.options.clear();

        match command {
            Command::PickStartLocation { node } => self.initially_place_player(node)?,
            Command::AcceptDefeat { seat } => {
                self.player_mut(seat).accepted_defeat = true;
                self.finish_turn()?;
            }
            Command::Move { node } => self.move_player(node),
            Command::DodgeAndMove { .. } | Command::DodgeAndStop => {
                for enemy in self.enemies_who_will_attack(false) {
                    if !self.dodge_roll(enemy)? {
                        return Ok(());
                    }
                }
                if let Command::DodgeAndMove { node } = command {
                    self.move_player(node);
                } else {
                    self.finish_turn()?;
                }
            }
            Command::ActivateStation => {
                self.activate_station()?;
            }
            Command::HealthRefillRoll => self.health_refill_roll()?,
            Command::MissileRefillRoll => self.missile_refill_roll()?,
            Command::Skip | Command::Stop => self.finish_turn()?,
            Command::PermitAssist { weapon, .. } => {
                let node = self.current_node();
                let enemy = self.board.enemy_at(node).ok_or(TussleError::InvalidCommand)?;
                self.attack_dodge_refill(&weapon, enemy, true)?;
            }
            Command::RejectAssist { .. } => {
                let node = self.current_node();
                self.assist_rejected_nodes.push(node);
            }
            Command::Attack { weapon, node } => {
                let current_node = self.current_node();
                let target_node = node.unwrap_or(current_node);
                let enemy = self
                    .board
                    .enemy_at(target_node)
                    .ok_or(TussleError::InvalidCommand)?;

                // If the target is engaged with another player standing in
                // its node, and the attacker is there too, the engaged
                // player decides whether to allow the assist.
                let reserver = self.player_engaged_with(enemy);
                if reserver.is_some()
                    && current_node == target_node
                    && self.player(self.current).engaged_with != Some(enemy)
                {
                    if let Some(seat) = reserver {
                        self.options.push(Command::PermitAssist { weapon, seat });
                        self.options.push(Command::RejectAssist { weapon, seat });
                    }
                } else {
                    let kill_steal = target_node != current_node;
                    self.attack_dodge_refill(&weapon, enemy, kill_steal)?;
                    if kill_steal && self.turn == turn_was && self.options.is_empty() {
                        self.finish_turn()?;
                    }
                }
            }
        }

        if self.turn == turn_was && self.options.is_empty() {
            self.pick_next_state()?;
        }
        Ok(())
    }

    /// Apply a logged choice by its index in the current option list. This
    /// is the replay and persistence entry point.
    ///
    /// # Errors
    ///
    /// `DecisionOutOfRange` if the index does not address an offered
    /// option, otherwise anything `order` can return.
    pub fn advance(&mut self, index: usize) -> TussleResult<()> {
        if index >= self.options.len() {
            return Err(TussleError::DecisionOutOfRange {
                index,
                available: self.options.len(),
            });
        }
        self.order(self.options[index].clone())
    }

    /// Roll back to the last checkpoint.
    ///
    /// # Errors
    ///
    /// Always returns `Unimplemented`; checkpoints are captured but
    /// restoring them is not supported yet.
    pub fn revert(&mut self) -> TussleResult<()> {
        log::debug!(
            "revert requested at step {} (cutoff {})",
            self.step,
            self.last_reversible_step
        );
        Err(TussleError::Unimplemented("revert"))
    }

    /// Append an authoritative roll value to a scripted random source.
    /// No effect on seeded engines.
    pub fn push_roll(&mut self, value: u32) {
        self.rng.push_roll(value);
    }

    /// The board.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable board access, for applying sync patches to a replica.
    /// Mutating the board of an authoritative engine will desync it.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// The merged stat tables for this game's ruleset.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The ruleset in play.
    #[must_use]
    pub fn ruleset(&self) -> Ruleset {
        self.catalog.ruleset()
    }

    /// The options currently offered.
    #[must_use]
    pub fn options(&self) -> &[Command] {
        &self.options
    }

    /// The seat whose turn it is.
    #[must_use]
    pub fn current_seat(&self) -> SeatId {
        self.current
    }

    /// The current turn number. One player's turn per increment.
    #[must_use]
    pub fn turn(&self) -> i64 {
        self.turn
    }

    /// Number of decisions taken so far.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// The earliest step play could be rewound to without re-rolling dice
    /// or re-hiding revealed tokens.
    #[must_use]
    pub fn last_reversible_step(&self) -> usize {
        self.last_reversible_step
    }

    /// The decision log.
    #[must_use]
    pub fn decision_log(&self) -> &DecisionLog {
        &self.log
    }

    /// Number of seats.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Whether every seat has picked a character.
    #[must_use]
    pub fn all_characters_picked(&self) -> bool {
        (0..self.player_count).all(|seat| self.player(seat).character.is_some())
    }

    /// A seat's player state.
    ///
    /// # Panics
    ///
    /// Panics if the seat does not exist.
    #[must_use]
    pub fn player_state(&self, seat: SeatId) -> &PlayerState {
        self.player(seat)
    }

    pub(crate) fn checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoint.as_ref()
    }

    /// Whether the game has ended: every player is out (dead with no save
    /// point, or conceded), or no nest holds an unrevealed token or a
    /// living objective.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        let all_out = (0..self.player_count).all(|seat| {
            let player = self.player(seat);
            (!player.is_alive() && player.saved_at.is_none()) || player.accepted_defeat
        });
        if all_out {
            return true;
        }
        !self.board.nest_nodes().into_iter().any(|nest| {
            self.board.tokens_at(nest).iter().any(|&id| {
                let token = self.board.token(id);
                !token.revealed
                    || token
                        .as_enemy()
                        .is_some_and(|e| self.catalog.enemy(e.class).is_objective && e.is_alive())
            })
        })
    }

    /// Seats ordered best to worst by tie-breaking score.
    #[must_use]
    pub fn final_rankings(&self) -> Vec<SeatId> {
        let mut seats: Vec<SeatId> = (0..self.player_count).collect();
        seats.sort_by_key(|&seat| std::cmp::Reverse(self.player(seat).tie_breaking_score()));
        seats
    }

    // --- internals ---

    fn player(&self, seat: SeatId) -> &PlayerState {
        match self.board.token(seat).as_player() {
            Some(player) => player,
            None => panic!("seat {seat} is not a player token"),
        }
    }

    fn player_mut(&mut self, seat: SeatId) -> &mut PlayerState {
        match self.board.token_mut(seat).as_player_mut() {
            Some(player) => player,
            None => panic!("seat {seat} is not a player token"),
        }
    }

    fn enemy_state(&self, id: TokenId) -> &EnemyState {
        match self.board.token(id).as_enemy() {
            Some(enemy) => enemy,
            None => panic!("token {id} is not an enemy"),
        }
    }

    fn enemy_mut(&mut self, id: TokenId) -> &mut EnemyState {
        match self.board.token_mut(id).as_enemy_mut() {
            Some(enemy) => enemy,
            None => panic!("token {id} is not an enemy"),
        }
    }

    fn current_node(&self) -> NodeId {
        match self.board.token(self.current).node {
            Some(node) => node,
            None => panic!("current player is not on the board"),
        }
    }

    fn seat_count(&self) -> i64 {
        i64::try_from(self.player_count).unwrap_or(i64::MAX)
    }

    fn decided(&mut self, decision: Decision) {
        let is_roll = matches!(decision, Decision::Roll { .. });
        self.log.push(decision);
        self.step += 1;
        if is_roll {
            self.save_checkpoint();
        }
    }

    fn save_checkpoint(&mut self) {
        // New information reached the players; the step that produced it
        // can no longer be taken back.
        self.last_reversible_step = self.step + 1;
        self.checkpoint = Some(Checkpoint {
            tokens: self.board.tokens.clone(),
            options: self.options.clone(),
            current: self.current,
            turn: self.turn,
            step: self.step,
        });
    }

    fn roll_die(&mut self, sides: u32, purpose: &str) -> TussleResult<u32> {
        let value = self.rng.roll_die(sides)?;
        self.decided(Decision::Roll { value, sides });
        log::debug!("roll for {purpose}: {value}");
        Ok(value)
    }

    fn reveal_token(&mut self, id: TokenId) {
        self.board.token_mut(id).revealed = true;
        let enemy_class = self.board.token(id).as_enemy().map(|e| e.class);
        if let Some(class_id) = enemy_class {
            let class = *self.catalog.enemy(class_id);
            if let Some(enemy) = self.board.token_mut(id).as_enemy_mut() {
                enemy.health = class.health;
            }
            log::debug!("revealed a {}", class.name);
            if class.destroy_on_reveal {
                self.board.remove_from_board(id);
            }
        }
        self.save_checkpoint();
    }

    /// Move any token, revealing everything near a player's destination.
    fn move_token(&mut self, token: TokenId, node: NodeId) {
        self.board.place(token, node);
        if self.board.token(token).is_player() {
            let mut to_reveal: Vec<TokenId> = Vec::new();
            for &adjacent in self.board.adjacent(node) {
                to_reveal.extend(
                    self.board
                        .tokens_at(adjacent)
                        .iter()
                        .copied()
                        .filter(|&t| !self.board.token(t).revealed),
                );
            }
            to_reveal.extend(
                self.board
                    .tokens_at(node)
                    .iter()
                    .copied()
                    .filter(|&t| !self.board.token(t).revealed),
            );
            for id in to_reveal {
                self.reveal_token(id);
            }
        }
    }

    fn move_player(&mut self, node: NodeId) {
        self.move_token(self.current, node);
        let player = self.player_mut(self.current);
        if player.moves_left > 0 {
            player.moves_left -= 1;
        }
    }

    /// Enemies that will attack the current player before anything else
    /// happens. Melee enemies share the player's node; ranged ones may also
    /// be one node away.
    fn enemies_who_will_attack(&self, ranged: bool) -> Vec<TokenId> {
        let node = self.current_node();
        let turn = self.turn;
        let seats = self.seat_count();
        let mut candidates: Vec<TokenId> = Vec::new();
        for &id in self.board.tokens_at(node) {
            if self.board.token(id).is_enemy() {
                candidates.push(id);
            }
        }
        if ranged {
            for &adjacent in self.board.adjacent(node) {
                for &id in self.board.tokens_at(adjacent) {
                    if self.board.token(id).is_enemy() {
                        candidates.push(id);
                    }
                }
            }
        }
        candidates.retain(|&id| {
            let Some(enemy) = self.board.token(id).as_enemy() else {
                return false;
            };
            if ranged && !self.catalog.enemy(enemy.class).ranged {
                return false;
            }
            (enemy.target.is_none() || enemy.target == Some(self.current))
                && enemy.can_attack(turn, seats, self.delay_thaw)
        });
        candidates
    }

    /// Living enemies in adjacent nodes that another player is currently
    /// fighting in their own node. Empty unless kill-steal attacks are
    /// allowed.
    fn kill_stealable_enemies(&self) -> Vec<TokenId> {
        if !self.catalog.ruleset().kill_steal_allowed() {
            return Vec::new();
        }
        let mut reserved: Vec<TokenId> = Vec::new();
        for seat in 0..self.player_count {
            if seat == self.current {
                continue;
            }
            let player = self.player(seat);
            if !player.is_alive() || player.accepted_defeat {
                continue;
            }
            let Some(enemy_id) = player.engaged_with else {
                continue;
            };
            let seat_node = self.board.token(seat).node;
            if seat_node.is_some() && seat_node == self.board.token(enemy_id).node {
                reserved.push(enemy_id);
            }
        }
        let mut out = Vec::new();
        for &adjacent in self.board.adjacent(self.current_node()) {
            for &id in self.board.tokens_at(adjacent) {
                if reserved.contains(&id)
                    && self
                        .board
                        .token(id)
                        .as_enemy()
                        .is_some_and(EnemyState::is_alive)
                {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Another living, placed player already fighting this enemy in the
    /// enemy's own node, if any.
    fn player_engaged_with(&self, enemy: TokenId) -> Option<SeatId> {
        let enemy_node = self.board.token(enemy).node;
        (0..self.player_count).find(|&seat| {
            if seat == self.current {
                return false;
            }
            let player = self.player(seat);
            player.engaged_with == Some(enemy)
                && player.is_alive()
                && !player.accepted_defeat
                && self.board.token(seat).node == enemy_node
        })
    }

    /// Clear the fight state if the current player's fight is over: one
    /// side is dead, or the enemy is no longer close enough.
    fn check_set_combat_ended(&mut self) {
        let Some(enemy_id) = self.player(self.current).engaged_with else {
            return;
        };
        let player_defeated = !self.player(self.current).is_alive();
        let enemy_defeated = !self.enemy_state(enemy_id).is_alive();
        let enemy_node = self.board.token(enemy_id).node;
        let player_node = self.board.token(self.current).node;
        let ranged = self.catalog.enemy(self.enemy_state(enemy_id).class).ranged;
        let close_enough = (enemy_node.is_some() && enemy_node == player_node)
            || (ranged
                && matches!((player_node, enemy_node), (Some(p), Some(e))
                    if self.board.adjacent(p).contains(&e)));
        if player_defeated || enemy_defeated || !close_enough {
            self.enemy_mut(enemy_id).target = None;
            let player = self.player_mut(self.current);
            player.engaged_with = None;
            player.first_attack = true;
        }
    }

    /// If the current player has no token on the board yet, offer the open
    /// landing sites and return true. Otherwise, on the first placed turn
    /// of a revival game, record everyone's start node as their save point.
    fn provide_start_location_options_if_needed(&mut self) -> bool {
        if self.board.token(self.current).node.is_none() {
            let sites = self.available_landing_sites.clone();
            for node in sites {
                self.options.push(Command::PickStartLocation { node });
            }
            return true;
        }
        if self.catalog.ruleset().players_can_revive() && self.player(self.current).saved_at.is_none()
        {
            for seat in 0..self.player_count {
                let node = self.board.token(seat).node;
                self.player_mut(seat).saved_at = node;
            }
        }
        false
    }

    fn initially_place_player(&mut self, node: NodeId) -> TussleResult<()> {
        self.move_token(self.current, node);
        if !self.catalog.ruleset().players_share_nodes() {
            self.available_landing_sites.retain(|&site| site != node);
        }
        if self.catalog.ruleset().players_can_revive() {
            self.player_mut(self.current).saved_at = Some(node);
        }
        self.finish_turn()
    }

    fn finish_turn(&mut self) -> TussleResult<()> {
        self.options.clear();
        self.assist_rejected_nodes.clear();
        self.player_mut(self.current).moves_left = 0;
        {
            let player = self.player(self.current);
            // A defeat with no save point must be acknowledged before the
            // turn can pass.
            if !player.is_alive() && player.saved_at.is_none() && !player.accepted_defeat {
                self.options.push(Command::AcceptDefeat { seat: self.current });
                return Ok(());
            }
        }
        self.attacked_this_turn = false;
        self.check_set_combat_ended();
        if self.is_game_over() {
            log::info!("game over");
            return Ok(());
        }

        self.last_reversible_step = self.step;
        self.current = (self.current + 1) % self.player_count;
        self.turn += 1;
        self.rolled_to_move = false;
        self.delay_thaw = true;
        log::info!("turn {} begins for seat {}", self.turn, self.current);
        if self.player(self.current).accepted_defeat {
            return self.finish_turn();
        }
        if self.provide_start_location_options_if_needed() {
            return Ok(());
        }
        if !self.player(self.current).is_alive() {
            // Respawn turn: the player is placed and refilled but does
            // nothing else.
            if let Some(save) = self.player(self.current).saved_at {
                self.move_token(self.current, save);
                let player = self.player_mut(self.current);
                player.health = player.max_health;
                player.missiles = 0;
                player.combat_lockout = false;
                log::info!("seat {} respawns at its save point", self.current);
            }
            return self.finish_turn();
        }
        if self.board.node(self.current_node()).is_superheated {
            self.overheat();
            if !self.player(self.current).is_alive() {
                return self.finish_turn();
            }
        }
        self.pick_next_state()?;
        Ok(())
    }

    fn overheat(&mut self) {
        let heals = self
            .player(self.current)
            .character
            .is_some_and(|c| self.catalog.character(c).superheated_heals);
        if heals {
            let player = self.player_mut(self.current);
            player.health = (player.health + 1).min(player.max_health);
            log::debug!("seat {} is healed by the superheated node", self.current);
            return;
        }
        let immune = self
            .player(self.current)
            .upgrades
            .iter()
            .any(|&u| self.catalog.upgrade(u).superheated_immunity);
        if !immune {
            self.player_mut(self.current).take_damage(1);
            log::info!("seat {} overheats for 1 damage", self.current);
        }
    }

    fn station_at_player(&self) -> Option<TokenId> {
        self.board.station_at(self.current_node())
    }

    fn station_class(&self, id: TokenId) -> StationClass {
        match self.board.token(id).as_station() {
            Some(station) => *self.catalog.station(station.class),
            None => panic!("token {id} is not a station"),
        }
    }

    /// Whether a seat could meaningfully activate a station: the upgrade
    /// is allowed for its character and not yet collected here, or the
    /// station offers a refill, save, or reveal the player still needs.
    fn can_use_station(&self, seat: SeatId, station_id: TokenId) -> bool {
        let token = self.board.token(station_id);
        let Some(station) = token.as_station() else {
            return false;
        };
        let class = self.catalog.station(station.class);
        let player = self.player(seat);
        if class.grants_upgrade {
            let Some(upgrade_id) = station.upgrade else {
                return false;
            };
            let Some(character) = player.character else {
                return false;
            };
            let upgrade = self.catalog.upgrade(upgrade_id);
            let character = self.catalog.character(character);
            let not_allowed = (character.charge_amp_disallowed
                && upgrade.is_beam_addon
                && upgrade.first_attack_damage_bonus > 0)
                || (character.thermal_suit_disallowed && upgrade.superheated_immunity)
                || (character.cryo_beam_disallowed
                    && upgrade.is_beam_addon
                    && upgrade.freeze_on_hit_rounds > 0)
                || (character.tunnel_kit_disallowed && upgrade.enables_tunnels);
            !not_allowed && !player.visited_caches.contains(&station_id)
        } else {
            (class.refill_health && player.health != player.max_health)
                || (class.refill_missiles && player.missiles != player.max_missiles)
                || (class.save_point && player.saved_at != token.node)
                || class.map_reveal
        }
    }

    fn any_player_can_use(&self, station_id: TokenId) -> bool {
        (0..self.player_count).any(|seat| self.can_use_station(seat, station_id))
    }

    /// Sabotage pass for a cache the current player cannot use themselves.
    fn maybe_sabotage_unusable_cache(&mut self, station_id: TokenId) {
        if !self.catalog.ruleset().sabotage_caches() {
            return;
        }
        let Some(upgrade) = self
            .board
            .token(station_id)
            .as_station()
            .and_then(|s| s.upgrade)
        else {
            return;
        };
        if self.can_use_station(self.current, station_id) {
            return;
        }
        if !self.catalog.upgrade(upgrade).guaranteed || !self.any_player_can_use(station_id) {
            self.board.remove_from_board(station_id);
            log::info!("seat {} sabotaged an upgrade cache", self.current);
        }
    }

    /// The current player activates the station in their node. Returns
    /// whether their turn continues.
    fn activate_station(&mut self) -> TussleResult<bool> {
        let Some(station_id) = self.station_at_player() else {
            panic!("station activation with no station present");
        };
        assert!(
            self.can_use_station(self.current, station_id),
            "station activation offered for an unusable station"
        );
        let class = self.station_class(station_id);
        let node = self.current_node();

        if class.grants_upgrade {
            if let Some(upgrade_id) = self
                .board
                .token(station_id)
                .as_station()
                .and_then(|s| s.upgrade)
            {
                let upgrade = *self.catalog.upgrade(upgrade_id);
                log::info!("seat {} obtained upgrade {}", self.current, upgrade.name);
                let player = self.player_mut(self.current);
                player.upgrades.push(upgrade_id);
                player.visited_caches.push(station_id);
                player.max_health += upgrade.max_health;
                player.health += upgrade.health;
                player.max_missiles += upgrade.max_missiles;
                player.missiles += upgrade.missiles;
                if self.catalog.ruleset().sabotage_caches()
                    && (!upgrade.guaranteed || !self.any_player_can_use(station_id))
                {
                    self.board.remove_from_board(station_id);
                    log::info!("seat {} sabotaged the upgrade cache behind them", self.current);
                }
            }
        }

        if class.refill_health {
            let player = self.player_mut(self.current);
            player.health = player.max_health;
            log::debug!("health refilled");
        }
        if class.refill_missiles {
            let player = self.player_mut(self.current);
            player.missiles = player.max_missiles;
            log::debug!("missiles refilled");
        }
        if class.save_point {
            self.player_mut(self.current).saved_at = Some(node);
            log::info!("seat {} will respawn here if defeated", self.current);
        }
        if class.map_reveal {
            let hidden: Vec<TokenId> = (0..self.board.tokens.len())
                .filter(|&id| !self.board.token(id).is_enemy() && !self.board.token(id).revealed)
                .collect();
            for id in hidden {
                self.reveal_token(id);
            }
            // A map station only ever needs one use.
            self.board.remove_from_board(station_id);
        }
        if class.halt_movement {
            self.player_mut(self.current).moves_left = 0;
            self.finish_turn()?;
            return Ok(false);
        }
        if self.player(self.current).moves_left == 0 {
            self.finish_turn()?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Decide what happens next for the current player: forced dodges,
    /// attack options, the movement roll, stations, further moves, or the
    /// end of the turn. Returns whether the turn continues.
    fn pick_next_state(&mut self) -> TussleResult<bool> {
        // Ranged enemies strike before the player may do anything.
        for enemy in self.enemies_who_will_attack(true) {
            if !self.dodge_roll(enemy)? {
                return Ok(false);
            }
        }
        if !self.attacked_this_turn {
            self.player_mut(self.current).combat_lockout = false;
        }

        let melee_to_dodge = self.enemies_who_will_attack(false);
        assert!(
            melee_to_dodge.len() <= 1,
            "more than one enemy able to attack in a single node"
        );

        if !self.attacked_this_turn {
            let node = self.current_node();
            let mut attackable: Vec<TokenId> = Vec::new();
            if !self.assist_rejected_nodes.contains(&node) {
                for &id in self.board.tokens_at(node) {
                    if self
                        .board
                        .token(id)
                        .as_enemy()
                        .is_some_and(EnemyState::is_alive)
                    {
                        attackable.push(id);
                    }
                }
            }
            assert!(
                attackable.len() <= 1,
                "more than one attackable enemy in a single node"
            );
            let kill_stealable = self.kill_stealable_enemies();
            if !attackable.is_empty() || !kill_stealable.is_empty() {
                for &enemy in &attackable {
                    for weapon in self.weapon_options(enemy) {
                        self.options.push(Command::Attack { weapon, node: None });
                    }
                }
                for &enemy in &kill_stealable {
                    let enemy_node = self.board.token(enemy).node;
                    for weapon in self.weapon_options(enemy) {
                        self.options.push(Command::Attack {
                            weapon,
                            node: enemy_node,
                        });
                    }
                }
                self.provide_move_options(!melee_to_dodge.is_empty())?;
                return Ok(true);
            }
        }

        // Already attacked (or nothing to attack): melee enemies that can
        // strike must be dodged before anything else.
        for enemy in melee_to_dodge {
            if !self.dodge_roll(enemy)? {
                return Ok(false);
            }
        }

        if !self.rolled_to_move && !self.attacked_this_turn {
            // The player passed on attacking; enemies they froze on their
            // previous turn thaw now.
            self.delay_thaw = false;
            self.move_roll()?;
            return Ok(true);
        }

        let station = self.station_at_player();
        if let Some(station_id) = station {
            self.maybe_sabotage_unusable_cache(station_id);
        }
        if let Some(station_id) = station {
            if self.can_use_station(self.current, station_id) {
                if self.station_class(station_id).optional_stop {
                    self.options.push(Command::ActivateStation);
                    self.provide_move_options(false)?;
                    // The plain stop reads as "skip" when a station is on
                    // offer.
                    if let Some(stop) = self.options.iter_mut().find(|o| **o == Command::Stop) {
                        *stop = Command::Skip;
                    }
                    return Ok(true);
                }
                let can_still_move = self.activate_station()?;
                if can_still_move {
                    self.provide_move_options(false)?;
                }
                return Ok(can_still_move);
            }
        }
        if self.player(self.current).moves_left > 0 && !self.attacked_this_turn {
            self.provide_move_options(false)?;
            return Ok(true);
        }
        self.finish_turn()?;
        Ok(false)
    }

    fn node_has_other_living_player(&self, node: NodeId) -> bool {
        self.board.tokens_at(node).iter().any(|&id| {
            id != self.current
                && self
                    .board
                    .token(id)
                    .as_player()
                    .is_some_and(PlayerState::is_alive)
        })
    }

    fn provide_move_options(&mut self, needs_dodge: bool) -> TussleResult<()> {
        if !needs_dodge && !self.rolled_to_move {
            return self.move_roll();
        }
        if !needs_dodge && self.player(self.current).moves_left == 0 {
            self.options.push(Command::Stop);
            return Ok(());
        }
        let node = self.current_node();
        let can_tunnel = self.player(self.current).can_use_tunnels(&self.catalog);
        let share = self.catalog.ruleset().players_share_nodes();
        let adjacent: Vec<NodeId> = self.board.adjacent(node).to_vec();
        for dest in adjacent {
            if self.board.node(dest).is_tunnel && !can_tunnel {
                continue;
            }
            if !share && self.node_has_other_living_player(dest) {
                continue;
            }
            self.options.push(if needs_dodge {
                Command::DodgeAndMove { node: dest }
            } else {
                Command::Move { node: dest }
            });
        }
        self.options.push(if needs_dodge {
            Command::DodgeAndStop
        } else {
            Command::Stop
        });
        Ok(())
    }

    fn move_roll(&mut self) -> TussleResult<()> {
        let first = self.roll_die(6, "movement (first die)")?;
        let second = self.roll_die(6, "movement (second die)")?;
        self.player_mut(self.current).moves_left = first + second;
        self.rolled_to_move = true;
        self.provide_move_options(false)
    }

    fn refill_amount(roll: u32) -> u32 {
        if roll == 10 {
            3
        } else if roll >= 6 {
            2
        } else {
            1
        }
    }

    fn health_refill_roll(&mut self) -> TussleResult<()> {
        let roll = self.roll_die(10, "health refill")?;
        let amount = Self::refill_amount(roll);
        log::info!("seat {} refills {amount} health", self.current);
        self.player_mut(self.current).grant_health(amount);
        Ok(())
    }

    fn missile_refill_roll(&mut self) -> TussleResult<()> {
        let roll = self.roll_die(10, "missile refill")?;
        let amount = Self::refill_amount(roll);
        log::info!("seat {} refills {amount} missiles", self.current);
        self.player_mut(self.current).grant_missiles(amount);
        Ok(())
    }

    /// An enemy attacks the current player. Returns whether the player is
    /// still alive; a death ends the turn here.
    fn dodge_roll(&mut self, enemy_id: TokenId) -> TussleResult<bool> {
        let roll = self.roll_die(10, "dodge")?;
        let bonus = self.player(self.current).dodge_bonus(&self.catalog);
        let class = *self.catalog.enemy(self.enemy_state(enemy_id).class);
        self.enemy_mut(enemy_id).last_attack_turn = self.turn;
        let dodged = i64::from(roll) + i64::from(bonus) >= i64::from(class.dodge_roll_at_least);
        if dodged {
            log::debug!("seat {} dodged the {}", self.current, class.name);
            if self.player(self.current).moves_left == 0 {
                // One free move to get off the enemy's node.
                self.player_mut(self.current).moves_left = 1;
            }
        } else {
            log::info!(
                "seat {} was hit by the {} for {}",
                self.current,
                class.name,
                class.damage
            );
            self.player_mut(self.current).take_damage(class.damage);
        }
        let alive = self.player(self.current).is_alive();
        if !alive {
            self.finish_turn()?;
        }
        Ok(alive)
    }

    /// The current player attacks an enemy. Returns the enemy's remaining
    /// health.
    fn attack_roll(&mut self, enemy_id: TokenId, weapon: &Weapon) -> TussleResult<u32> {
        let roll = self.roll_die(10, "attack")?;
        let total = i64::from(roll) + i64::from(weapon.hit_roll_bonus);

        if weapon.missile {
            let player = self.player_mut(self.current);
            player.missiles = player.missiles.saturating_sub(1);
        }
        let was_first = self.player(self.current).first_attack;
        {
            let player = self.player_mut(self.current);
            player.first_attack = false;
            player.combat_lockout = true;
        }
        self.attacked_this_turn = true;
        self.delay_thaw = false;

        let class = *self.catalog.enemy(self.enemy_state(enemy_id).class);
        let hit = total >= i64::from(class.hit_roll_at_least);
        if hit {
            let mut damage = weapon.damage;
            if weapon.first_attack_damage_bonus > 0 && was_first {
                damage += weapon.first_attack_damage_bonus;
            }
            if weapon.conditional_damage > 0 && !weapon.missile {
                if let Some(at_least) = weapon.damage_condition_at_least {
                    if total >= i64::from(at_least) {
                        damage += weapon.conditional_damage;
                    }
                }
            }
            if !class.beam_can_harm && !weapon.missile {
                damage = 0;
            }
            let remaining = {
                let enemy = self.enemy_mut(enemy_id);
                enemy.health = enemy.health.saturating_sub(damage);
                enemy.health
            };
            if damage > 0 {
                log::info!(
                    "seat {} dealt {damage} damage; the {} has {remaining} health left",
                    self.current,
                    class.name
                );
            } else {
                log::info!("no damage dealt");
            }
            if remaining == 0 {
                self.board.remove_from_board(enemy_id);
                let player = self.player_mut(self.current);
                player.trophies.push(class.tie_breaker_priority);
                player.score += class.score;
                log::info!("seat {} defeated the {}", self.current, class.name);
            } else {
                let turn = self.turn;
                let enemy = self.enemy_mut(enemy_id);
                if let Some(at_least) = weapon.stun_condition_at_least {
                    if weapon.conditional_stun_rounds > 0 && total >= i64::from(at_least) {
                        enemy.stunned_since = turn;
                        enemy.stun_rounds = i64::from(weapon.conditional_stun_rounds);
                        log::info!("stunned the {}", class.name);
                    }
                }
                if weapon.freeze_on_hit_rounds > 0 {
                    enemy.frozen_since = turn;
                    enemy.freeze_rounds = i64::from(weapon.freeze_on_hit_rounds);
                    log::info!("froze the {}", class.name);
                } else if let Some(at_least) = weapon.freeze_condition_at_least {
                    if weapon.conditional_freeze_rounds > 0 && total >= i64::from(at_least) {
                        enemy.frozen_since = turn;
                        enemy.freeze_rounds = i64::from(weapon.conditional_freeze_rounds);
                        log::info!("froze the {}", class.name);
                    }
                }
            }
        } else {
            log::info!("seat {} missed the {}", self.current, class.name);
        }
        self.player_mut(self.current).engaged_with = Some(enemy_id);
        Ok(self.enemy_state(enemy_id).health)
    }

    /// The weapons the current player may use against an enemy, merged and
    /// filtered for the enemy's immunities.
    fn weapon_options(&self, enemy_id: TokenId) -> Vec<Weapon> {
        let player = self.player(self.current);
        let mut beam = Weapon::base_beam();
        for &upgrade in &player.upgrades {
            let class = self.catalog.upgrade(upgrade);
            if class.is_beam_addon && !class.optional_activation {
                beam = beam.with_addon(class);
            }
        }
        if let Some(character) = player.character {
            beam = beam.with_character_effects(self.catalog.character(character));
        }
        let mut weapons = vec![beam];
        let optional = player.upgrades.iter().copied().find(|&u| {
            let class = self.catalog.upgrade(u);
            class.is_beam_addon && class.optional_activation
        });
        if let Some(upgrade) = optional {
            weapons.push(beam.with_addon(self.catalog.upgrade(upgrade)));
        }
        if player.missiles > 0 {
            weapons.push(Weapon::missile());
        }

        let enemy = self.enemy_state(enemy_id);
        let class = self.catalog.enemy(enemy.class);
        let needs_frozen = class.invulnerable_unless_frozen
            && !enemy.is_frozen(self.turn, self.seat_count(), self.delay_thaw);
        if needs_frozen {
            weapons.retain(Weapon::can_freeze);
            if !class.beam_can_harm {
                for weapon in weapons.iter_mut().filter(|w| !w.missile) {
                    *weapon = weapon.freeze_only();
                }
            }
        } else if !class.beam_can_harm {
            weapons.retain(|w| w.missile);
        }
        weapons
    }

    /// Attack, then either offer refills for a kill or dodge the
    /// survivor's retaliation. Returns whether the player is still alive.
    fn attack_dodge_refill(
        &mut self,
        weapon: &Weapon,
        enemy_id: TokenId,
        no_retaliation: bool,
    ) -> TussleResult<bool> {
        if self.attack_roll(enemy_id, weapon)? == 0 {
            let (health_short, missiles_short) = {
                let player = self.player(self.current);
                (
                    player.health != player.max_health,
                    player.missiles != player.max_missiles,
                )
            };
            if health_short {
                self.options.push(Command::HealthRefillRoll);
            }
            if missiles_short {
                self.options.push(Command::MissileRefillRoll);
            }
            if !self.options.is_empty() {
                self.options.push(Command::Skip);
            }
        } else {
            let enemy = *self.enemy_state(enemy_id);
            let ranged = self.catalog.enemy(enemy.class).ranged;
            if !ranged && enemy.can_attack(self.turn, self.seat_count(), false) && !no_retaliation {
                return self.dodge_roll(enemy_id);
            }
        }
        Ok(true)
    }

    fn option_index(&self, command: &Command) -> Option<usize> {
        self.options.iter().position(|option| option == command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::MapNode;
    use crate::game::catalog::EnemyId;

    fn ruleset(expansion: bool, aggressive: bool) -> Ruleset {
        Ruleset {
            expansion,
            aggressive,
        }
    }

    fn line_board(nodes: usize, players: usize) -> Board {
        let mut board = Board::new();
        for _ in 0..players {
            board.add_token(Token::player());
        }
        for _ in 0..nodes {
            board.add_node(MapNode::default());
        }
        for i in 1..nodes {
            board.link(i - 1, i);
        }
        board
    }

    // An unreachable nest with a hidden objective keeps the game running.
    fn add_live_nest(board: &mut Board) -> NodeId {
        let nest = board.add_node(MapNode {
            is_nest: true,
            ..MapNode::default()
        });
        let brood = board.add_token(Token::enemy(EnemyId::Brood));
        board.place(brood, nest);
        nest
    }

    fn place_revealed_enemy(board: &mut Board, class: EnemyId, node: NodeId, health: u32) -> TokenId {
        let id = board.add_token(Token::enemy(class));
        board.place(id, node);
        board.token_mut(id).revealed = true;
        if let Some(enemy) = board.token_mut(id).as_enemy_mut() {
            enemy.health = health;
        }
        id
    }

    fn scripted_engine(board: Board, rules: Ruleset, rolls: &[u32]) -> TurnEngine {
        let mut engine =
            TurnEngine::from_board(board, rules, RandomSource::scripted(rolls.iter().copied()));
        engine.set_character(0, CharacterId::Scout).unwrap();
        engine.start().unwrap();
        engine
    }

    #[test]
    fn test_start_rolls_movement_when_placed() {
        let mut board = line_board(3, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        let engine = scripted_engine(board, ruleset(false, false), &[3, 4]);
        assert_eq!(engine.player_state(0).moves_left, 7);
        assert_eq!(
            engine.options(),
            &[Command::Move { node: 1 }, Command::Stop]
        );
        assert_eq!(engine.decision_log().rolls_from(0), vec![3, 4]);
    }

    #[test]
    fn test_start_offers_landing_sites_when_unplaced() {
        let mut engine = TurnEngine::new(9, 2, ruleset(true, false), BoardLayout::Compact);
        engine.set_character(0, CharacterId::Scout).unwrap();
        engine.set_character(1, CharacterId::Frost).unwrap();
        engine.start().unwrap();
        let sites: Vec<Command> = [0, 2, 4, 6]
            .into_iter()
            .map(|node| Command::PickStartLocation { node })
            .collect();
        assert_eq!(engine.options(), sites.as_slice());

        engine.advance(0).unwrap();
        assert_eq!(engine.board().token(0).node, Some(0));
        // Expansion rules record the landing site as a save point.
        assert_eq!(engine.player_state(0).saved_at, Some(0));
        // Sites are shared, so the second player sees all of them too.
        assert_eq!(engine.current_seat(), 1);
        assert_eq!(engine.options(), sites.as_slice());
    }

    #[test]
    fn test_tunnels_are_closed_without_traversal() {
        let mut board = line_board(2, 1);
        board.nodes[1].is_tunnel = true;
        add_live_nest(&mut board);
        board.place(0, 0);
        let engine = scripted_engine(board, ruleset(false, false), &[1, 1]);
        assert_eq!(engine.options(), &[Command::Stop]);

        let mut board = line_board(2, 1);
        board.nodes[1].is_tunnel = true;
        add_live_nest(&mut board);
        board.place(0, 0);
        let mut engine = TurnEngine::from_board(
            board,
            ruleset(true, false),
            RandomSource::scripted([1, 1]),
        );
        engine.set_character(0, CharacterId::Blade).unwrap();
        engine.start().unwrap();
        assert!(engine.options().contains(&Command::Move { node: 1 }));
    }

    #[test]
    fn test_moving_next_to_an_enemy_reveals_it() {
        let mut board = line_board(4, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        let enemy = board.add_token(Token::enemy(EnemyId::Crawler));
        board.place(enemy, 2);
        let mut engine = scripted_engine(board, ruleset(false, false), &[2, 2, 1, 1]);
        assert!(!engine.board().token(enemy).revealed);

        engine.order(Command::Move { node: 1 }).unwrap();
        assert!(engine.board().token(enemy).revealed);
        // Revealing sets the class health.
        assert_eq!(engine.board().token(enemy).as_enemy().unwrap().health, 1);
    }

    #[test]
    fn test_attack_kills_scores_and_ends_combat() {
        let mut board = line_board(4, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        place_revealed_enemy(&mut board, EnemyId::Crawler, 2, 1);
        let mut engine = scripted_engine(board, ruleset(false, false), &[1, 1, 5, 1, 1]);

        engine.order(Command::Move { node: 1 }).unwrap();
        engine.order(Command::Move { node: 2 }).unwrap();
        let beam: Vec<&Command> = engine
            .options()
            .iter()
            .filter(|o| matches!(o, Command::Attack { .. }))
            .collect();
        assert_eq!(beam.len(), 1);

        let attack = beam[0].clone();
        engine.order(attack).unwrap();
        let player = engine.player_state(0);
        assert_eq!(player.score, 1);
        assert_eq!(player.trophies, vec![0]);
        // Combat cleared at end of turn; the next turn has begun.
        assert_eq!(player.engaged_with, None);
        assert_eq!(engine.turn(), 1);
        // The dead enemy left the board.
        assert_eq!(engine.board().tokens_at(2), &[0]);
    }

    #[test]
    fn test_kill_offers_missile_refill() {
        let mut board = line_board(4, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        place_revealed_enemy(&mut board, EnemyId::Crawler, 2, 1);
        // Expansion Scout starts with one missile.
        let mut engine = scripted_engine(board, ruleset(true, false), &[1, 1, 5, 10, 1, 1]);

        engine.order(Command::Move { node: 1 }).unwrap();
        engine.order(Command::Move { node: 2 }).unwrap();
        engine
            .order(Command::Attack {
                weapon: Weapon::missile(),
                node: None,
            })
            .unwrap();
        assert_eq!(
            engine.options(),
            &[Command::MissileRefillRoll, Command::Skip]
        );
        engine.order(Command::MissileRefillRoll).unwrap();
        assert_eq!(engine.player_state(0).missiles, 1);
    }

    #[test]
    fn test_failed_dodge_applies_damage() {
        let mut board = line_board(4, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        place_revealed_enemy(&mut board, EnemyId::Crawler, 2, 1);
        let mut engine = scripted_engine(board, ruleset(false, false), &[1, 1, 1, 1, 1]);

        engine.order(Command::Move { node: 1 }).unwrap();
        engine.order(Command::Move { node: 2 }).unwrap();
        // Roll 1 plus the out-of-combat bonus of 3 misses the needed 9.
        engine.order(Command::DodgeAndMove { node: 1 }).unwrap();
        assert_eq!(engine.player_state(0).health, 4);
        assert_eq!(engine.board().token(0).node, Some(1));
    }

    #[test]
    fn test_successful_dodge_grants_a_free_move() {
        let mut board = line_board(4, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        let enemy = place_revealed_enemy(&mut board, EnemyId::Crawler, 2, 1);
        let mut engine = scripted_engine(board, ruleset(false, false), &[1, 1, 9, 1, 1]);

        engine.order(Command::Move { node: 1 }).unwrap();
        engine.order(Command::Move { node: 2 }).unwrap();
        assert_eq!(engine.player_state(0).moves_left, 0);
        // 9 + 3 beats the 9 needed; the move out is free.
        engine.order(Command::DodgeAndMove { node: 3 }).unwrap();
        assert_eq!(engine.player_state(0).health, 5);
        assert_eq!(engine.board().token(0).node, Some(3));
        assert_eq!(
            engine.board().token(enemy).as_enemy().unwrap().last_attack_turn,
            0
        );
    }

    #[test]
    fn test_ranged_enemy_attacks_on_approach() {
        let mut board = line_board(4, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        place_revealed_enemy(&mut board, EnemyId::Stinger, 2, 1);
        let mut engine = TurnEngine::from_board(
            board,
            ruleset(true, false),
            RandomSource::scripted([1, 1, 1]),
        );
        engine.set_character(0, CharacterId::Scout).unwrap();
        engine.start().unwrap();

        engine.order(Command::Move { node: 1 }).unwrap();
        // Dodge roll of 1 + 3 misses the Stinger's 8; one damage taken.
        assert_eq!(engine.player_state(0).health, 4);
        assert!(engine.options().contains(&Command::Move { node: 2 }));
    }

    #[test]
    fn test_superheated_node_heals_ember() {
        let mut board = line_board(2, 1);
        board.nodes[0].is_superheated = true;
        add_live_nest(&mut board);
        board.place(0, 0);
        let mut engine = TurnEngine::from_board(
            board,
            ruleset(true, false),
            RandomSource::scripted([1, 1, 1, 1]),
        );
        engine.set_character(0, CharacterId::Ember).unwrap();
        if let Some(player) = engine.board.token_mut(0).as_player_mut() {
            player.health = 3;
        }
        engine.start().unwrap();
        engine.order(Command::Stop).unwrap();
        assert_eq!(engine.player_state(0).health, 4);
    }

    #[test]
    fn test_superheated_node_burns_others() {
        let mut board = line_board(2, 1);
        board.nodes[0].is_superheated = true;
        add_live_nest(&mut board);
        board.place(0, 0);
        let mut engine = scripted_engine(board, ruleset(true, false), &[1, 1, 1, 1]);
        engine.order(Command::Stop).unwrap();
        assert_eq!(engine.player_state(0).health, 4);
    }

    #[test]
    fn test_invalid_commands_are_rejected() {
        let mut board = line_board(3, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        let mut engine = scripted_engine(board, ruleset(false, false), &[1, 1]);
        assert_eq!(
            engine.order(Command::ActivateStation),
            Err(TussleError::InvalidCommand)
        );
        assert_eq!(
            engine.advance(99),
            Err(TussleError::DecisionOutOfRange {
                index: 99,
                available: 2
            })
        );
    }

    #[test]
    fn test_empty_nests_end_the_game() {
        let mut board = line_board(3, 1);
        board.nodes[2].is_nest = true;
        board.place(0, 0);
        let mut engine =
            TurnEngine::from_board(board, ruleset(false, false), RandomSource::scripted([1, 1]));
        engine.set_character(0, CharacterId::Scout).unwrap();
        assert!(engine.is_game_over());
        assert_eq!(engine.order(Command::Stop), Err(TussleError::GameOver));
    }

    #[test]
    fn test_expansion_characters_locked_in_base_games() {
        let mut board = line_board(2, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        let mut engine =
            TurnEngine::from_board(board, ruleset(false, false), RandomSource::scripted([]));
        assert_eq!(
            engine.set_character(0, CharacterId::Blade),
            Err(TussleError::InvalidCommand)
        );
        assert_eq!(
            engine.set_character(9, CharacterId::Scout),
            Err(TussleError::InvalidCommand)
        );
    }

    #[test]
    fn test_revert_is_unimplemented() {
        let mut board = line_board(2, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        let mut engine = scripted_engine(board, ruleset(false, false), &[1, 1]);
        assert_eq!(engine.revert(), Err(TussleError::Unimplemented("revert")));
        // Rolling checkpointed: the movement rolls cannot be taken back.
        assert_eq!(engine.last_reversible_step(), 2);
        assert!(engine.checkpoint().is_some());
    }

    #[test]
    fn test_defeat_must_be_acknowledged() {
        let mut board = line_board(4, 1);
        add_live_nest(&mut board);
        board.place(0, 0);
        place_revealed_enemy(&mut board, EnemyId::Marauder, 2, 5);
        let mut engine = TurnEngine::from_board(
            board,
            ruleset(false, false),
            RandomSource::scripted([1, 1, 1]),
        );
        engine.set_character(0, CharacterId::Scout).unwrap();
        if let Some(player) = engine.board.token_mut(0).as_player_mut() {
            player.health = 2;
        }
        engine.start().unwrap();
        engine.order(Command::Move { node: 1 }).unwrap();
        engine.order(Command::Move { node: 2 }).unwrap();
        // Failed dodge against the Marauder's 2 damage, from 2 health: the
        // player is dead with no save point.
        engine.order(Command::DodgeAndStop).unwrap();
        assert_eq!(engine.player_state(0).health, 0);
        assert_eq!(engine.options(), &[Command::AcceptDefeat { seat: 0 }]);
        engine.order(Command::AcceptDefeat { seat: 0 }).unwrap();
        assert!(engine.is_game_over());
    }
}
