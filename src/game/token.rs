//! Tokens: the players, enemies, and stations that occupy board nodes.

use crate::game::board::{NodeId, TokenId};
use crate::game::catalog::{Catalog, CharacterClass, CharacterId, EnemyId, StationId, UpgradeId};

/// Placeholder health for tokens whose stats have not been revealed yet, so
/// an unrevealed enemy never reads as dead.
pub const UNREVEALED_HEALTH: u32 = 99;

/// Initial `last_attack_turn`; anything at or below `-player_count` works.
pub const NEVER_ATTACKED: i64 = -99;

/// One token on (or off) the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The node currently containing this token, if any. Destroyed tokens
    /// keep their state but leave the board.
    pub node: Option<NodeId>,
    /// Whether all players can see what this token is.
    pub revealed: bool,
    /// Kind-specific state.
    pub kind: TokenKind,
}

/// Kind-specific token state.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A player's character token.
    Player(PlayerState),
    /// An enemy token.
    Enemy(EnemyState),
    /// A station token.
    Station(StationState),
}

impl Token {
    /// Create an unplaced player token. Player tokens are always revealed.
    #[must_use]
    pub fn player() -> Self {
        Self {
            node: None,
            revealed: true,
            kind: TokenKind::Player(PlayerState::new()),
        }
    }

    /// Create an unplaced, unrevealed enemy token.
    #[must_use]
    pub fn enemy(class: EnemyId) -> Self {
        Self {
            node: None,
            revealed: false,
            kind: TokenKind::Enemy(EnemyState::new(class)),
        }
    }

    /// Create an unplaced station token.
    #[must_use]
    pub fn station(class: StationId, upgrade: Option<UpgradeId>) -> Self {
        Self {
            node: None,
            revealed: false,
            kind: TokenKind::Station(StationState {
                class,
                upgrade,
                early: false,
            }),
        }
    }

    /// Player state, if this is a player token.
    #[must_use]
    pub fn as_player(&self) -> Option<&PlayerState> {
        match &self.kind {
            TokenKind::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable player state, if this is a player token.
    pub fn as_player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            TokenKind::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Enemy state, if this is an enemy token.
    #[must_use]
    pub fn as_enemy(&self) -> Option<&EnemyState> {
        match &self.kind {
            TokenKind::Enemy(e) => Some(e),
            _ => None,
        }
    }

    /// Mutable enemy state, if this is an enemy token.
    pub fn as_enemy_mut(&mut self) -> Option<&mut EnemyState> {
        match &mut self.kind {
            TokenKind::Enemy(e) => Some(e),
            _ => None,
        }
    }

    /// Station state, if this is a station token.
    #[must_use]
    pub fn as_station(&self) -> Option<&StationState> {
        match &self.kind {
            TokenKind::Station(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is an enemy token.
    #[must_use]
    pub fn is_enemy(&self) -> bool {
        matches!(self.kind, TokenKind::Enemy(_))
    }

    /// Whether this is a player token.
    #[must_use]
    pub fn is_player(&self) -> bool {
        matches!(self.kind, TokenKind::Player(_))
    }
}

/// Mutable state of one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Chosen character, set before the game starts.
    pub character: Option<CharacterId>,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Current missiles.
    pub missiles: u32,
    /// Maximum missiles.
    pub max_missiles: u32,
    /// Upgrades obtained, in acquisition order.
    pub upgrades: Vec<UpgradeId>,
    /// Upgrade caches already used by this player (each is usable once per
    /// player).
    pub visited_caches: Vec<TokenId>,
    /// No attack made yet in the current fight (charge bonuses apply).
    pub first_attack: bool,
    /// Attacked recently; out-of-combat dodge bonuses stay suspended until
    /// ranged enemies have had their chance at the start of the next turn.
    pub combat_lockout: bool,
    /// Accumulated score.
    pub score: u32,
    /// Enemy this player is currently fighting.
    pub engaged_with: Option<TokenId>,
    /// Node of the last save point used, for respawning.
    pub saved_at: Option<NodeId>,
    /// Movement remaining this turn.
    pub moves_left: u32,
    /// Tie-breaker priorities of defeated tokens, for final rankings.
    pub trophies: Vec<u8>,
    /// The player was defeated for good and has conceded.
    pub accepted_defeat: bool,
}

impl PlayerState {
    fn new() -> Self {
        Self {
            character: None,
            health: UNREVEALED_HEALTH,
            max_health: UNREVEALED_HEALTH,
            missiles: 0,
            max_missiles: 0,
            upgrades: Vec::new(),
            visited_caches: Vec::new(),
            first_attack: true,
            combat_lockout: false,
            score: 0,
            engaged_with: None,
            saved_at: None,
            moves_left: 0,
            trophies: Vec::new(),
            accepted_defeat: false,
        }
    }

    /// Assign a character; initializes health and missiles from its stats.
    pub fn set_character(&mut self, id: CharacterId, class: &CharacterClass) {
        self.character = Some(id);
        self.health = class.health;
        self.max_health = class.health;
        self.missiles = class.starting_missiles;
        self.max_missiles = class.starting_missiles;
    }

    /// Whether the player is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Grant health, clamped to maximum.
    pub fn grant_health(&mut self, amount: u32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Grant missiles, clamped to maximum.
    pub fn grant_missiles(&mut self, amount: u32) {
        self.missiles = (self.missiles + amount).min(self.max_missiles);
    }

    /// Take damage, clamped at zero.
    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Total dodge-roll bonus right now. Out-of-combat bonuses apply only
    /// while not engaged with an enemy.
    #[must_use]
    pub fn dodge_bonus(&self, catalog: &Catalog) -> i32 {
        let Some(character) = self.character else {
            return 0;
        };
        let class = catalog.character(character);
        let mut bonus = class.dodge_bonus;
        if self.engaged_with.is_none() {
            bonus += class.dodge_out_of_combat_bonus;
            for upgrade in &self.upgrades {
                bonus += catalog.upgrade(*upgrade).dodge_out_of_combat_bonus;
            }
        }
        bonus
    }

    /// Whether the player can enter tunnel nodes.
    #[must_use]
    pub fn can_use_tunnels(&self, catalog: &Catalog) -> bool {
        self.character
            .is_some_and(|c| catalog.character(c).can_traverse_tunnels)
            || self
                .upgrades
                .iter()
                .any(|u| catalog.upgrade(*u).enables_tunnels)
    }

    /// Final-ranking score: raw score first, then trophy counts per
    /// tie-breaker bucket, encoded base 98 so one comparison ranks players.
    ///
    /// # Panics
    ///
    /// Panics if any bucket exceeds 97; that is a bug, not a game state.
    #[must_use]
    pub fn tie_breaking_score(&self) -> u64 {
        let mut buckets = [0u64; 8];
        buckets[0] = u64::from(self.score);
        for &priority in &self.trophies {
            if priority > 0 {
                buckets[usize::from(priority.min(7))] += 1;
            }
        }
        let mut score = 0u64;
        for bucket in buckets {
            assert!(bucket <= 97, "tie-breaker bucket overflow: {bucket}");
            score = score * 98 + bucket;
        }
        score
    }
}

/// Mutable state of one enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyState {
    /// Species.
    pub class: EnemyId,
    /// Current health; `UNREVEALED_HEALTH` until revealed.
    pub health: u32,
    /// Turn number when last stunned.
    pub stunned_since: i64,
    /// Stun duration in full rounds.
    pub stun_rounds: i64,
    /// Turn number when last frozen.
    pub frozen_since: i64,
    /// Freeze duration in full rounds.
    pub freeze_rounds: i64,
    /// Turn number of this enemy's last attack.
    pub last_attack_turn: i64,
    /// Player token this enemy is locked onto, if any.
    pub target: Option<TokenId>,
}

impl EnemyState {
    fn new(class: EnemyId) -> Self {
        Self {
            class,
            health: UNREVEALED_HEALTH,
            stunned_since: -1,
            stun_rounds: 0,
            frozen_since: -1,
            freeze_rounds: 0,
            last_attack_turn: NEVER_ATTACKED,
            target: None,
        }
    }

    /// Whether the enemy is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Whether the enemy is currently frozen. With `delay_thaw` the check
    /// acts as if the current turn has not started yet, so an enemy frozen
    /// on the player's previous turn stays frozen until the player commits
    /// to an action.
    #[must_use]
    pub fn is_frozen(&self, turn: i64, player_count: i64, delay_thaw: bool) -> bool {
        self.frozen_since > turn - player_count * self.freeze_rounds - i64::from(delay_thaw)
    }

    /// Whether the enemy can attack right now: alive, not stunned, not
    /// frozen, and its attack has recharged (one full round since the last).
    #[must_use]
    pub fn can_attack(&self, turn: i64, player_count: i64, delay_thaw: bool) -> bool {
        self.is_alive()
            && self.stunned_since <= turn - player_count * self.stun_rounds
            && !self.is_frozen(turn, player_count, delay_thaw)
            && self.last_attack_turn <= turn - player_count
    }
}

/// State of one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationState {
    /// Station kind.
    pub class: StationId,
    /// Upgrade payload, for upgrade caches.
    pub upgrade: Option<UpgradeId>,
    /// Reachable from the landing site without crossing a tunnel.
    pub early: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::Ruleset;

    fn expansion_catalog() -> Catalog {
        Catalog::new(Ruleset {
            expansion: true,
            aggressive: false,
        })
    }

    #[test]
    fn test_set_character_initializes_stats() {
        let catalog = expansion_catalog();
        let mut player = Token::player();
        let state = player.as_player_mut().unwrap();
        state.set_character(CharacterId::Scout, catalog.character(CharacterId::Scout));
        assert_eq!(state.health, 5);
        assert_eq!(state.max_health, 5);
        assert_eq!(state.missiles, 1);
    }

    #[test]
    fn test_grants_clamp_to_maximum() {
        let catalog = expansion_catalog();
        let mut player = Token::player();
        let state = player.as_player_mut().unwrap();
        state.set_character(CharacterId::Frost, catalog.character(CharacterId::Frost));
        state.take_damage(2);
        state.grant_health(10);
        assert_eq!(state.health, 5);
        state.grant_missiles(10);
        assert_eq!(state.missiles, 0);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let catalog = expansion_catalog();
        let mut player = Token::player();
        let state = player.as_player_mut().unwrap();
        state.set_character(CharacterId::Ember, catalog.character(CharacterId::Ember));
        state.take_damage(50);
        assert_eq!(state.health, 0);
        assert!(!state.is_alive());
    }

    #[test]
    fn test_dodge_bonus_drops_while_engaged() {
        let catalog = expansion_catalog();
        let mut player = Token::player();
        let state = player.as_player_mut().unwrap();
        state.set_character(CharacterId::Scout, catalog.character(CharacterId::Scout));
        state.upgrades.push(UpgradeId::TunnelKit);
        assert_eq!(state.dodge_bonus(&catalog), 5);
        state.engaged_with = Some(3);
        assert_eq!(state.dodge_bonus(&catalog), 0);
    }

    #[test]
    fn test_blade_keeps_flat_bonus_in_combat() {
        let catalog = expansion_catalog();
        let mut player = Token::player();
        let state = player.as_player_mut().unwrap();
        state.set_character(CharacterId::Blade, catalog.character(CharacterId::Blade));
        assert_eq!(state.dodge_bonus(&catalog), 5);
        state.engaged_with = Some(3);
        assert_eq!(state.dodge_bonus(&catalog), 2);
    }

    #[test]
    fn test_tunnel_access_via_upgrade_or_character() {
        let catalog = expansion_catalog();
        let mut player = Token::player();
        let state = player.as_player_mut().unwrap();
        state.set_character(CharacterId::Scout, catalog.character(CharacterId::Scout));
        assert!(!state.can_use_tunnels(&catalog));
        state.upgrades.push(UpgradeId::TunnelKit);
        assert!(state.can_use_tunnels(&catalog));

        let mut blade = Token::player();
        let state = blade.as_player_mut().unwrap();
        state.set_character(CharacterId::Blade, catalog.character(CharacterId::Blade));
        assert!(state.can_use_tunnels(&catalog));
    }

    #[test]
    fn test_tie_breaking_score_orders_by_buckets() {
        let mut a = Token::player();
        let a_state = a.as_player_mut().unwrap();
        a_state.score = 5;
        a_state.trophies = vec![1, 1];

        let mut b = Token::player();
        let b_state = b.as_player_mut().unwrap();
        b_state.score = 5;
        b_state.trophies = vec![1];

        assert!(a_state.tie_breaking_score() > b_state.tie_breaking_score());

        // Raw score dominates trophy count
        b_state.score = 6;
        assert!(b_state.tie_breaking_score() > a_state.tie_breaking_score());
    }

    #[test]
    fn test_freeze_window() {
        let mut enemy = EnemyState::new(EnemyId::Brood);
        enemy.health = 5;
        enemy.frozen_since = 10;
        enemy.freeze_rounds = 1;
        // Two players: frozen through turn 11, thawed at 12
        assert!(enemy.is_frozen(11, 2, false));
        assert!(!enemy.is_frozen(12, 2, false));
        // delay_thaw extends the window by one turn
        assert!(enemy.is_frozen(12, 2, true));
    }

    #[test]
    fn test_attack_recharge_takes_a_full_round() {
        let mut enemy = EnemyState::new(EnemyId::Crawler);
        enemy.health = 1;
        assert!(enemy.can_attack(0, 2, false));
        enemy.last_attack_turn = 4;
        assert!(!enemy.can_attack(5, 2, false));
        assert!(enemy.can_attack(6, 2, false));
    }

    #[test]
    fn test_stun_blocks_attacks() {
        let mut enemy = EnemyState::new(EnemyId::Raider);
        enemy.health = 4;
        enemy.stunned_since = 8;
        enemy.stun_rounds = 1;
        assert!(!enemy.can_attack(9, 2, false));
        assert!(enemy.can_attack(10, 2, false));
    }

    #[test]
    fn test_dead_enemy_cannot_attack() {
        let mut enemy = EnemyState::new(EnemyId::Mite);
        enemy.health = 0;
        assert!(!enemy.can_attack(100, 2, false));
    }
}
