//! Capability catalog: character, enemy, upgrade, and station stat tables.
//!
//! Every token's behavior is data-driven. `Catalog::new` builds the merged
//! tables for a ruleset once, at game construction; nothing in here mutates
//! afterwards, so two engines built with the same `Ruleset` always agree.

// Stat blocks are flat flag tables on purpose; grouping the flags would
// only obscure the rulebook they transcribe.
#![allow(clippy::struct_excessive_bools)]

use serde::{Deserialize, Serialize};

/// Optional rule toggles chosen at game start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Expanded content: two extra characters, ranged enemies, freeze and
    /// stun mechanics, save points, and revival.
    pub expansion: bool,
    /// Competitive variant: exclusive nodes, kill-steal attacks, and
    /// upgrade-cache sabotage.
    pub aggressive: bool,
}

impl Ruleset {
    /// Defeated players respawn at their last save point.
    #[must_use]
    pub const fn players_can_revive(self) -> bool {
        self.expansion
    }

    /// Two living players may occupy the same node.
    #[must_use]
    pub const fn players_share_nodes(self) -> bool {
        !self.aggressive
    }

    /// Attacks on an adjacent node's engaged enemy are allowed.
    #[must_use]
    pub const fn kill_steal_allowed(self) -> bool {
        self.aggressive
    }

    /// Upgrade caches are destroyed after use.
    #[must_use]
    pub const fn sabotage_caches(self) -> bool {
        self.aggressive
    }
}

/// Playable character. Declaration order is the pick-index order used in
/// persisted decision lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterId {
    /// All-rounder; starts with a missile in expansion games.
    Scout,
    /// Bonus beam damage on high attack rolls.
    Striker,
    /// Heals in superheated nodes instead of taking damage.
    Ember,
    /// Freezes enemies on high attack rolls.
    Frost,
    /// Expansion only: innate tunnel traversal and an always-on dodge bonus.
    Blade,
    /// Expansion only: stuns enemies on high attack rolls.
    Volt,
}

impl CharacterId {
    /// All characters, in pick-index order.
    pub const ALL: [CharacterId; 6] = [
        CharacterId::Scout,
        CharacterId::Striker,
        CharacterId::Ember,
        CharacterId::Frost,
        CharacterId::Blade,
        CharacterId::Volt,
    ];
}

/// Stat block for one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterClass {
    /// Display name.
    pub name: &'static str,
    /// Starting and maximum health.
    pub health: u32,
    /// Missiles carried at game start.
    pub starting_missiles: u32,
    /// Dodge bonus applied on every dodge roll.
    pub dodge_bonus: i32,
    /// Extra dodge bonus while out of combat.
    pub dodge_out_of_combat_bonus: i32,
    /// Superheated nodes heal instead of damaging.
    pub superheated_heals: bool,
    /// Can enter tunnel nodes without an upgrade.
    pub can_traverse_tunnels: bool,
    /// May not take the ChargeAmp upgrade.
    pub charge_amp_disallowed: bool,
    /// May not take the ThermalSuit upgrade.
    pub thermal_suit_disallowed: bool,
    /// May not take the CryoBeam upgrade.
    pub cryo_beam_disallowed: bool,
    /// May not take the TunnelKit upgrade.
    pub tunnel_kit_disallowed: bool,
    /// Bonus beam damage when the attack total meets the condition.
    pub conditional_damage: u32,
    /// Attack total needed for the damage bonus.
    pub damage_condition_at_least: Option<i32>,
    /// Freeze duration (rounds) when the freeze condition is met.
    pub conditional_freeze_rounds: u32,
    /// Attack total needed to freeze.
    pub freeze_condition_at_least: Option<i32>,
    /// Stun duration (rounds) when the stun condition is met.
    pub conditional_stun_rounds: u32,
    /// Attack total needed to stun.
    pub stun_condition_at_least: Option<i32>,
}

/// Enemy species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum EnemyId {
    Crawler,
    Mite,
    Drifter,
    Hopper,
    Shellback,
    Stinger,
    Raider,
    Whelp,
    Marauder,
    /// The objective: every living Brood must be cleared from its nest.
    Brood,
    /// Empty-nest decoy; vanishes the moment it is revealed.
    DecoyBrood,
}

/// Stat block for one enemy species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyClass {
    /// Display name.
    pub name: &'static str,
    /// Health when revealed.
    pub health: u32,
    /// Damage dealt on a failed dodge.
    pub damage: u32,
    /// Attack total the player needs to hit it.
    pub hit_roll_at_least: i32,
    /// Dodge total the player needs to avoid its attack.
    pub dodge_roll_at_least: i32,
    /// Beam weapons can damage it.
    pub beam_can_harm: bool,
    /// Attacks from one node away.
    pub ranged: bool,
    /// Takes no damage at all unless currently frozen.
    pub invulnerable_unless_frozen: bool,
    /// Must be defeated for the game to end.
    pub is_objective: bool,
    /// Only ever placed in nest nodes.
    pub nest_only: bool,
    /// Removed from the board the moment it is revealed.
    pub destroy_on_reveal: bool,
    /// Points awarded for defeating it.
    pub score: u32,
    /// Tie-breaker bucket (0 = not a tie breaker).
    pub tie_breaker_priority: u8,
}

/// Obtainable upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum UpgradeId {
    TunnelKit,
    ChargeAmp,
    MissileRack,
    EnergyCell,
    ThermalSuit,
    CryoBeam,
}

/// Stat block for one upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeClass {
    /// Display name.
    pub name: &'static str,
    /// Permanent maximum-health increase.
    pub max_health: u32,
    /// Immediate health granted.
    pub health: u32,
    /// Permanent maximum-missile increase.
    pub max_missiles: u32,
    /// Immediate missiles granted.
    pub missiles: u32,
    /// Extra dodge bonus while out of combat.
    pub dodge_out_of_combat_bonus: i32,
    /// Grants tunnel traversal.
    pub enables_tunnels: bool,
    /// Grants immunity to superheated nodes.
    pub superheated_immunity: bool,
    /// Merges into the beam weapon.
    pub is_beam_addon: bool,
    /// Beam addon the player chooses per attack instead of always-on.
    pub optional_activation: bool,
    /// Attack-roll modifier when active.
    pub hit_roll_bonus: i32,
    /// Bonus damage on the first beam attack of a fight.
    pub first_attack_damage_bonus: u32,
    /// Guaranteed freeze duration on any hit.
    pub freeze_on_hit_rounds: u32,
    /// Sabotage-protected until every player who can use it has it.
    pub guaranteed: bool,
}

/// Station kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum StationId {
    /// Landing-site ship: full refill, halts movement, save point in
    /// expansion games.
    Ship,
    /// Grants its upgrade; the stop is mandatory.
    UpgradeCache,
    Recharge,
    SavePoint,
    MapStation,
}

/// Stat block for one station kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationClass {
    /// Display name.
    pub name: &'static str,
    /// The player may pass through without activating it.
    pub optional_stop: bool,
    /// Activation ends movement for the turn.
    pub halt_movement: bool,
    /// Activation refills health to maximum.
    pub refill_health: bool,
    /// Activation refills missiles to maximum.
    pub refill_missiles: bool,
    /// Activation grants the station's upgrade payload.
    pub grants_upgrade: bool,
    /// Activation records a respawn point here.
    pub save_point: bool,
    /// Activation reveals every non-enemy token, then self-destructs.
    pub map_reveal: bool,
}

const STANDARD_HEALTH: u32 = 5;
const STANDARD_OUT_OF_COMBAT_DODGE: i32 = 3;
const STANDARD_HIT_AT_LEAST: i32 = 2;
const STANDARD_DODGE_AT_LEAST: i32 = 9;

const fn character(name: &'static str) -> CharacterClass {
    CharacterClass {
        name,
        health: STANDARD_HEALTH,
        starting_missiles: 0,
        dodge_bonus: 0,
        dodge_out_of_combat_bonus: STANDARD_OUT_OF_COMBAT_DODGE,
        superheated_heals: false,
        can_traverse_tunnels: false,
        charge_amp_disallowed: false,
        thermal_suit_disallowed: false,
        cryo_beam_disallowed: false,
        tunnel_kit_disallowed: false,
        conditional_damage: 0,
        damage_condition_at_least: None,
        conditional_freeze_rounds: 0,
        freeze_condition_at_least: None,
        conditional_stun_rounds: 0,
        stun_condition_at_least: None,
    }
}

const fn enemy(name: &'static str, health: u32, damage: u32, score: u32) -> EnemyClass {
    EnemyClass {
        name,
        health,
        damage,
        hit_roll_at_least: STANDARD_HIT_AT_LEAST,
        dodge_roll_at_least: STANDARD_DODGE_AT_LEAST,
        beam_can_harm: true,
        ranged: false,
        invulnerable_unless_frozen: false,
        is_objective: false,
        nest_only: false,
        destroy_on_reveal: false,
        score,
        tie_breaker_priority: 0,
    }
}

const fn upgrade(name: &'static str) -> UpgradeClass {
    UpgradeClass {
        name,
        max_health: 0,
        health: 0,
        max_missiles: 0,
        missiles: 0,
        dodge_out_of_combat_bonus: 0,
        enables_tunnels: false,
        superheated_immunity: false,
        is_beam_addon: false,
        optional_activation: false,
        hit_roll_bonus: 0,
        first_attack_damage_bonus: 0,
        freeze_on_hit_rounds: 0,
        guaranteed: false,
    }
}

const fn station(name: &'static str) -> StationClass {
    StationClass {
        name,
        optional_stop: false,
        halt_movement: false,
        refill_health: false,
        refill_missiles: false,
        grants_upgrade: false,
        save_point: false,
        map_reveal: false,
    }
}

/// Immutable merged stat tables for one ruleset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    ruleset: Ruleset,
    characters: [CharacterClass; 6],
    enemies: [EnemyClass; 11],
    upgrades: [UpgradeClass; 6],
    stations: [StationClass; 5],
}

impl Catalog {
    /// Build the merged tables for the given ruleset.
    #[must_use]
    pub fn new(ruleset: Ruleset) -> Self {
        let mut characters = [
            character("Scout"),
            character("Striker"),
            character("Ember"),
            character("Frost"),
            character("Blade"),
            character("Volt"),
        ];

        let mut enemies = [
            enemy("Crawler", 1, 1, 1),
            enemy("Mite", 1, 1, 1),
            enemy("Drifter", 2, 1, 1),
            enemy("Hopper", 3, 1, 1),
            enemy("Shellback", 3, 1, 1),
            enemy("Stinger", 1, 1, 1),
            enemy("Raider", 4, 2, 2),
            enemy("Whelp", 4, 1, 1),
            enemy("Marauder", 5, 2, 2),
            enemy("Brood", 5, 2, 3),
            enemy("DecoyBrood", 0, 0, 0),
        ];
        enemies[EnemyId::Shellback as usize].beam_can_harm = false;
        {
            let brood = &mut enemies[EnemyId::Brood as usize];
            brood.beam_can_harm = false;
            brood.is_objective = true;
            brood.nest_only = true;
            brood.tie_breaker_priority = 1;
        }
        {
            let decoy = &mut enemies[EnemyId::DecoyBrood as usize];
            decoy.hit_roll_at_least = 0;
            decoy.nest_only = true;
            decoy.destroy_on_reveal = true;
        }

        let mut upgrades = [
            upgrade("TunnelKit"),
            upgrade("ChargeAmp"),
            upgrade("MissileRack"),
            upgrade("EnergyCell"),
            upgrade("ThermalSuit"),
            upgrade("CryoBeam"),
        ];
        {
            let kit = &mut upgrades[UpgradeId::TunnelKit as usize];
            kit.dodge_out_of_combat_bonus = 2;
            kit.enables_tunnels = true;
        }
        {
            let amp = &mut upgrades[UpgradeId::ChargeAmp as usize];
            amp.is_beam_addon = true;
            amp.first_attack_damage_bonus = 2;
        }
        {
            let rack = &mut upgrades[UpgradeId::MissileRack as usize];
            rack.missiles = 3;
            rack.max_missiles = 3;
        }
        {
            let cell = &mut upgrades[UpgradeId::EnergyCell as usize];
            cell.health = 3;
            cell.max_health = 3;
        }
        upgrades[UpgradeId::ThermalSuit as usize].superheated_immunity = true;
        {
            let cryo = &mut upgrades[UpgradeId::CryoBeam as usize];
            cryo.is_beam_addon = true;
            cryo.optional_activation = true;
            cryo.hit_roll_bonus = -1;
            cryo.freeze_on_hit_rounds = 1;
        }

        let mut stations = [
            station("Ship"),
            station("UpgradeCache"),
            station("Recharge"),
            station("SavePoint"),
            station("MapStation"),
        ];
        {
            let ship = &mut stations[StationId::Ship as usize];
            ship.optional_stop = true;
            ship.halt_movement = true;
            ship.refill_health = true;
            ship.refill_missiles = true;
        }
        stations[StationId::UpgradeCache as usize].grants_upgrade = true;
        {
            let recharge = &mut stations[StationId::Recharge as usize];
            recharge.optional_stop = true;
            recharge.halt_movement = true;
            recharge.refill_health = true;
            recharge.refill_missiles = true;
        }
        {
            let save = &mut stations[StationId::SavePoint as usize];
            save.optional_stop = true;
            save.halt_movement = true;
            save.refill_health = true;
            save.save_point = true;
        }
        {
            let map = &mut stations[StationId::MapStation as usize];
            map.optional_stop = true;
            map.halt_movement = true;
            map.map_reveal = true;
        }

        if ruleset.expansion {
            apply_expansion(&mut characters, &mut enemies, &mut stations);
        }
        if ruleset.aggressive {
            for id in [UpgradeId::TunnelKit, UpgradeId::CryoBeam, UpgradeId::MissileRack] {
                upgrades[id as usize].guaranteed = true;
            }
        }

        Self {
            ruleset,
            characters,
            enemies,
            upgrades,
            stations,
        }
    }

    /// The ruleset these tables were built for.
    #[must_use]
    pub fn ruleset(&self) -> Ruleset {
        self.ruleset
    }

    /// Characters pickable under this ruleset, in pick-index order.
    #[must_use]
    pub fn available_characters(&self) -> &'static [CharacterId] {
        if self.ruleset.expansion {
            &CharacterId::ALL
        } else {
            &CharacterId::ALL[..4]
        }
    }

    /// Stat block for a character.
    #[must_use]
    pub fn character(&self, id: CharacterId) -> &CharacterClass {
        &self.characters[id as usize]
    }

    /// Stat block for an enemy species.
    #[must_use]
    pub fn enemy(&self, id: EnemyId) -> &EnemyClass {
        &self.enemies[id as usize]
    }

    /// Stat block for an upgrade.
    #[must_use]
    pub fn upgrade(&self, id: UpgradeId) -> &UpgradeClass {
        &self.upgrades[id as usize]
    }

    /// Stat block for a station kind.
    #[must_use]
    pub fn station(&self, id: StationId) -> &StationClass {
        &self.stations[id as usize]
    }
}

fn apply_expansion(
    characters: &mut [CharacterClass; 6],
    enemies: &mut [EnemyClass; 11],
    stations: &mut [StationClass; 5],
) {
    characters[CharacterId::Scout as usize].starting_missiles = 1;
    {
        let striker = &mut characters[CharacterId::Striker as usize];
        striker.charge_amp_disallowed = true;
        striker.conditional_damage = 2;
        striker.damage_condition_at_least = Some(4);
    }
    {
        let ember = &mut characters[CharacterId::Ember as usize];
        ember.thermal_suit_disallowed = true;
        ember.superheated_heals = true;
    }
    {
        let frost = &mut characters[CharacterId::Frost as usize];
        frost.cryo_beam_disallowed = true;
        frost.freeze_condition_at_least = Some(3);
        frost.conditional_freeze_rounds = 1;
    }
    {
        let blade = &mut characters[CharacterId::Blade as usize];
        blade.tunnel_kit_disallowed = true;
        blade.dodge_bonus = 2;
        blade.can_traverse_tunnels = true;
    }
    {
        let volt = &mut characters[CharacterId::Volt as usize];
        volt.stun_condition_at_least = Some(6);
        volt.conditional_stun_rounds = 1;
    }

    // (hit_roll_at_least, dodge_roll_at_least, ranged) per species
    let combat: [(EnemyId, i32, i32, bool); 10] = [
        (EnemyId::Crawler, 2, 7, false),
        (EnemyId::Mite, 3, 9, false),
        (EnemyId::Drifter, 2, 8, false),
        (EnemyId::Hopper, 2, 7, false),
        (EnemyId::Shellback, 2, 7, false),
        (EnemyId::Stinger, 5, 8, true),
        (EnemyId::Raider, 2, 8, false),
        (EnemyId::Whelp, 3, 8, true),
        (EnemyId::Marauder, 3, 9, true),
        (EnemyId::Brood, 3, 8, false),
    ];
    for (id, hit, dodge, ranged) in combat {
        let class = &mut enemies[id as usize];
        class.hit_roll_at_least = hit;
        class.dodge_roll_at_least = dodge;
        class.ranged = ranged;
    }
    enemies[EnemyId::Brood as usize].invulnerable_unless_frozen = true;

    stations[StationId::Ship as usize].save_point = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_catalog_has_four_characters() {
        let catalog = Catalog::new(Ruleset::default());
        assert_eq!(catalog.available_characters().len(), 4);
        assert_eq!(catalog.character(CharacterId::Scout).starting_missiles, 0);
        assert_eq!(catalog.character(CharacterId::Scout).health, 5);
    }

    #[test]
    fn test_expansion_unlocks_extra_characters() {
        let catalog = Catalog::new(Ruleset {
            expansion: true,
            aggressive: false,
        });
        assert_eq!(catalog.available_characters().len(), 6);
        assert_eq!(catalog.character(CharacterId::Scout).starting_missiles, 1);
        assert!(catalog.character(CharacterId::Blade).can_traverse_tunnels);
        assert_eq!(catalog.character(CharacterId::Blade).dodge_bonus, 2);
    }

    #[test]
    fn test_base_enemies_share_standard_rolls() {
        let catalog = Catalog::new(Ruleset::default());
        for id in [EnemyId::Crawler, EnemyId::Raider, EnemyId::Brood] {
            assert_eq!(catalog.enemy(id).hit_roll_at_least, 2);
            assert_eq!(catalog.enemy(id).dodge_roll_at_least, 9);
            assert!(!catalog.enemy(id).ranged);
        }
        assert!(!catalog.enemy(EnemyId::Brood).invulnerable_unless_frozen);
    }

    #[test]
    fn test_expansion_enemy_patches() {
        let catalog = Catalog::new(Ruleset {
            expansion: true,
            aggressive: false,
        });
        assert!(catalog.enemy(EnemyId::Stinger).ranged);
        assert_eq!(catalog.enemy(EnemyId::Stinger).hit_roll_at_least, 5);
        assert!(catalog.enemy(EnemyId::Brood).invulnerable_unless_frozen);
        assert_eq!(catalog.enemy(EnemyId::Crawler).dodge_roll_at_least, 7);
    }

    #[test]
    fn test_objective_flags() {
        let catalog = Catalog::new(Ruleset::default());
        let brood = catalog.enemy(EnemyId::Brood);
        assert!(brood.is_objective && brood.nest_only && !brood.beam_can_harm);
        assert_eq!(brood.tie_breaker_priority, 1);
        let decoy = catalog.enemy(EnemyId::DecoyBrood);
        assert!(decoy.destroy_on_reveal && decoy.nest_only);
        assert_eq!(decoy.health, 0);
    }

    #[test]
    fn test_aggressive_marks_guaranteed_upgrades() {
        let catalog = Catalog::new(Ruleset {
            expansion: true,
            aggressive: true,
        });
        assert!(catalog.upgrade(UpgradeId::TunnelKit).guaranteed);
        assert!(catalog.upgrade(UpgradeId::CryoBeam).guaranteed);
        assert!(catalog.upgrade(UpgradeId::MissileRack).guaranteed);
        assert!(!catalog.upgrade(UpgradeId::EnergyCell).guaranteed);
    }

    #[test]
    fn test_station_effects() {
        let catalog = Catalog::new(Ruleset::default());
        let ship = catalog.station(StationId::Ship);
        assert!(ship.optional_stop && ship.halt_movement && ship.refill_health);
        assert!(!ship.save_point);
        assert!(catalog.station(StationId::UpgradeCache).grants_upgrade);
        assert!(!catalog.station(StationId::UpgradeCache).optional_stop);

        let expansion = Catalog::new(Ruleset {
            expansion: true,
            aggressive: false,
        });
        assert!(expansion.station(StationId::Ship).save_point);
        assert!(expansion.station(StationId::MapStation).map_reveal);
    }
}
