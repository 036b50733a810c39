//! Commands, weapons, and the append-only decision log.
//!
//! A `Command` doubles as an offered option: the engine regenerates the
//! legal option list after every decision, and an incoming command is valid
//! only if it is structurally equal to one of them. Matching is plain field
//! equality, so the derived `PartialEq` is the validation.

use serde::{Deserialize, Serialize};

use crate::game::board::{NodeId, SeatId};
use crate::game::catalog::{CharacterClass, UpgradeClass};

/// A concrete attack profile: the base beam or missile merged with every
/// active addon and the attacker's character effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    /// Missile shot; consumes ammo and ignores beam immunities.
    pub missile: bool,
    /// Base damage on a hit.
    pub damage: u32,
    /// Attack-roll modifier.
    pub hit_roll_bonus: i32,
    /// Bonus damage on the first attack of a fight.
    pub first_attack_damage_bonus: u32,
    /// Bonus beam damage when the attack total meets its condition.
    pub conditional_damage: u32,
    /// Attack total needed for the damage bonus.
    pub damage_condition_at_least: Option<i32>,
    /// Freeze duration when the freeze condition is met.
    pub conditional_freeze_rounds: u32,
    /// Attack total needed to freeze.
    pub freeze_condition_at_least: Option<i32>,
    /// Stun duration when the stun condition is met.
    pub conditional_stun_rounds: u32,
    /// Attack total needed to stun.
    pub stun_condition_at_least: Option<i32>,
    /// Guaranteed freeze duration on any hit.
    pub freeze_on_hit_rounds: u32,
}

impl Weapon {
    /// The unmodified beam.
    #[must_use]
    pub const fn base_beam() -> Self {
        Self {
            missile: false,
            damage: 1,
            hit_roll_bonus: 0,
            first_attack_damage_bonus: 0,
            conditional_damage: 0,
            damage_condition_at_least: None,
            conditional_freeze_rounds: 0,
            freeze_condition_at_least: None,
            conditional_stun_rounds: 0,
            stun_condition_at_least: None,
            freeze_on_hit_rounds: 0,
        }
    }

    /// The unmodified missile.
    #[must_use]
    pub const fn missile() -> Self {
        Self {
            missile: true,
            damage: 3,
            ..Self::base_beam()
        }
    }

    /// Merge a beam addon into this weapon. Only the fields an addon
    /// declares are overwritten.
    #[must_use]
    pub fn with_addon(mut self, addon: &UpgradeClass) -> Self {
        if addon.hit_roll_bonus != 0 {
            self.hit_roll_bonus = addon.hit_roll_bonus;
        }
        if addon.first_attack_damage_bonus != 0 {
            self.first_attack_damage_bonus = addon.first_attack_damage_bonus;
        }
        if addon.freeze_on_hit_rounds != 0 {
            self.freeze_on_hit_rounds = addon.freeze_on_hit_rounds;
        }
        self
    }

    /// Apply a character's conditional combat effects to a beam.
    #[must_use]
    pub fn with_character_effects(mut self, class: &CharacterClass) -> Self {
        self.conditional_damage = class.conditional_damage;
        self.damage_condition_at_least = class.damage_condition_at_least;
        self.conditional_freeze_rounds = class.conditional_freeze_rounds;
        self.freeze_condition_at_least = class.freeze_condition_at_least;
        self.conditional_stun_rounds = class.conditional_stun_rounds;
        self.stun_condition_at_least = class.stun_condition_at_least;
        self
    }

    /// Whether this weapon can freeze at all.
    #[must_use]
    pub fn can_freeze(&self) -> bool {
        self.freeze_on_hit_rounds > 0 || self.conditional_freeze_rounds > 0
    }

    /// Strip damage and stun from a beam that cannot harm its target,
    /// leaving only its freeze capability.
    #[must_use]
    pub fn freeze_only(mut self) -> Self {
        self.damage = 0;
        self.conditional_damage = 0;
        self.conditional_stun_rounds = 0;
        self
    }
}

/// A player command; also the type of an offered option.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Place the character token at an open landing site.
    PickStartLocation {
        /// The chosen landing site.
        node: NodeId,
    },
    /// Concede after being defeated with no save point.
    AcceptDefeat {
        /// The conceding seat.
        seat: SeatId,
    },
    /// Move to an adjacent node.
    Move {
        /// The destination.
        node: NodeId,
    },
    /// Dodge the waiting enemy, then move to an adjacent node.
    DodgeAndMove {
        /// The destination.
        node: NodeId,
    },
    /// Dodge the waiting enemy, then end movement.
    DodgeAndStop,
    /// End the turn.
    Stop,
    /// Decline the offered station or refill and end the turn.
    Skip,
    /// Activate the station in the current node.
    ActivateStation,
    /// Roll for a health refill after a kill.
    HealthRefillRoll,
    /// Roll for a missile refill after a kill.
    MissileRefillRoll,
    /// Attack an enemy with a specific weapon.
    Attack {
        /// The merged weapon to use.
        weapon: Weapon,
        /// Target node for kill-steal attacks; `None` means the current
        /// node.
        node: Option<NodeId>,
    },
    /// Allow another player's attack on the enemy this seat is fighting.
    PermitAssist {
        /// The weapon the attacker asked to use.
        weapon: Weapon,
        /// The consenting seat.
        seat: SeatId,
    },
    /// Refuse another player's attack on the enemy this seat is fighting.
    RejectAssist {
        /// The weapon the attacker asked to use.
        weapon: Weapon,
        /// The refusing seat.
        seat: SeatId,
    },
}

impl Command {
    /// The seat allowed to submit this command, given whose turn it is.
    /// Consent and defeat commands belong to the seat they name; everything
    /// else belongs to the current player.
    #[must_use]
    pub fn acting_seat(&self, current: SeatId) -> SeatId {
        match self {
            Command::AcceptDefeat { seat }
            | Command::PermitAssist { seat, .. }
            | Command::RejectAssist { seat, .. } => *seat,
            _ => current,
        }
    }
}

/// One replayable event: a die roll or a validated choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    /// A die roll the engine performed.
    Roll {
        /// The rolled value.
        value: u32,
        /// Die size, for auditing.
        sides: u32,
    },
    /// A validated player choice.
    Choice {
        /// Index of the matched option in the option list at the time.
        index: usize,
        /// The matched command.
        command: Command,
    },
}

/// Append-only record of every roll and choice, in order. Replaying the
/// choices (with the rolls fed to a scripted random source) reconstructs
/// the game bit for bit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionLog {
    entries: Vec<Decision>,
}

impl DecisionLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, decision: Decision) {
        self.entries.push(decision);
    }

    /// Number of logged decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in order.
    #[must_use]
    pub fn entries(&self) -> &[Decision] {
        &self.entries
    }

    /// The roll values from a suffix of the log, in order.
    #[must_use]
    pub fn rolls_from(&self, from: usize) -> Vec<u32> {
        self.entries[from.min(self.entries.len())..]
            .iter()
            .filter_map(|d| match d {
                Decision::Roll { value, .. } => Some(*value),
                Decision::Choice { .. } => None,
            })
            .collect()
    }

    /// The choice indexes from a suffix of the log, in order.
    #[must_use]
    pub fn choice_indexes_from(&self, from: usize) -> Vec<usize> {
        self.entries[from.min(self.entries.len())..]
            .iter()
            .filter_map(|d| match d {
                Decision::Choice { index, .. } => Some(*index),
                Decision::Roll { .. } => None,
            })
            .collect()
    }
}
