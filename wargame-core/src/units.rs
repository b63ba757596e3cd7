//! Unit types, players, and the combat tables

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum (and starting) health for every unit type.
pub const MAX_HEALTH: u8 = 9;

/// The two players. By convention the Attacker maximizes the heuristic
/// score and the Defender minimizes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    Attacker,
    Defender,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Attacker => Player::Defender,
            Player::Defender => Player::Attacker,
        }
    }
}

/// Every unit type. The AI is the king analogue: losing it loses the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    Ai = 0,
    Tech = 1,
    Virus = 2,
    Program = 3,
    Firewall = 4,
}

pub const UNIT_TYPE_COUNT: usize = 5;

/// Damage dealt by row-type attacking column-type (AI, Tech, Virus,
/// Program, Firewall order).
const DAMAGE_TABLE: [[u8; UNIT_TYPE_COUNT]; UNIT_TYPE_COUNT] = [
    [3, 3, 3, 3, 1], // AI
    [1, 1, 6, 1, 1], // Tech
    [9, 6, 1, 6, 1], // Virus
    [3, 3, 3, 3, 1], // Program
    [1, 1, 1, 1, 1], // Firewall
];

/// Health restored by row-type repairing column-type. Zero means the pair
/// cannot repair at all.
const REPAIR_TABLE: [[u8; UNIT_TYPE_COUNT]; UNIT_TYPE_COUNT] = [
    [0, 1, 1, 0, 0], // AI
    [3, 0, 0, 3, 3], // Tech
    [0, 0, 0, 0, 0], // Virus
    [0, 0, 0, 0, 0], // Program
    [0, 0, 0, 0, 0], // Firewall
];

/// A unit on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub player: Player,
    pub unit_type: UnitType,
    pub health: u8,
}

impl Unit {
    pub const fn new(player: Player, unit_type: UnitType) -> Self {
        Self {
            player,
            unit_type,
            health: MAX_HEALTH,
        }
    }

    /// Health is clamped to 0..=MAX_HEALTH so the bound holds regardless
    /// of the caller.
    pub const fn with_health(player: Player, unit_type: UnitType, health: u8) -> Self {
        Self {
            player,
            unit_type,
            health: if health > MAX_HEALTH { MAX_HEALTH } else { health },
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Apply a health delta, clamped to 0..=MAX_HEALTH.
    pub fn mod_health(&mut self, delta: i8) {
        let new = self.health as i8 + delta;
        self.health = new.clamp(0, MAX_HEALTH as i8) as u8;
    }

    /// Damage this unit would inflict on `target`, clamped to the target's
    /// remaining health.
    pub fn damage_against(&self, target: &Unit) -> u8 {
        let amount = DAMAGE_TABLE[self.unit_type as usize][target.unit_type as usize];
        amount.min(target.health)
    }

    /// Health this unit would restore on `target`, clamped to the target's
    /// missing health.
    pub fn repair_on(&self, target: &Unit) -> u8 {
        let amount = REPAIR_TABLE[self.unit_type as usize][target.unit_type as usize];
        amount.min(MAX_HEALTH - target.health)
    }

    /// Can this unit repair that target type at all?
    pub fn can_repair(&self, target_type: UnitType) -> bool {
        REPAIR_TABLE[self.unit_type as usize][target_type as usize] > 0
    }
}

impl fmt::Display for Unit {
    /// Compact text form, e.g. "aV9" for an attacker Virus at full health.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = match self.player {
            Player::Attacker => 'a',
            Player::Defender => 'd',
        };
        let t = match self.unit_type {
            UnitType::Ai => 'A',
            UnitType::Tech => 'T',
            UnitType::Virus => 'V',
            UnitType::Program => 'P',
            UnitType::Firewall => 'F',
        };
        write!(f, "{}{}{}", p, t, self.health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_clamped_to_health() {
        let virus = Unit::new(Player::Attacker, UnitType::Virus);
        let weak_ai = Unit::with_health(Player::Defender, UnitType::Ai, 4);
        // Table says 9, but the AI only has 4 health left
        assert_eq!(virus.damage_against(&weak_ai), 4);

        let full_ai = Unit::new(Player::Defender, UnitType::Ai);
        assert_eq!(virus.damage_against(&full_ai), 9);
    }

    #[test]
    fn test_repair_clamped_to_max() {
        let tech = Unit::new(Player::Defender, UnitType::Tech);
        let program = Unit::with_health(Player::Defender, UnitType::Program, 8);
        // Table says 3, but only 1 point of health is missing
        assert_eq!(tech.repair_on(&program), 1);

        let hurt = Unit::with_health(Player::Defender, UnitType::Program, 2);
        assert_eq!(tech.repair_on(&hurt), 3);
    }

    #[test]
    fn test_repair_pairs() {
        let ai = Unit::new(Player::Attacker, UnitType::Ai);
        assert!(ai.can_repair(UnitType::Tech));
        assert!(ai.can_repair(UnitType::Virus));
        assert!(!ai.can_repair(UnitType::Program));

        let tech = Unit::new(Player::Attacker, UnitType::Tech);
        assert!(tech.can_repair(UnitType::Ai));
        assert!(tech.can_repair(UnitType::Firewall));
        assert!(!tech.can_repair(UnitType::Virus));

        let virus = Unit::new(Player::Attacker, UnitType::Virus);
        assert!(!virus.can_repair(UnitType::Ai));
    }

    #[test]
    fn test_with_health_clamps_to_max() {
        let unit = Unit::with_health(Player::Attacker, UnitType::Tech, 42);
        assert_eq!(unit.health, MAX_HEALTH);
        let unit = Unit::with_health(Player::Attacker, UnitType::Tech, 9);
        assert_eq!(unit.health, 9);
    }

    #[test]
    fn test_mod_health_clamps() {
        let mut unit = Unit::new(Player::Attacker, UnitType::Program);
        unit.mod_health(5);
        assert_eq!(unit.health, MAX_HEALTH);
        unit.mod_health(-12);
        assert_eq!(unit.health, 0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn test_display() {
        let unit = Unit::new(Player::Attacker, UnitType::Virus);
        assert_eq!(unit.to_string(), "aV9");
        let unit = Unit::with_health(Player::Defender, UnitType::Ai, 3);
        assert_eq!(unit.to_string(), "dA3");
    }
}
