//! Damage and parry-rate curves

use crate::config::StatisticalConstants;

/// Fraction of damage that gets through `defense`.
///
/// `K / (K + defense)`: 1 at zero defense, 0.5 when defense equals K, never 0.
pub fn defense_multiplier(defense: f64, defense_constant: f64) -> f64 {
    let defense = defense.max(0.0);
    defense_constant / (defense_constant + defense)
}

/// Damage a monster strike deals to the player, rounded to a whole number
pub fn hit_damage(
    attack: f64,
    step_mult: f64,
    defense: f64,
    take_damage_mult: f64,
    defense_constant: f64,
) -> f64 {
    let raw = attack * step_mult * defense_multiplier(defense, defense_constant) * take_damage_mult;
    raw.round().max(0.0)
}

/// Multipliers applied to one player attack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackMultipliers {
    pub skill: f64,
    pub combo: f64,
    pub groggy: f64,
    /// Crit damage multiplier, or 1 for a normal hit
    pub crit: f64,
    /// `1 + Σ` conditional augment bonuses
    pub bonus: f64,
}

impl Default for AttackMultipliers {
    fn default() -> Self {
        AttackMultipliers {
            skill: 1.0,
            combo: 1.0,
            groggy: 1.0,
            crit: 1.0,
            bonus: 1.0,
        }
    }
}

impl AttackMultipliers {
    pub fn product(&self) -> f64 {
        self.skill * self.combo * self.groggy * self.crit * self.bonus
    }
}

/// Damage a player attack deals to a monster
pub fn player_damage(
    attack: f64,
    mults: &AttackMultipliers,
    monster_defense: f64,
    defense_constant: f64,
) -> f64 {
    (attack * mults.product() * defense_multiplier(monster_defense, defense_constant)).max(0.0)
}

/// Parry rate gained from `encounters` cleared against the same template
pub fn mastery_bonus(encounters: u32, stat: &StatisticalConstants) -> f64 {
    (stat.max_rate - stat.base_rate) * (1.0 - (-stat.mastery_speed * encounters as f64).exp())
}

/// Statistical parry probability
///
/// `clamp(base + mastery(n) - complexity × penalty, min, max)`
pub fn parry_rate(encounters: u32, complexity: f64, stat: &StatisticalConstants) -> f64 {
    let rate = stat.base_rate + mastery_bonus(encounters, stat) - complexity * stat.penalty_factor;
    rate.clamp(stat.min_rate, stat.max_rate)
}
