//! ModifierAccumulator - running totals of accepted stat augments
//!
//! One field per named effect. Multiplicative fields start at 1 and keep a
//! running product, additive fields start at 0 and keep a running sum. Augments
//! mutate this once when selected; combat code re-reads it on every exchange.

use serde::{Deserialize, Serialize};

/// Accumulated stat modifiers held by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierAccumulator {
    // === Multiplicative (running product) ===
    pub attack_mult: f64,
    /// Scales every hit the player takes
    pub take_damage_mult: f64,
    pub counter_damage_mult: f64,
    /// Scales posture damage dealt to monsters
    pub posture_damage_mult: f64,

    // === Additive (running sum) ===
    pub defense_add: f64,
    pub luck_add: f64,
    pub crit_rate_add: f64,
    pub crit_damage_add: f64,
    pub max_hp_add: f64,
    /// Extra AP on every successful parry
    pub ap_gain_add: f64,
    /// Extra ticks added to the perfect-parry window
    pub perfect_window_add: f64,
}

impl Default for ModifierAccumulator {
    fn default() -> Self {
        ModifierAccumulator {
            attack_mult: 1.0,
            take_damage_mult: 1.0,
            counter_damage_mult: 1.0,
            posture_damage_mult: 1.0,
            defense_add: 0.0,
            luck_add: 0.0,
            crit_rate_add: 0.0,
            crit_damage_add: 0.0,
            max_hp_add: 0.0,
            ap_gain_add: 0.0,
            perfect_window_add: 0.0,
        }
    }
}

/// A named accumulator field an augment can change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulatorStat {
    AttackMult,
    TakeDamageMult,
    CounterDamageMult,
    PostureDamageMult,
    DefenseAdd,
    LuckAdd,
    CritRateAdd,
    CritDamageAdd,
    MaxHpAdd,
    ApGainAdd,
    PerfectWindowAdd,
}

impl AccumulatorStat {
    pub fn is_multiplicative(self) -> bool {
        matches!(
            self,
            AccumulatorStat::AttackMult
                | AccumulatorStat::TakeDamageMult
                | AccumulatorStat::CounterDamageMult
                | AccumulatorStat::PostureDamageMult
        )
    }
}

impl ModifierAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one augment value into the matching field
    pub fn apply(&mut self, stat: AccumulatorStat, value: f64) {
        match stat {
            AccumulatorStat::AttackMult => self.attack_mult *= value,
            AccumulatorStat::TakeDamageMult => self.take_damage_mult *= value,
            AccumulatorStat::CounterDamageMult => self.counter_damage_mult *= value,
            AccumulatorStat::PostureDamageMult => self.posture_damage_mult *= value,
            AccumulatorStat::DefenseAdd => self.defense_add += value,
            AccumulatorStat::LuckAdd => self.luck_add += value,
            AccumulatorStat::CritRateAdd => self.crit_rate_add += value,
            AccumulatorStat::CritDamageAdd => self.crit_damage_add += value,
            AccumulatorStat::MaxHpAdd => self.max_hp_add += value,
            AccumulatorStat::ApGainAdd => self.ap_gain_add += value,
            AccumulatorStat::PerfectWindowAdd => self.perfect_window_add += value,
        }
    }

    /// Current value of a field
    pub fn get(&self, stat: AccumulatorStat) -> f64 {
        match stat {
            AccumulatorStat::AttackMult => self.attack_mult,
            AccumulatorStat::TakeDamageMult => self.take_damage_mult,
            AccumulatorStat::CounterDamageMult => self.counter_damage_mult,
            AccumulatorStat::PostureDamageMult => self.posture_damage_mult,
            AccumulatorStat::DefenseAdd => self.defense_add,
            AccumulatorStat::LuckAdd => self.luck_add,
            AccumulatorStat::CritRateAdd => self.crit_rate_add,
            AccumulatorStat::CritDamageAdd => self.crit_damage_add,
            AccumulatorStat::MaxHpAdd => self.max_hp_add,
            AccumulatorStat::ApGainAdd => self.ap_gain_add,
            AccumulatorStat::PerfectWindowAdd => self.perfect_window_add,
        }
    }

    /// Whole AP granted on top of a parry's base gain
    pub fn ap_gain_bonus(&self) -> u32 {
        self.ap_gain_add.max(0.0).floor() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_identity() {
        let acc = ModifierAccumulator::new();
        assert!((acc.attack_mult - 1.0).abs() < f64::EPSILON);
        assert!(acc.defense_add.abs() < f64::EPSILON);
        assert_eq!(acc.ap_gain_bonus(), 0);
    }

    #[test]
    fn test_multiplicative_stacks_as_product() {
        let mut acc = ModifierAccumulator::new();
        acc.apply(AccumulatorStat::AttackMult, 1.1);
        acc.apply(AccumulatorStat::AttackMult, 1.1);
        assert!((acc.attack_mult - 1.21).abs() < 1e-12);
    }

    #[test]
    fn test_additive_stacks_as_sum() {
        let mut acc = ModifierAccumulator::new();
        acc.apply(AccumulatorStat::LuckAdd, 10.0);
        acc.apply(AccumulatorStat::LuckAdd, 10.0);
        assert!((acc.get(AccumulatorStat::LuckAdd) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_kind_partition() {
        assert!(AccumulatorStat::TakeDamageMult.is_multiplicative());
        assert!(!AccumulatorStat::CritRateAdd.is_multiplicative());
    }
}
