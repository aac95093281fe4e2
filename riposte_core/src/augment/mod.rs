//! Augments - persistent modifiers picked between encounters
//!
//! Two composition disciplines live side by side:
//! - stat effects mutate the player's [`ModifierAccumulator`] once, at selection
//! - hook effects append closures to the player's [`HookChain`]

mod accumulator;
mod hooks;
mod registry;

pub use accumulator::{AccumulatorStat, ModifierAccumulator};
pub use hooks::{DamageContext, HookChain, ParryContext};
pub use registry::{ModifierRegistry, OFFER_SIZE};

use crate::actor::Player;
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Rarity tier, ordered from most to least common
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[serde(alias = "Common")]
    Common,
    #[serde(alias = "Rare")]
    Rare,
    #[serde(alias = "Epic")]
    Epic,
    #[serde(alias = "Unique")]
    Unique,
}

/// Transient condition a damage bonus is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DamageCondition {
    /// Target at or below this fraction of max hp
    TargetHpBelow { ratio: f64 },
    FirstActionThisTurn,
    ApInRange { min: u32, max: u32 },
    PerfectParryThisTurn,
    KillsThisTurn { at_least: u32 },
    TargetGroggy,
    ComboAtLeast { count: u32 },
}

/// One effect carried by an augment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AugmentEffect {
    /// Fold `value` into an accumulator field at selection time
    Stat { stat: AccumulatorStat, value: f64 },
    /// Chance to turn a failed parry into a success
    RescueParry { chance: f64 },
    /// Chance to deal `attack_ratio × attack` extra damage on a parry
    ParryDamage { chance: f64, attack_ratio: f64 },
    /// `bonus` added to the damage multiplier while `condition` holds
    ConditionalDamage { condition: DamageCondition, bonus: f64 },
}

impl AugmentEffect {
    fn validate(&self, id: &str) -> Result<(), ConfigError> {
        let invalid = |msg: &str| {
            Err(ConfigError::ValidationError(format!(
                "augment '{}': {}",
                id, msg
            )))
        };
        match *self {
            AugmentEffect::Stat { stat, value } => {
                if !value.is_finite() {
                    return invalid("stat value must be finite");
                }
                if stat.is_multiplicative() && value <= 0.0 {
                    return invalid("multiplicative stat value must be positive");
                }
            }
            AugmentEffect::RescueParry { chance } | AugmentEffect::ParryDamage { chance, .. } => {
                if !(0.0..=1.0).contains(&chance) {
                    return invalid("chance must be within [0, 1]");
                }
            }
            AugmentEffect::ConditionalDamage { condition, bonus } => {
                if !bonus.is_finite() {
                    return invalid("bonus must be finite");
                }
                if let DamageCondition::ApInRange { min, max } = condition {
                    if min > max {
                        return invalid("ap range min exceeds max");
                    }
                }
            }
        }
        Ok(())
    }
}

/// Static augment definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rarity: Rarity,
    pub effects: Vec<AugmentEffect>,
}

impl AugmentDef {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::ValidationError(
                "augment with empty id".to_string(),
            ));
        }
        if self.effects.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "augment '{}' has no effects",
                self.id
            )));
        }
        for effect in &self.effects {
            effect.validate(&self.id)?;
        }
        Ok(())
    }

    /// Apply every effect to the player and record the augment as active
    pub fn apply_to(&self, player: &mut Player) {
        for effect in &self.effects {
            if let AugmentEffect::Stat { stat, value } = *effect {
                player.modifiers.apply(stat, value);
                if stat == AccumulatorStat::MaxHpAdd && value > 0.0 {
                    player.heal(value);
                }
            } else {
                player.hooks.push_effect(effect);
            }
        }
        player.augments.push(self.id.clone());
        tracing::info!(augment = %self.id, total = player.augments.len(), "augment selected");
    }
}
