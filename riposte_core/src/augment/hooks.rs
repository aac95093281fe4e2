//! HookChain - ordered augment hooks consulted during resolution
//!
//! Hooks run front-to-back in selection order. Newly selected augments are
//! appended and never replace earlier ones. Combination rules:
//! - rescue hooks: logical OR (the first rescue wins, later hooks are skipped)
//! - parry damage hooks: sum
//! - conditional damage bonuses: sum, applied as `1 + Σ bonus`

use super::{AugmentEffect, DamageCondition};
use rand::{Rng, RngCore};
use std::fmt;
use std::sync::Arc;

/// Inputs visible to rescue and parry-damage hooks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParryContext {
    /// Player attack after modifiers
    pub attack: f64,
    /// Luck-derived bonus added to chance-based hooks
    pub trigger_bonus: f64,
}

/// Transient state read when player damage is computed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageContext {
    /// Target hp / max hp before the hit
    pub target_hp_ratio: f64,
    pub first_action_this_turn: bool,
    pub action_points: u32,
    pub perfect_parry_this_turn: bool,
    pub kills_this_turn: u32,
    pub target_groggy: bool,
    pub combo_count: u32,
}

pub type RescueHook = dyn Fn(&ParryContext, &mut dyn RngCore) -> bool + Send + Sync;
pub type ParryDamageHook = dyn Fn(&ParryContext, &mut dyn RngCore) -> f64 + Send + Sync;
pub type DamageBonusHook = dyn Fn(&DamageContext) -> f64 + Send + Sync;

#[derive(Clone, Default)]
pub struct HookChain {
    rescue: Vec<Arc<RescueHook>>,
    parry_damage: Vec<Arc<ParryDamageHook>>,
    damage_bonus: Vec<Arc<DamageBonusHook>>,
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain")
            .field("rescue", &self.rescue.len())
            .field("parry_damage", &self.parry_damage.len())
            .field("damage_bonus", &self.damage_bonus.len())
            .finish()
    }
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rescue<F>(&mut self, hook: F)
    where
        F: Fn(&ParryContext, &mut dyn RngCore) -> bool + Send + Sync + 'static,
    {
        self.rescue.push(Arc::new(hook));
    }

    pub fn push_parry_damage<F>(&mut self, hook: F)
    where
        F: Fn(&ParryContext, &mut dyn RngCore) -> f64 + Send + Sync + 'static,
    {
        self.parry_damage.push(Arc::new(hook));
    }

    pub fn push_damage_bonus<F>(&mut self, hook: F)
    where
        F: Fn(&DamageContext) -> f64 + Send + Sync + 'static,
    {
        self.damage_bonus.push(Arc::new(hook));
    }

    /// Append the hook for a data-driven effect.
    /// Returns false for effects that are not hooks (stat mutations).
    pub fn push_effect(&mut self, effect: &AugmentEffect) -> bool {
        match *effect {
            AugmentEffect::Stat { .. } => false,
            AugmentEffect::RescueParry { chance } => {
                self.push_rescue(move |ctx, rng| rng.gen::<f64>() < chance + ctx.trigger_bonus);
                true
            }
            AugmentEffect::ParryDamage {
                chance,
                attack_ratio,
            } => {
                self.push_parry_damage(move |ctx, rng| {
                    if rng.gen::<f64>() < chance + ctx.trigger_bonus {
                        ctx.attack * attack_ratio
                    } else {
                        0.0
                    }
                });
                true
            }
            AugmentEffect::ConditionalDamage { condition, bonus } => {
                self.push_damage_bonus(move |ctx| {
                    if condition.holds(ctx) {
                        bonus
                    } else {
                        0.0
                    }
                });
                true
            }
        }
    }

    /// Whether a failed parry is turned into a success
    pub fn rescue(&self, ctx: &ParryContext, rng: &mut dyn RngCore) -> bool {
        self.rescue.iter().any(|hook| hook(ctx, &mut *rng))
    }

    /// Extra damage dealt to the attacker on a successful parry
    pub fn parry_damage(&self, ctx: &ParryContext, rng: &mut dyn RngCore) -> f64 {
        self.parry_damage.iter().map(|hook| hook(ctx, &mut *rng)).sum()
    }

    /// Multiplier from every conditional bonus that holds right now
    pub fn damage_multiplier(&self, ctx: &DamageContext) -> f64 {
        1.0 + self.damage_bonus.iter().map(|hook| hook(ctx)).sum::<f64>()
    }

    pub fn len(&self) -> usize {
        self.rescue.len() + self.parry_damage.len() + self.damage_bonus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DamageCondition {
    pub fn holds(&self, ctx: &DamageContext) -> bool {
        match *self {
            DamageCondition::TargetHpBelow { ratio } => ctx.target_hp_ratio <= ratio,
            DamageCondition::FirstActionThisTurn => ctx.first_action_this_turn,
            DamageCondition::ApInRange { min, max } => {
                ctx.action_points >= min && ctx.action_points <= max
            }
            DamageCondition::PerfectParryThisTurn => ctx.perfect_parry_this_turn,
            DamageCondition::KillsThisTurn { at_least } => ctx.kills_this_turn >= at_least,
            DamageCondition::TargetGroggy => ctx.target_groggy,
            DamageCondition::ComboAtLeast { count } => ctx.combo_count >= count,
        }
    }
}
