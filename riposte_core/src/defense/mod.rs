//! Defense resolution - turning a monster strike into an exchange outcome
//!
//! Two interchangeable models share one entry point:
//! - timed: reads the player's live parry/dash timers
//! - statistical: rolls against a parry rate that grows with mastery

mod curve;
mod posture;
mod statistical;
mod timed;

pub use curve::{
    defense_multiplier, hit_damage, mastery_bonus, parry_rate, player_damage, AttackMultipliers,
};
pub use posture::{consume_groggy, settle_posture, PostureBreaks};
pub use statistical::resolve_statistical;
pub use timed::resolve_timed;

use crate::actor::{Monster, Player};
use crate::combat::ExchangeResult;
use crate::config::BalanceConstants;
use crate::pattern::Strike;
use rand::Rng;

/// Which model resolves an exchange
#[derive(Debug, Clone, Copy)]
pub enum ExchangeMode<'a> {
    /// A strike fired by a pattern machine, against the live stance
    Timed { strike: &'a Strike },
    /// The monster's next flat-pattern step, with the player's mastery of it
    Statistical { encounter_count: u32 },
}

/// Resolve one monster strike against the player
pub fn resolve_exchange(
    player: &mut Player,
    monster: &mut Monster,
    mode: ExchangeMode<'_>,
    constants: &BalanceConstants,
    rng: &mut impl Rng,
) -> ExchangeResult {
    let result = match mode {
        ExchangeMode::Timed { strike } => resolve_timed(player, monster, strike, constants, rng),
        ExchangeMode::Statistical { encounter_count } => {
            resolve_statistical(player, monster, encounter_count, constants, rng)
        }
    };
    player.clamp_invariants();
    result
}

/// One rolled player attack, not yet applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerAttack {
    pub damage: f64,
    pub is_crit: bool,
    pub combo_mult: f64,
    pub bonus_mult: f64,
}

/// Roll a player attack against `monster`.
///
/// Conditional bonuses are read from the current state, before the hit lands.
/// Consumes one groggy turn from the target.
pub fn roll_player_attack(
    player: &Player,
    monster: &mut Monster,
    skill_mult: f64,
    constants: &BalanceConstants,
    rng: &mut impl Rng,
) -> PlayerAttack {
    let ctx = player.damage_context(monster.hp_ratio(), monster.is_groggy());
    let bonus = player.hooks.damage_multiplier(&ctx);
    let groggy = consume_groggy(monster, &constants.posture);
    let is_crit = rng.gen::<f64>() < player.effective_crit_rate();
    let mults = AttackMultipliers {
        skill: skill_mult,
        combo: constants.combo_multiplier(player.combo_count),
        groggy,
        crit: if is_crit {
            player.effective_crit_damage()
        } else {
            1.0
        },
        bonus,
    };
    PlayerAttack {
        damage: player_damage(
            player.effective_attack(),
            &mults,
            monster.defense,
            constants.defense.defense_constant,
        ),
        is_crit,
        combo_mult: mults.combo,
        bonus_mult: bonus,
    }
}

/// Run the parry-damage hooks and apply their total to the monster
pub(crate) fn apply_parry_hooks(
    player: &Player,
    monster: &mut Monster,
    constants: &BalanceConstants,
    rng: &mut impl Rng,
) -> f64 {
    if player.hooks.is_empty() {
        return 0.0;
    }
    let ctx = player.parry_context(&constants.progression);
    let extra = player.hooks.parry_damage(&ctx, rng);
    if extra > 0.0 {
        monster.take_damage(extra)
    } else {
        0.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::actor::GrowthScale;
    use crate::combat::OutcomeKind;
    use crate::config::MonsterTemplate;
    use crate::pattern::{AttackScript, AttackStep, Position};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    pub(crate) fn grunt() -> Monster {
        let template = MonsterTemplate {
            id: "grunt".to_string(),
            name: "Grunt".to_string(),
            hp: 300.0,
            attack: 40.0,
            defense: 5.0,
            posture: 50.0,
            complexity: 0.0,
            scripts: vec![AttackScript::new("jab", vec![AttackStep::new(20.0, 1.0, false)])],
            pattern: Vec::new(),
        };
        Monster::from_template(&template, "grunt#0", &GrowthScale::default(), Position::default())
    }

    pub(crate) fn strike(damage_mult: f64, unparriable: bool) -> Strike {
        Strike {
            script: "test".to_string(),
            step_index: 0,
            step: AttackStep::new(20.0, damage_mult, unparriable),
            signaled: unparriable,
        }
    }

    #[test]
    fn test_roll_player_attack_reads_bonus_before_hit() {
        use crate::augment::{AugmentEffect, DamageCondition};
        let constants = BalanceConstants {
            player: crate::config::PlayerConstants {
                crit_rate: 0.0,
                ..Default::default()
            },
            ..BalanceConstants::default()
        };
        let mut player = Player::new(&constants);
        player.hooks.push_effect(&AugmentEffect::ConditionalDamage {
            condition: DamageCondition::TargetHpBelow { ratio: 0.3 },
            bonus: 0.5,
        });
        let mut monster = grunt();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let full = roll_player_attack(&player, &mut monster, 1.0, &constants, &mut rng);
        assert!((full.bonus_mult - 1.0).abs() < f64::EPSILON);

        monster.hp = 90.0;
        let low = roll_player_attack(&player, &mut monster, 1.0, &constants, &mut rng);
        assert!((low.bonus_mult - 1.5).abs() < f64::EPSILON);
        assert!((low.damage - full.damage * 1.5).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_timed_priority(
            stance in 0u8..3,
            unparriable: bool,
            elapsed in 0.0f64..19.0,
            start_ap in 0u32..=10,
            seed: u64,
        ) {
            let constants = BalanceConstants::default();
            let mut player = Player::new(&constants);
            player.action_points = start_ap;
            match stance {
                1 => {
                    player.start_parry(&constants.timing);
                    player.tick_timers(elapsed);
                }
                2 => player.start_dash(&constants.timing),
                _ => {}
            }
            let mut monster = grunt();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let s = strike(1.0, unparriable);
            let r = resolve_exchange(
                &mut player,
                &mut monster,
                ExchangeMode::Timed { strike: &s },
                &constants,
                &mut rng,
            );

            let expected: &[OutcomeKind] = match (stance, unparriable) {
                (2, _) => &[OutcomeKind::Evade],
                (1, false) => &[OutcomeKind::Perfect, OutcomeKind::Good],
                (1, true) => &[OutcomeKind::Unparriable],
                _ => &[OutcomeKind::Hit],
            };
            prop_assert!(expected.contains(&r.kind));
            if matches!(r.kind, OutcomeKind::Perfect | OutcomeKind::Good) {
                prop_assert!(player.action_points > start_ap);
                prop_assert!((player.hp - player.max_hp()).abs() < f64::EPSILON);
            }
            if matches!(r.kind, OutcomeKind::Evade | OutcomeKind::Perfect | OutcomeKind::Good) {
                prop_assert!(r.damage_to_player.abs() < f64::EPSILON);
            } else {
                prop_assert!(r.damage_to_player > 0.0);
            }
            prop_assert!(player.hp >= 0.0 && player.hp <= player.max_hp());
        }

        #[test]
        fn prop_statistical_single_outcome(seed: u64, n in 0u32..20) {
            let constants = BalanceConstants::default();
            let mut player = Player::new(&constants);
            let mut monster = grunt();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let r = resolve_exchange(
                &mut player,
                &mut monster,
                ExchangeMode::Statistical { encounter_count: n },
                &constants,
                &mut rng,
            );
            prop_assert!(matches!(
                r.kind,
                OutcomeKind::Parry | OutcomeKind::Guard | OutcomeKind::Hit
            ));
            prop_assert_eq!(r.kind == OutcomeKind::Parry, player.combo_count == 1);
            prop_assert!(monster.hp >= 0.0);
        }
    }
}
