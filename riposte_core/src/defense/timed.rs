//! Timed resolution - a strike against the player's live stance
//!
//! First match wins:
//! 1. dash active → EVADE
//! 2. parry active, step parriable → PERFECT (inside the window) or GOOD
//! 3. parry active, step unparriable → UNPARRIABLE (full damage)
//! 4. otherwise → HIT, unless a rescue hook turns it into GOOD

use super::posture::settle_posture;
use super::{apply_parry_hooks, curve};
use crate::actor::{Monster, Player};
use crate::combat::{ExchangeResult, OutcomeKind, Stance};
use crate::config::BalanceConstants;
use crate::pattern::Strike;
use rand::Rng;

pub fn resolve_timed(
    player: &mut Player,
    monster: &mut Monster,
    strike: &Strike,
    constants: &BalanceConstants,
    rng: &mut impl Rng,
) -> ExchangeResult {
    let stance = if player.is_dashing() {
        Stance::Dash
    } else if player.is_parrying() {
        Stance::Parry
    } else {
        Stance::None
    };

    let kind = match stance {
        Stance::Dash => OutcomeKind::Evade,
        Stance::Parry if !strike.step.unparriable => {
            let elapsed = player.parry_elapsed(&constants.timing);
            if elapsed <= player.perfect_window(&constants.timing) {
                OutcomeKind::Perfect
            } else {
                OutcomeKind::Good
            }
        }
        Stance::Parry => OutcomeKind::Unparriable,
        Stance::None => OutcomeKind::Hit,
    };

    let mut result = ExchangeResult::new(monster.id.clone(), stance, kind);

    if kind == OutcomeKind::Hit && !strike.step.unparriable {
        let ctx = player.parry_context(&constants.progression);
        if player.hooks.rescue(&ctx, rng) {
            result.kind = OutcomeKind::Good;
            result.rescued = true;
        }
    }

    match result.kind {
        OutcomeKind::Evade => {}
        OutcomeKind::Perfect | OutcomeKind::Good => {
            let perfect = result.kind == OutcomeKind::Perfect;
            let (base_gain, posture_damage) = if perfect {
                (
                    constants.defense.perfect_ap_gain,
                    constants.posture.perfect_parry_damage,
                )
            } else {
                (
                    constants.defense.good_ap_gain,
                    constants.posture.good_parry_damage,
                )
            };
            result.is_perfect = perfect;
            result.ap_gained = player.gain_parry_ap(base_gain + player.modifiers.ap_gain_bonus());
            player.combo_count += 1;
            if perfect {
                player.perfect_parry_this_turn = true;
            }
            monster.lose_posture(posture_damage * player.modifiers.posture_damage_mult);
            result.damage_to_monster += apply_parry_hooks(player, monster, constants, rng);
        }
        OutcomeKind::Unparriable | OutcomeKind::Hit => {
            if result.kind == OutcomeKind::Unparriable {
                tracing::warn!(
                    monster = %monster.id,
                    script = %strike.script,
                    step = strike.step_index,
                    "parry against an unparriable strike"
                );
            }
            let damage = curve::hit_damage(
                monster.attack,
                strike.step.damage_mult,
                player.effective_defense(),
                player.modifiers.take_damage_mult,
                constants.defense.defense_constant,
            );
            result.damage_to_player = player.take_damage(damage);
            player.impact_time_remaining = constants.timing.impact_duration;
            player.combo_count = 0;
            player.lose_posture(constants.posture.hit_damage);
        }
        OutcomeKind::Parry | OutcomeKind::Guard => {
            tracing::warn!(kind = ?result.kind, "statistical outcome in timed resolution");
        }
    }

    let breaks = settle_posture(player, monster, &constants.posture);
    result.player_posture_broken = breaks.player_broken;
    result.monster_posture_broken = breaks.monster_broken;
    result.damage_to_player += breaks.damage_to_player;
    result.damage_to_monster += breaks.damage_to_monster;

    result
}
