//! Statistical resolution - a probabilistic stand-in for live input
//!
//! Used for batch simulation. One exchange is the monster's next flat-pattern
//! step followed by the player's normal attack.

use super::posture::settle_posture;
use super::{apply_parry_hooks, curve, roll_player_attack};
use crate::actor::{Monster, Player};
use crate::combat::{ExchangeResult, OutcomeKind, Stance};
use crate::config::BalanceConstants;
use rand::Rng;

pub fn resolve_statistical(
    player: &mut Player,
    monster: &mut Monster,
    encounter_count: u32,
    constants: &BalanceConstants,
    rng: &mut impl Rng,
) -> ExchangeResult {
    let stat = &constants.statistical;
    let step = monster.next_flat_step();
    let rate = curve::parry_rate(encounter_count, monster.complexity, stat);

    let roll: f64 = rng.gen();
    let kind = if roll < rate {
        OutcomeKind::Parry
    } else if roll < rate + stat.guard_band {
        OutcomeKind::Guard
    } else {
        OutcomeKind::Hit
    };

    let mut result = ExchangeResult::new(monster.id.clone(), Stance::None, kind);

    if kind != OutcomeKind::Parry {
        let ctx = player.parry_context(&constants.progression);
        if player.hooks.rescue(&ctx, rng) {
            result.kind = OutcomeKind::Parry;
            result.rescued = true;
        }
    }

    let incoming = curve::hit_damage(
        monster.attack,
        step.damage_mult,
        player.effective_defense(),
        player.modifiers.take_damage_mult,
        constants.defense.defense_constant,
    );

    match result.kind {
        OutcomeKind::Parry => {
            player.combo_count += 1;
            monster.lose_posture(constants.posture.parry_damage * player.modifiers.posture_damage_mult);
            let counter = curve::player_damage(
                player.effective_attack(),
                &curve::AttackMultipliers::default(),
                monster.defense,
                constants.defense.defense_constant,
            ) * player.effective_counter_damage();
            result.damage_to_monster += monster.take_damage(counter);
            result.damage_to_monster += apply_parry_hooks(player, monster, constants, rng);
        }
        OutcomeKind::Guard => {
            player.combo_count = 0;
            let damage = (incoming * (1.0 - stat.guard_reduction)).round();
            result.damage_to_player = player.take_damage(damage);
            player.lose_posture(constants.posture.guard_damage);
        }
        _ => {
            player.combo_count = 0;
            result.damage_to_player = player.take_damage(incoming);
            player.lose_posture(constants.posture.hit_damage);
        }
    }

    if monster.is_alive() && player.is_alive() {
        let attack = roll_player_attack(player, monster, 1.0, constants, rng);
        result.is_crit = attack.is_crit;
        result.combo_mult = attack.combo_mult;
        result.damage_to_monster += monster.take_damage(attack.damage);
    }

    let breaks = settle_posture(player, monster, &constants.posture);
    result.player_posture_broken = breaks.player_broken;
    result.monster_posture_broken = breaks.monster_broken;
    result.damage_to_player += breaks.damage_to_player;
    result.damage_to_monster += breaks.damage_to_monster;

    tracing::debug!(rate, roll, summary = %result.summary(), "statistical exchange");
    result
}
