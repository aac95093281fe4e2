//! Posture breaks and the groggy state

use crate::actor::{Monster, Player};
use crate::config::PostureConstants;

/// Breaks that happened while settling one resolution
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PostureBreaks {
    pub player_broken: bool,
    pub monster_broken: bool,
    pub damage_to_player: f64,
    pub damage_to_monster: f64,
}

/// Resolve posture at the end of a resolution.
///
/// Each side breaks at most once here: it takes the break penalty and its
/// posture is restored to max. A broken monster also turns groggy.
pub fn settle_posture(
    player: &mut Player,
    monster: &mut Monster,
    posture: &PostureConstants,
) -> PostureBreaks {
    let mut breaks = PostureBreaks::default();

    if player.posture <= 0.0 {
        breaks.player_broken = true;
        breaks.damage_to_player = player.take_damage(posture.player_break_penalty);
        player.restore_posture();
        tracing::debug!(penalty = breaks.damage_to_player, "player posture broken");
    }

    if monster.posture <= 0.0 {
        breaks.monster_broken = true;
        breaks.damage_to_monster = monster.take_damage(posture.monster_break_damage);
        monster.posture = monster.max_posture;
        monster.groggy_turns_remaining = posture.groggy_duration;
        tracing::debug!(monster = %monster.id, turns = posture.groggy_duration, "monster staggered");
    }

    breaks
}

/// Groggy multiplier for one attack on `monster`, consuming a groggy turn
pub fn consume_groggy(monster: &mut Monster, posture: &PostureConstants) -> f64 {
    if monster.is_groggy() {
        monster.tick_groggy();
        posture.groggy_damage_mult
    } else {
        1.0
    }
}
