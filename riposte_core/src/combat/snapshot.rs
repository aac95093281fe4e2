//! Read-only views of combat state for drivers and renderers

use crate::actor::{Monster, Player};
use crate::pattern::{AttackPhase, Position, ThreatSignal};
use serde::{Deserialize, Serialize};

use super::{EncounterOutcome, TurnPhase};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub hp: f64,
    pub max_hp: f64,
    pub action_points: u32,
    pub max_action_points: u32,
    pub posture: f64,
    pub max_posture: f64,
    pub combo_count: u32,
    pub parrying: bool,
    pub dashing: bool,
    pub impact_time_remaining: f64,
    pub augments: Vec<String>,
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        PlayerSnapshot {
            hp: player.hp,
            max_hp: player.max_hp(),
            action_points: player.action_points,
            max_action_points: player.max_action_points,
            posture: player.posture,
            max_posture: player.max_posture,
            combo_count: player.combo_count,
            parrying: player.is_parrying(),
            dashing: player.is_dashing(),
            impact_time_remaining: player.impact_time_remaining,
            augments: player.augments.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterSnapshot {
    pub id: String,
    pub name: String,
    pub hp: f64,
    pub max_hp: f64,
    pub posture: f64,
    pub max_posture: f64,
    pub groggy_turns_remaining: u32,
    pub is_boss: bool,
    pub position: Position,
    pub phase: AttackPhase,
    pub threat: ThreatSignal,
}

impl From<&Monster> for MonsterSnapshot {
    fn from(monster: &Monster) -> Self {
        MonsterSnapshot {
            id: monster.id.clone(),
            name: monster.name.clone(),
            hp: monster.hp,
            max_hp: monster.max_hp,
            posture: monster.posture,
            max_posture: monster.max_posture,
            groggy_turns_remaining: monster.groggy_turns_remaining,
            is_boss: monster.is_boss,
            position: monster.machine.position(),
            phase: monster.machine.phase(),
            threat: monster.machine.threat(),
        }
    }
}

/// State of one encounter at a single tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    pub turn: u32,
    pub phase: TurnPhase,
    pub outcome: EncounterOutcome,
    /// Index of the monster whose pattern is running, during the monster turn
    pub active_monster: Option<usize>,
    pub player: PlayerSnapshot,
    /// Living monsters only
    pub monsters: Vec<MonsterSnapshot>,
}
