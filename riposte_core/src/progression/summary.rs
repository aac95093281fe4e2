//! Per-run statistics for the analytics collaborator

use crate::combat::{CombatEvent, OutcomeKind};
use serde::{Deserialize, Serialize};

/// Running counters, updated from the event stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub exchanges: u32,
    pub parries: u32,
    pub perfect_parries: u32,
    pub guards: u32,
    pub hits: u32,
    pub evades: u32,
    pub rescues: u32,
    pub crits: u32,
    pub player_posture_breaks: u32,
    pub monster_posture_breaks: u32,
    pub skills_used: u32,
    pub monsters_defeated: u32,
    pub damage_dealt: f64,
    pub damage_taken: f64,
    /// Monster that landed the killing strike
    pub killed_by: Option<String>,
}

impl RunStats {
    pub fn observe(&mut self, event: &CombatEvent) {
        match event {
            CombatEvent::Exchange(r) => {
                self.exchanges += 1;
                match r.kind {
                    OutcomeKind::Perfect => {
                        self.parries += 1;
                        self.perfect_parries += 1;
                    }
                    OutcomeKind::Good | OutcomeKind::Parry => self.parries += 1,
                    OutcomeKind::Guard => self.guards += 1,
                    OutcomeKind::Hit | OutcomeKind::Unparriable => self.hits += 1,
                    OutcomeKind::Evade => self.evades += 1,
                }
                if r.rescued {
                    self.rescues += 1;
                }
                if r.is_crit {
                    self.crits += 1;
                }
                if r.player_posture_broken {
                    self.player_posture_breaks += 1;
                }
                if r.monster_posture_broken {
                    self.monster_posture_breaks += 1;
                }
                self.damage_dealt += r.damage_to_monster;
                self.damage_taken += r.damage_to_player;
                if r.damage_to_player > 0.0 {
                    self.killed_by = Some(r.monster_id.clone());
                }
            }
            CombatEvent::Action(a) => {
                self.skills_used += 1;
                self.crits += a.hits.iter().filter(|h| h.is_crit).count() as u32;
                self.damage_dealt += a.total_damage();
            }
            CombatEvent::MonsterDefeated { .. } => self.monsters_defeated += 1,
            CombatEvent::TurnStarted { .. } | CombatEvent::Victory | CombatEvent::Defeat => {}
        }
    }

    /// Share of exchanges deflected by a parry
    pub fn parry_ratio(&self) -> f64 {
        if self.exchanges == 0 {
            return 0.0;
        }
        self.parries as f64 / self.exchanges as f64
    }
}

/// One line of batch output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub stage: u32,
    pub sector: u32,
    pub rounds_cleared: u32,
    pub game_over: bool,
    /// Template id of the monster that ended the run
    pub cause_of_death: Option<String>,
    pub final_hp: f64,
    pub augments: Vec<String>,
    pub parry_ratio: f64,
    pub stats: RunStats,
}
