//! CombatEngine - alternating monster and player turns for one encounter
//!
//! During the monster turn exactly one pattern machine is stepped per tick, in
//! array order. Strikes are resolved in the same tick they fire, before the
//! player's stance timers decay and after the impact timer does. The encounter ends exactly once, with a
//! victory or a defeat; every later command is rejected.

use super::result::{ActionResult, CombatEvent, ExchangeResult, SkillHit, SkillKind};
use super::snapshot::{CombatSnapshot, MonsterSnapshot, PlayerSnapshot};
use crate::actor::{Monster, Player};
use crate::config::{BalanceConstants, SkillCost, TimingConstants};
use crate::defense::{resolve_exchange, roll_player_attack, ExchangeMode};
use crate::pattern::Position;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    MonsterTurn,
    PlayerTurn,
}

/// How monster strikes are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Pattern machines and live parry/dash input
    #[default]
    Timed,
    /// Probabilistic exchanges driven by `auto_exchange`
    Statistical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterOutcome {
    #[default]
    Ongoing,
    Victory,
    Defeat,
}

/// Why a command was refused. Returned as a value, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Rejection {
    #[error("the encounter is already over")]
    EncounterOver,
    #[error("it is not the player's turn")]
    NotPlayerTurn,
    #[error("stances can only be taken during the monster turn")]
    NotMonsterTurn,
    #[error("not enough action points: need {needed}, have {available}")]
    InsufficientAp { needed: u32, available: u32 },
    #[error("no living monster at index {0}")]
    InvalidTarget(usize),
    #[error("command requires the {0:?} resolution mode")]
    WrongMode(ResolutionMode),
    #[error("no augment offer is pending")]
    NoOfferPending,
    #[error("augment '{0}' is not part of the current offer")]
    NotOffered(String),
    #[error("an augment must be chosen first")]
    AwaitingAugment,
    #[error("the run is over, reset to play again")]
    GameOver,
}

/// Turn engine for a single encounter
#[derive(Debug, Clone)]
pub struct CombatEngine {
    constants: Arc<BalanceConstants>,
    mode: ResolutionMode,
    monsters: Vec<Monster>,
    phase: TurnPhase,
    outcome: EncounterOutcome,
    /// Monster whose pattern runs this tick
    active_monster: Option<usize>,
    /// Next monster to strike in statistical mode
    statistical_cursor: usize,
    turn: u32,
    exchanges: u32,
    log: VecDeque<ExchangeResult>,
}

/// Where the monster in `slot` stands, with the player at the origin
pub fn slot_position(slot: usize, timing: &TimingConstants) -> Position {
    Position::new(
        timing.monster_origin_x + slot as f64 * timing.monster_spacing,
        0.0,
    )
}

impl CombatEngine {
    /// Start an encounter. The monsters open with their turn.
    pub fn new(
        constants: Arc<BalanceConstants>,
        mode: ResolutionMode,
        monsters: Vec<Monster>,
        player: &mut Player,
    ) -> Self {
        let mut engine = CombatEngine {
            log: VecDeque::with_capacity(constants.progression.log_capacity),
            constants,
            mode,
            monsters,
            phase: TurnPhase::MonsterTurn,
            outcome: EncounterOutcome::Ongoing,
            active_monster: None,
            statistical_cursor: 0,
            turn: 0,
            exchanges: 0,
        };
        engine.monsters.retain(|m| m.is_alive());
        if engine.monsters.is_empty() {
            tracing::warn!("encounter started with no living monsters");
            engine.outcome = EncounterOutcome::Victory;
        } else {
            engine.begin_monster_turn(player);
        }
        engine
    }

    // === Accessors ===

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn outcome(&self) -> EncounterOutcome {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome != EncounterOutcome::Ongoing
    }

    /// Living monsters, in acting order
    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    pub fn active_monster(&self) -> Option<usize> {
        self.active_monster
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Exchanges resolved so far in this encounter
    pub fn exchanges(&self) -> u32 {
        self.exchanges
    }

    /// Most recent exchanges, oldest first
    pub fn log(&self) -> impl Iterator<Item = &ExchangeResult> {
        self.log.iter()
    }

    pub fn snapshot(&self, player: &Player) -> CombatSnapshot {
        CombatSnapshot {
            turn: self.turn,
            phase: self.phase,
            outcome: self.outcome,
            active_monster: self.active_monster,
            player: PlayerSnapshot::from(player),
            monsters: self.monsters.iter().map(MonsterSnapshot::from).collect(),
        }
    }

    // === Time ===

    /// Advance the encounter by `dt` ticks
    pub fn tick(&mut self, player: &mut Player, dt: f64, rng: &mut impl Rng) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        if self.is_over() {
            return events;
        }
        if self.phase == TurnPhase::PlayerTurn || self.mode == ResolutionMode::Statistical {
            player.tick_timers(dt);
            return events;
        }

        let Some(index) = self.active_monster.filter(|i| *i < self.monsters.len()) else {
            player.tick_timers(dt);
            self.begin_player_turn(player, &mut events);
            return events;
        };

        // Impact decays before resolution so a fresh hit shows for the full duration
        player.tick_impact(dt);
        let target = Position::default();
        let timing = &self.constants.timing;
        let monster = &mut self.monsters[index];
        let signal = monster
            .machine
            .tick(dt, &monster.scripts, target, timing, rng);

        if let Some(strike) = signal.strike.as_ref() {
            let result = resolve_exchange(
                player,
                monster,
                ExchangeMode::Timed { strike },
                &self.constants,
                rng,
            );
            tracing::debug!(summary = %result.summary(), "strike resolved");
            self.record(result, &mut events);

            if !player.is_alive() {
                self.finish(EncounterOutcome::Defeat, &mut events);
                return events;
            }
            if !self.monsters[index].is_alive() {
                let dead = self.monsters.remove(index);
                events.push(CombatEvent::MonsterDefeated {
                    monster_id: dead.id,
                });
                if self.check_victory(&mut events) {
                    return events;
                }
                player.tick_stances(dt);
                self.start_monster_at(index, player, &mut events);
                return events;
            }
        }

        player.tick_stances(dt);
        if signal.done {
            self.start_monster_at(index + 1, player, &mut events);
        }
        events
    }

    // === Player input ===

    pub fn start_parry(&mut self, player: &mut Player) -> Result<(), Rejection> {
        self.check_stance_allowed()?;
        player.start_parry(&self.constants.timing);
        Ok(())
    }

    pub fn start_dash(&mut self, player: &mut Player) -> Result<(), Rejection> {
        self.check_stance_allowed()?;
        player.start_dash(&self.constants.timing);
        Ok(())
    }

    /// Spend AP on a skill. `target` indexes the living monsters.
    pub fn use_skill(
        &mut self,
        player: &mut Player,
        skill: SkillKind,
        target: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<CombatEvent>, Rejection> {
        if self.is_over() {
            return Err(Rejection::EncounterOver);
        }
        if self.phase != TurnPhase::PlayerTurn {
            return Err(Rejection::NotPlayerTurn);
        }
        let cost = self.skill_cost(skill);
        if player.action_points < cost.cost {
            return Err(Rejection::InsufficientAp {
                needed: cost.cost,
                available: player.action_points,
            });
        }
        let targets: Vec<usize> = match skill {
            SkillKind::Area => (0..self.monsters.len()).collect(),
            SkillKind::Basic | SkillKind::Heavy => {
                if target >= self.monsters.len() {
                    return Err(Rejection::InvalidTarget(target));
                }
                vec![target]
            }
        };
        player.spend_ap(cost.cost);

        // Area damage is one total split evenly across the living monsters
        let skill_mult = cost.multiplier / targets.len().max(1) as f64;
        let mut action = ActionResult {
            skill,
            ap_spent: cost.cost,
            combo_mult: self.constants.combo_multiplier(player.combo_count),
            hits: Vec::with_capacity(targets.len()),
        };
        for index in targets {
            let monster = &mut self.monsters[index];
            let attack = roll_player_attack(player, monster, skill_mult, &self.constants, rng);
            let dealt = monster.take_damage(attack.damage);
            let killed = !monster.is_alive();
            if killed {
                player.kills_this_turn += 1;
            }
            action.hits.push(SkillHit {
                monster_id: monster.id.clone(),
                damage: dealt,
                is_crit: attack.is_crit,
                bonus_mult: attack.bonus_mult,
                killed,
            });
        }
        player.first_action_this_turn = false;
        tracing::debug!(summary = %action.summary(), "skill used");

        let mut events = vec![CombatEvent::Action(action)];
        self.remove_dead(&mut events);
        self.check_victory(&mut events);
        Ok(events)
    }

    /// Hand the turn back to the monsters
    pub fn end_turn(&mut self, player: &mut Player) -> Result<Vec<CombatEvent>, Rejection> {
        if self.is_over() {
            return Err(Rejection::EncounterOver);
        }
        if self.phase != TurnPhase::PlayerTurn {
            return Err(Rejection::NotPlayerTurn);
        }
        let mut events = Vec::new();
        self.begin_monster_turn_with(player, &mut events);
        Ok(events)
    }

    /// Resolve one statistical exchange against the next living monster.
    ///
    /// Monsters strike in array order and the cursor wraps after the last.
    pub fn auto_exchange(
        &mut self,
        player: &mut Player,
        mastery: &HashMap<String, u32>,
        rng: &mut impl Rng,
    ) -> Result<Vec<CombatEvent>, Rejection> {
        if self.is_over() {
            return Err(Rejection::EncounterOver);
        }
        if self.mode != ResolutionMode::Statistical {
            return Err(Rejection::WrongMode(ResolutionMode::Statistical));
        }
        let mut events = Vec::new();
        if self.statistical_cursor >= self.monsters.len() {
            self.statistical_cursor = 0;
        }
        let index = self.statistical_cursor;
        let Some(monster) = self.monsters.get_mut(index) else {
            self.check_victory(&mut events);
            return Ok(events);
        };

        let encounter_count = mastery.get(&monster.template_id).copied().unwrap_or(0);
        let result = resolve_exchange(
            player,
            monster,
            ExchangeMode::Statistical { encounter_count },
            &self.constants,
            rng,
        );
        self.turn += 1;
        self.record(result, &mut events);

        if !player.is_alive() {
            self.finish(EncounterOutcome::Defeat, &mut events);
            return Ok(events);
        }
        // Only the struck monster can die here; its successor slides into its slot
        if self.monsters[index].is_alive() {
            self.statistical_cursor = index + 1;
        }
        self.remove_dead(&mut events);
        if self.statistical_cursor >= self.monsters.len() {
            self.statistical_cursor = 0;
        }
        self.check_victory(&mut events);
        Ok(events)
    }

    // === Internals ===

    fn skill_cost(&self, skill: SkillKind) -> SkillCost {
        let skills = &self.constants.skills;
        match skill {
            SkillKind::Basic => skills.basic,
            SkillKind::Area => skills.area,
            SkillKind::Heavy => skills.heavy,
        }
    }

    fn check_stance_allowed(&self) -> Result<(), Rejection> {
        if self.is_over() {
            return Err(Rejection::EncounterOver);
        }
        if self.mode != ResolutionMode::Timed {
            return Err(Rejection::WrongMode(ResolutionMode::Timed));
        }
        if self.phase != TurnPhase::MonsterTurn {
            return Err(Rejection::NotMonsterTurn);
        }
        Ok(())
    }

    fn begin_monster_turn(&mut self, player: &mut Player) {
        let mut events = Vec::new();
        self.begin_monster_turn_with(player, &mut events);
    }

    fn begin_monster_turn_with(&mut self, player: &mut Player, events: &mut Vec<CombatEvent>) {
        self.turn += 1;
        self.phase = TurnPhase::MonsterTurn;
        player.begin_monster_turn();
        events.push(CombatEvent::TurnStarted {
            phase: TurnPhase::MonsterTurn,
        });
        tracing::debug!(turn = self.turn, "monster turn");
        if self.mode == ResolutionMode::Timed {
            self.start_monster_at(0, player, events);
        }
    }

    /// Run the pattern of the monster at `index`, or pass to the player when
    /// every monster has acted
    fn start_monster_at(&mut self, index: usize, player: &mut Player, events: &mut Vec<CombatEvent>) {
        match self.monsters.get_mut(index) {
            Some(monster) => {
                monster.machine.begin_turn();
                self.active_monster = Some(index);
            }
            None => self.begin_player_turn(player, events),
        }
    }

    fn begin_player_turn(&mut self, player: &mut Player, events: &mut Vec<CombatEvent>) {
        self.active_monster = None;
        self.phase = TurnPhase::PlayerTurn;
        player.begin_player_turn(self.constants.player.ap_per_turn);
        events.push(CombatEvent::TurnStarted {
            phase: TurnPhase::PlayerTurn,
        });
        tracing::debug!(turn = self.turn, ap = player.action_points, "player turn");
    }

    fn record(&mut self, result: ExchangeResult, events: &mut Vec<CombatEvent>) {
        self.exchanges += 1;
        let capacity = self.constants.progression.log_capacity;
        if capacity > 0 {
            if self.log.len() >= capacity {
                self.log.pop_front();
            }
            self.log.push_back(result.clone());
        }
        events.push(CombatEvent::Exchange(result));
    }

    fn remove_dead(&mut self, events: &mut Vec<CombatEvent>) {
        for monster in self.monsters.iter().filter(|m| !m.is_alive()) {
            tracing::debug!(monster = %monster.id, "monster defeated");
            events.push(CombatEvent::MonsterDefeated {
                monster_id: monster.id.clone(),
            });
        }
        self.monsters.retain(|m| m.is_alive());
    }

    fn check_victory(&mut self, events: &mut Vec<CombatEvent>) -> bool {
        if self.monsters.iter().any(|m| m.is_alive()) {
            return false;
        }
        self.finish(EncounterOutcome::Victory, events);
        true
    }

    fn finish(&mut self, outcome: EncounterOutcome, events: &mut Vec<CombatEvent>) {
        if self.is_over() {
            return;
        }
        self.outcome = outcome;
        self.active_monster = None;
        match outcome {
            EncounterOutcome::Victory => {
                tracing::info!(turn = self.turn, exchanges = self.exchanges, "encounter won");
                events.push(CombatEvent::Victory);
            }
            EncounterOutcome::Defeat => {
                tracing::info!(turn = self.turn, exchanges = self.exchanges, "player defeated");
                events.push(CombatEvent::Defeat);
            }
            EncounterOutcome::Ongoing => {}
        }
    }
}
