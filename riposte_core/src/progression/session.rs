//! Session - one run: encounters, augment offers, game over and reset

use super::command::{Command, CommandOutcome, SessionPhase, Snapshot};
use super::summary::{RunStats, RunSummary};
use crate::actor::{GrowthScale, Monster, Player};
use crate::augment::ModifierRegistry;
use crate::combat::{
    slot_position, CombatEngine, CombatEvent, EncounterOutcome, Rejection, ResolutionMode,
    SkillKind, TurnPhase,
};
use crate::config::{default_augments, default_waves, BalanceConstants, ConfigError, WaveTable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::Arc;

/// Safety cap on auto-play steps per encounter
const MAX_STEPS_PER_ENCOUNTER: u32 = 100_000;

#[derive(Debug, Clone)]
pub struct Session {
    // === Static data ===
    constants: Arc<BalanceConstants>,
    waves: Arc<WaveTable>,
    registry: Arc<ModifierRegistry>,
    mode: ResolutionMode,

    // === Run state ===
    seed: u64,
    rng: ChaCha8Rng,
    player: Player,
    stage: u32,
    sector: u32,
    rounds_cleared: u32,
    phase: SessionPhase,
    encounter: CombatEngine,
    /// (monster id, template id) for the current encounter
    roster: Vec<(String, String)>,
    /// Encounters won per monster template
    mastery: HashMap<String, u32>,
    stats: RunStats,
    cause_of_death: Option<String>,
}

impl Session {
    pub fn new(
        constants: Arc<BalanceConstants>,
        waves: Arc<WaveTable>,
        registry: Arc<ModifierRegistry>,
        mode: ResolutionMode,
        seed: u64,
    ) -> Self {
        let mut player = Player::new(&constants);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (encounter, roster) =
            build_encounter(&constants, &waves, mode, 1, 1, &mut player, &mut rng);
        tracing::debug!(seed, ?mode, "session started");
        Session {
            constants,
            waves,
            registry,
            mode,
            seed,
            rng,
            player,
            stage: 1,
            sector: 1,
            rounds_cleared: 0,
            phase: SessionPhase::Fighting,
            encounter,
            roster,
            mastery: HashMap::new(),
            stats: RunStats::default(),
            cause_of_death: None,
        }
    }

    /// Session over the built-in wave and augment tables
    pub fn with_defaults(mode: ResolutionMode, seed: u64) -> Result<Self, ConfigError> {
        let registry = ModifierRegistry::new(default_augments()?)?;
        let waves = default_waves()?;
        waves.validate_for(mode)?;
        Ok(Session::new(
            Arc::new(BalanceConstants::default()),
            Arc::new(waves),
            Arc::new(registry),
            mode,
            seed,
        ))
    }

    // === Accessors ===

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn encounter(&self) -> &CombatEngine {
        &self.encounter
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn sector(&self) -> u32 {
        self.sector
    }

    pub fn rounds_cleared(&self) -> u32 {
        self.rounds_cleared
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Encounters won against `template_id`
    pub fn mastery(&self, template_id: &str) -> u32 {
        self.mastery.get(template_id).copied().unwrap_or(0)
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// The pending augment offer, if any
    pub fn offer(&self) -> Option<&[String]> {
        match &self.phase {
            SessionPhase::ChoosingAugment { offer } => Some(offer),
            _ => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            stage: self.stage,
            sector: self.sector,
            phase: self.phase.clone(),
            combat: self.encounter.snapshot(&self.player),
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seed: self.seed,
            stage: self.stage,
            sector: self.sector,
            rounds_cleared: self.rounds_cleared,
            game_over: self.is_game_over(),
            cause_of_death: self.cause_of_death.clone(),
            final_hp: self.player.hp,
            augments: self.player.augments.clone(),
            parry_ratio: self.stats.parry_ratio(),
            stats: self.stats.clone(),
        }
    }

    // === Input ===

    pub fn handle(&mut self, command: Command) -> CommandOutcome {
        if command == Command::Reset {
            self.reset();
            return CommandOutcome::Accepted(Vec::new());
        }

        match &self.phase {
            SessionPhase::GameOver => return CommandOutcome::Rejected(Rejection::GameOver),
            SessionPhase::ChoosingAugment { .. } => {
                return match command {
                    Command::SelectAugment { id } => self.select(&id).into(),
                    _ => CommandOutcome::Rejected(Rejection::AwaitingAugment),
                };
            }
            SessionPhase::Fighting => {}
        }

        let result = match command {
            Command::Skill { kind, target } => {
                self.encounter
                    .use_skill(&mut self.player, kind, target, &mut self.rng)
            }
            Command::StartParry => self.encounter.start_parry(&mut self.player).map(|_| Vec::new()),
            Command::StartDash => self.encounter.start_dash(&mut self.player).map(|_| Vec::new()),
            Command::EndTurn => self.encounter.end_turn(&mut self.player),
            Command::SelectAugment { .. } => Err(Rejection::NoOfferPending),
            Command::Reset => Ok(Vec::new()),
        };
        if let Ok(events) = &result {
            self.observe(events);
        }
        result.into()
    }

    /// Advance time by `dt` ticks. Only the fighting phase has a clock.
    pub fn tick(&mut self, dt: f64) -> Vec<CombatEvent> {
        if self.phase != SessionPhase::Fighting {
            return Vec::new();
        }
        let events = self.encounter.tick(&mut self.player, dt, &mut self.rng);
        self.observe(&events);
        events
    }

    /// Pick one augment from the pending offer and move on to the next sector
    pub fn select(&mut self, id: &str) -> Result<Vec<CombatEvent>, Rejection> {
        let SessionPhase::ChoosingAugment { offer } = &self.phase else {
            return Err(Rejection::NoOfferPending);
        };
        if !offer.iter().any(|o| o == id) {
            return Err(Rejection::NotOffered(id.to_string()));
        }
        let Some(augment) = self.registry.get(id) else {
            tracing::warn!(augment = id, "offered augment missing from the registry");
            return Err(Rejection::NotOffered(id.to_string()));
        };
        augment.apply_to(&mut self.player);

        self.sector += 1;
        if self.sector > self.constants.progression.sectors_per_stage {
            self.sector = 1;
            self.stage += 1;
            tracing::info!(stage = self.stage, "stage cleared");
        }
        self.start_encounter();
        Ok(Vec::new())
    }

    /// Restore the initial run state. The RNG keeps advancing.
    pub fn reset(&mut self) {
        self.player = Player::new(&self.constants);
        self.stage = 1;
        self.sector = 1;
        self.rounds_cleared = 0;
        self.mastery.clear();
        self.stats = RunStats::default();
        self.cause_of_death = None;
        self.start_encounter();
        tracing::info!("session reset");
    }

    /// Reset and re-seed the RNG
    pub fn reset_with_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.reset();
    }

    // === Auto-play ===

    /// One step of unattended play.
    ///
    /// Statistical mode resolves one exchange. Timed mode advances one tick and
    /// spends the player turn on basic attacks. A pending offer is settled by
    /// taking its first augment.
    pub fn auto_step(&mut self) -> Vec<CombatEvent> {
        match &self.phase {
            SessionPhase::GameOver => Vec::new(),
            SessionPhase::ChoosingAugment { offer } => {
                let Some(first) = offer.first().cloned() else {
                    tracing::warn!("empty augment offer, skipping the pick");
                    return Vec::new();
                };
                self.select(&first).unwrap_or_default()
            }
            SessionPhase::Fighting => match self.mode {
                ResolutionMode::Statistical => {
                    let result =
                        self.encounter
                            .auto_exchange(&mut self.player, &self.mastery, &mut self.rng);
                    let events = result.unwrap_or_default();
                    self.observe(&events);
                    events
                }
                ResolutionMode::Timed => {
                    if self.encounter.phase() != TurnPhase::PlayerTurn {
                        return self.tick(1.0);
                    }
                    let cost = self.constants.skills.basic.cost;
                    let command = if self.player.action_points >= cost {
                        Command::Skill {
                            kind: SkillKind::Basic,
                            target: 0,
                        }
                    } else {
                        Command::EndTurn
                    };
                    match self.handle(command) {
                        CommandOutcome::Accepted(events) => events,
                        CommandOutcome::Rejected(_) => Vec::new(),
                    }
                }
            },
        }
    }

    /// Auto-play until game over or `max_rounds` encounters are won
    pub fn run_to_end(&mut self, max_rounds: u32) -> RunSummary {
        let mut steps = 0;
        let mut round = self.rounds_cleared;
        while !self.is_game_over() && self.rounds_cleared < max_rounds {
            self.auto_step();
            if self.rounds_cleared != round {
                round = self.rounds_cleared;
                steps = 0;
            }
            steps += 1;
            if steps > MAX_STEPS_PER_ENCOUNTER {
                tracing::warn!(stage = self.stage, sector = self.sector, "encounter stalled, stopping run");
                break;
            }
        }
        self.summary()
    }

    // === Internals ===

    fn start_encounter(&mut self) {
        let (encounter, roster) = build_encounter(
            &self.constants,
            &self.waves,
            self.mode,
            self.stage,
            self.sector,
            &mut self.player,
            &mut self.rng,
        );
        self.encounter = encounter;
        self.roster = roster;
        self.phase = SessionPhase::Fighting;
    }

    fn observe(&mut self, events: &[CombatEvent]) {
        for event in events {
            self.stats.observe(event);
        }
        if self.phase != SessionPhase::Fighting {
            return;
        }
        match self.encounter.outcome() {
            EncounterOutcome::Ongoing => {}
            EncounterOutcome::Victory => self.on_victory(),
            EncounterOutcome::Defeat => self.on_defeat(),
        }
    }

    fn on_victory(&mut self) {
        self.rounds_cleared += 1;
        let mut templates: Vec<&str> = self.roster.iter().map(|(_, t)| t.as_str()).collect();
        templates.sort_unstable();
        templates.dedup();
        for template in templates {
            *self.mastery.entry(template.to_string()).or_insert(0) += 1;
        }

        let offer = self.registry.sample_offer(
            self.player.effective_luck(),
            &self.constants.progression,
            &mut self.rng,
        );
        tracing::info!(
            stage = self.stage,
            sector = self.sector,
            ?offer,
            "sector cleared"
        );
        self.phase = SessionPhase::ChoosingAugment { offer };
    }

    fn on_defeat(&mut self) {
        self.cause_of_death = self.stats.killed_by.as_ref().map(|id| {
            self.roster
                .iter()
                .find(|(monster, _)| monster == id)
                .map(|(_, template)| template.clone())
                .unwrap_or_else(|| id.clone())
        });
        tracing::info!(
            stage = self.stage,
            sector = self.sector,
            cause = ?self.cause_of_death,
            "game over"
        );
        self.phase = SessionPhase::GameOver;
    }
}

/// Instantiate the wave for `stage`/`sector` and open the encounter
fn build_encounter(
    constants: &Arc<BalanceConstants>,
    waves: &WaveTable,
    mode: ResolutionMode,
    stage: u32,
    sector: u32,
    player: &mut Player,
    rng: &mut ChaCha8Rng,
) -> (CombatEngine, Vec<(String, String)>) {
    let scale = GrowthScale::for_sector(stage, sector, &constants.progression);
    let mut monsters = Vec::new();
    match waves.wave_for(sector) {
        Some(wave) => {
            for (slot, template_id) in wave.monsters.iter().enumerate() {
                let Some(template) = waves.template(template_id) else {
                    tracing::warn!(template = %template_id, "unknown monster template in wave");
                    continue;
                };
                if !template.supports(mode) {
                    tracing::warn!(template = %template_id, ?mode, "monster cannot fight in this mode, skipped");
                    continue;
                }
                let id = format!("{}#{}", template_id, slot);
                let home = slot_position(slot, &constants.timing);
                monsters.push(Monster::from_template(template, id, &scale, home));
            }
        }
        None => tracing::warn!(sector, "no wave defined for sector"),
    }
    // Statistical runs cycle flat patterns from a random offset
    if mode == ResolutionMode::Statistical {
        for monster in &mut monsters {
            if !monster.pattern.is_empty() {
                monster.pattern_cursor = rng.gen_range(0..monster.pattern.len());
            }
        }
    }
    let roster = monsters
        .iter()
        .map(|m| (m.id.clone(), m.template_id.clone()))
        .collect();
    tracing::debug!(stage, sector, boss = scale.is_boss, count = monsters.len(), "encounter built");
    (
        CombatEngine::new(Arc::clone(constants), mode, monsters, player),
        roster,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::ModifierAccumulator;

    fn statistical(seed: u64) -> Session {
        Session::with_defaults(ResolutionMode::Statistical, seed).unwrap()
    }

    fn win_encounter(session: &mut Session) {
        for _ in 0..10_000 {
            if session.offer().is_some() || session.is_game_over() {
                return;
            }
            session.auto_step();
        }
        panic!("encounter did not finish");
    }

    #[test]
    fn test_new_session_state() {
        let session = statistical(1);
        assert_eq!(session.stage(), 1);
        assert_eq!(session.sector(), 1);
        assert_eq!(*session.phase(), SessionPhase::Fighting);
        assert!(!session.encounter().monsters().is_empty());
    }

    #[test]
    fn test_victory_offers_three_and_keeps_offer() {
        let mut session = statistical(3);
        win_encounter(&mut session);
        let offer = session.offer().unwrap().to_vec();
        assert_eq!(offer.len(), 3);
        assert_eq!(session.mastery("grunt"), 1);

        // Non-select commands are rejected and the offer is not regenerated
        let outcome = session.handle(Command::EndTurn);
        assert_eq!(outcome, CommandOutcome::Rejected(Rejection::AwaitingAugment));
        assert!(session.tick(5.0).is_empty());
        assert_eq!(session.offer().unwrap(), offer.as_slice());
    }

    #[test]
    fn test_select_applies_and_advances() {
        let mut session = statistical(3);
        win_encounter(&mut session);
        let pick = session.offer().unwrap()[1].clone();

        let bad = session.handle(Command::SelectAugment {
            id: "not_offered".to_string(),
        });
        assert_eq!(
            bad,
            CommandOutcome::Rejected(Rejection::NotOffered("not_offered".to_string()))
        );

        let outcome = session.handle(Command::SelectAugment { id: pick.clone() });
        assert!(outcome.is_accepted());
        assert_eq!(session.sector(), 2);
        assert_eq!(*session.phase(), SessionPhase::Fighting);
        assert_eq!(session.player().augments, vec![pick]);
    }

    #[test]
    fn test_select_without_offer_rejected() {
        let mut session = statistical(3);
        let outcome = session.handle(Command::SelectAugment {
            id: "auto_parry".to_string(),
        });
        assert_eq!(outcome, CommandOutcome::Rejected(Rejection::NoOfferPending));
    }

    #[test]
    fn test_stage_rolls_over() {
        let mut session = statistical(5);
        session.player.base_max_hp = 1.0e12;
        session.player.hp = 1.0e12;
        for _ in 0..10 {
            win_encounter(&mut session);
            session.auto_step();
        }
        assert_eq!(session.stage(), 2);
        assert_eq!(session.sector(), 1);
        assert_eq!(session.rounds_cleared(), 10);
    }

    #[test]
    fn test_game_over_is_terminal_until_reset() {
        let mut session = statistical(9);
        session.player.hp = 1.0;
        session.player.base_max_hp = 1.0;
        while !session.is_game_over() {
            session.auto_step();
            if session.offer().is_some() {
                session.auto_step();
            }
        }
        assert_eq!(
            session.handle(Command::EndTurn),
            CommandOutcome::Rejected(Rejection::GameOver)
        );
        assert!(session.summary().cause_of_death.is_some());

        assert!(session.handle(Command::Reset).is_accepted());
        assert_eq!(*session.phase(), SessionPhase::Fighting);
        assert_eq!(session.stage(), 1);
        assert!(session.player().augments.is_empty());
        assert_eq!(session.mastery("grunt"), 0);
        assert!((session.player().hp - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_restores_initial_player() {
        let mut session = statistical(21);
        let registry = Arc::clone(&session.registry);
        registry.get("whetstone").unwrap().apply_to(&mut session.player);
        registry.get("auto_parry").unwrap().apply_to(&mut session.player);
        assert!(!session.player.hooks.is_empty());

        let timing = session.constants.timing.clone();
        let p = &mut session.player;
        p.hp = 12.0;
        p.posture = 3.0;
        p.action_points = 14;
        p.combo_count = 6;
        p.start_dash(&timing);
        p.impact_time_remaining = 4.0;
        p.first_action_this_turn = false;
        p.kills_this_turn = 2;
        p.perfect_parry_this_turn = true;

        assert!(session.handle(Command::Reset).is_accepted());

        let fresh = Player::new(&session.constants);
        let p = session.player();
        assert_eq!(p.modifiers, ModifierAccumulator::default());
        assert!(p.hooks.is_empty());
        assert!(p.augments.is_empty());
        assert!((p.hp - fresh.hp).abs() < f64::EPSILON);
        assert!((p.max_hp() - fresh.max_hp()).abs() < f64::EPSILON);
        assert!((p.posture - fresh.posture).abs() < f64::EPSILON);
        assert!((p.effective_attack() - fresh.effective_attack()).abs() < f64::EPSILON);
        assert_eq!(p.combo_count, fresh.combo_count);
        assert!(p.parry_time_remaining.abs() < f64::EPSILON);
        assert!(p.dash_time_remaining.abs() < f64::EPSILON);
        assert!(p.impact_time_remaining.abs() < f64::EPSILON);
        assert_eq!(p.first_action_this_turn, fresh.first_action_this_turn);
        assert_eq!(p.kills_this_turn, fresh.kills_this_turn);
        assert_eq!(p.perfect_parry_this_turn, fresh.perfect_parry_this_turn);
    }

    #[test]
    fn test_timed_encounter_skips_pattern_only_monsters() {
        let waves = crate::config::parse_wave_table(
            r#"
[[monsters]]
id = "bat"
name = "Bat"
hp = 100
attack = 20
posture = 30
pattern = [{ duration = 20 }]

[[monsters]]
id = "grunt"
name = "Grunt"
hp = 300
attack = 40
posture = 50
scripts = [{ name = "jab", steps = [{ duration = 20 }] }]

[[waves]]
round = 1
monsters = ["bat", "grunt"]
"#,
        )
        .unwrap();
        let constants = Arc::new(BalanceConstants::default());
        let mut player = Player::new(&constants);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let (timed, roster) =
            build_encounter(&constants, &waves, ResolutionMode::Timed, 1, 1, &mut player, &mut rng);
        assert_eq!(timed.monsters().len(), 1);
        assert_eq!(roster, vec![("grunt#1".to_string(), "grunt".to_string())]);

        let (statistical, _) = build_encounter(
            &constants,
            &waves,
            ResolutionMode::Statistical,
            1,
            1,
            &mut player,
            &mut rng,
        );
        assert_eq!(statistical.monsters().len(), 2);
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = statistical(77).run_to_end(15);
        let b = statistical(77).run_to_end(15);
        assert_eq!(a, b);
    }

    #[test]
    fn test_reset_with_seed_replays() {
        let mut session = statistical(12);
        let first = session.run_to_end(5);
        session.reset_with_seed(12);
        let second = session.run_to_end(5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_timed_auto_play_progresses() {
        let mut session = Session::with_defaults(ResolutionMode::Timed, 4).unwrap();
        let summary = session.run_to_end(1);
        assert!(summary.rounds_cleared == 1 || summary.game_over);
        assert!(summary.stats.exchanges > 0);
    }
}
