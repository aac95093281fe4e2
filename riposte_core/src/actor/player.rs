//! Player - vitals, action points, posture and stance timers

use crate::augment::{DamageContext, HookChain, ModifierAccumulator, ParryContext};
use crate::config::{BalanceConstants, ProgressionConstants, TimingConstants};
use serde::{Deserialize, Serialize};

/// Complete player state for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    // === Vitals ===
    pub hp: f64,
    /// Max hp before augment bonuses; see [`Player::max_hp`]
    pub base_max_hp: f64,
    pub posture: f64,
    pub max_posture: f64,

    // === Base attributes ===
    pub attack: f64,
    pub defense: f64,
    pub luck: f64,
    pub crit_rate: f64,
    pub crit_damage_mult: f64,
    pub counter_damage_mult: f64,

    // === Action economy ===
    pub action_points: u32,
    pub max_action_points: u32,
    pub combo_count: u32,

    // === Stance timers (ticks, zero when inactive) ===
    pub parry_time_remaining: f64,
    pub dash_time_remaining: f64,
    pub impact_time_remaining: f64,

    // === Augments ===
    pub modifiers: ModifierAccumulator,
    #[serde(skip)]
    pub hooks: HookChain,
    /// Selected augment ids, in selection order
    pub augments: Vec<String>,

    // === Per-turn flags read by conditional bonuses ===
    pub first_action_this_turn: bool,
    pub kills_this_turn: u32,
    pub perfect_parry_this_turn: bool,
}

impl Player {
    pub fn new(constants: &BalanceConstants) -> Self {
        let p = &constants.player;
        Player {
            hp: p.max_hp,
            base_max_hp: p.max_hp,
            posture: p.max_posture,
            max_posture: p.max_posture,
            attack: p.attack,
            defense: p.defense,
            luck: p.luck,
            crit_rate: p.crit_rate,
            crit_damage_mult: p.crit_damage_mult,
            counter_damage_mult: p.counter_damage_mult,
            action_points: p.starting_action_points.min(p.max_action_points),
            max_action_points: p.max_action_points,
            combo_count: 0,
            parry_time_remaining: 0.0,
            dash_time_remaining: 0.0,
            impact_time_remaining: 0.0,
            modifiers: ModifierAccumulator::default(),
            hooks: HookChain::new(),
            augments: Vec::new(),
            first_action_this_turn: true,
            kills_this_turn: 0,
            perfect_parry_this_turn: false,
        }
    }

    // === Derived stats ===

    pub fn max_hp(&self) -> f64 {
        (self.base_max_hp + self.modifiers.max_hp_add).max(1.0)
    }

    pub fn effective_attack(&self) -> f64 {
        self.attack * self.modifiers.attack_mult
    }

    pub fn effective_defense(&self) -> f64 {
        (self.defense + self.modifiers.defense_add).max(0.0)
    }

    pub fn effective_luck(&self) -> f64 {
        self.luck + self.modifiers.luck_add
    }

    pub fn effective_crit_rate(&self) -> f64 {
        (self.crit_rate + self.modifiers.crit_rate_add).clamp(0.0, 1.0)
    }

    pub fn effective_crit_damage(&self) -> f64 {
        self.crit_damage_mult + self.modifiers.crit_damage_add
    }

    pub fn effective_counter_damage(&self) -> f64 {
        self.counter_damage_mult * self.modifiers.counter_damage_mult
    }

    /// Bonus added to every chance-based hook roll
    pub fn trigger_bonus(&self, progression: &ProgressionConstants) -> f64 {
        self.effective_luck() * progression.luck_trigger_bonus
    }

    /// Perfect parry window including augment extensions
    pub fn perfect_window(&self, timing: &TimingConstants) -> f64 {
        (timing.perfect_window + self.modifiers.perfect_window_add).max(0.0)
    }

    pub fn parry_context(&self, progression: &ProgressionConstants) -> ParryContext {
        ParryContext {
            attack: self.effective_attack(),
            trigger_bonus: self.trigger_bonus(progression),
        }
    }

    /// Snapshot of the transient state conditional bonuses read
    pub fn damage_context(&self, target_hp_ratio: f64, target_groggy: bool) -> DamageContext {
        DamageContext {
            target_hp_ratio,
            first_action_this_turn: self.first_action_this_turn,
            action_points: self.action_points,
            perfect_parry_this_turn: self.perfect_parry_this_turn,
            kills_this_turn: self.kills_this_turn,
            target_groggy,
            combo_count: self.combo_count,
        }
    }

    // === Vitals ===

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn hp_ratio(&self) -> f64 {
        self.hp / self.max_hp()
    }

    /// Restore hp, capped at max
    pub fn heal(&mut self, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp());
    }

    /// Remove hp, floored at 0. Returns the hp actually lost.
    pub fn take_damage(&mut self, amount: f64) -> f64 {
        if !amount.is_finite() || amount < 0.0 {
            tracing::warn!(amount, "invalid damage to player clamped to 0");
            return 0.0;
        }
        let before = self.hp;
        self.hp = (self.hp - amount).max(0.0);
        before - self.hp
    }

    /// Lower posture. Returns true when it reached zero; the caller resolves the break.
    pub fn lose_posture(&mut self, amount: f64) -> bool {
        self.posture = (self.posture - amount.max(0.0)).max(0.0);
        self.posture <= 0.0
    }

    pub fn restore_posture(&mut self) {
        self.posture = self.max_posture;
    }

    // === Stances ===

    /// Enter the parry stance, cancelling any dash
    pub fn start_parry(&mut self, timing: &TimingConstants) {
        self.parry_time_remaining = timing.parry_stance_duration;
        self.dash_time_remaining = 0.0;
    }

    /// Enter the dash stance, cancelling any parry
    pub fn start_dash(&mut self, timing: &TimingConstants) {
        self.dash_time_remaining = timing.dash_duration;
        self.parry_time_remaining = 0.0;
    }

    pub fn is_parrying(&self) -> bool {
        self.parry_time_remaining > 0.0
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_time_remaining > 0.0
    }

    /// Ticks since the parry stance was entered
    pub fn parry_elapsed(&self, timing: &TimingConstants) -> f64 {
        (timing.parry_stance_duration - self.parry_time_remaining).max(0.0)
    }

    /// Decay stance and impact timers, floored at 0
    pub fn tick_timers(&mut self, dt: f64) {
        self.tick_impact(dt);
        self.tick_stances(dt);
    }

    pub fn tick_stances(&mut self, dt: f64) {
        let dt = dt.max(0.0);
        self.parry_time_remaining = (self.parry_time_remaining - dt).max(0.0);
        self.dash_time_remaining = (self.dash_time_remaining - dt).max(0.0);
    }

    pub fn tick_impact(&mut self, dt: f64) {
        self.impact_time_remaining = (self.impact_time_remaining - dt.max(0.0)).max(0.0);
    }

    pub fn clear_stances(&mut self) {
        self.parry_time_remaining = 0.0;
        self.dash_time_remaining = 0.0;
    }

    // === Action points ===

    /// Refill AP up to max. AP already above max is kept. Returns the AP actually gained.
    pub fn gain_ap(&mut self, amount: u32) -> u32 {
        if self.action_points >= self.max_action_points {
            return 0;
        }
        let before = self.action_points;
        self.action_points = self
            .action_points
            .saturating_add(amount)
            .min(self.max_action_points);
        self.action_points - before
    }

    /// AP earned by a parry: at least 1 and not capped by `max_action_points`
    pub fn gain_parry_ap(&mut self, amount: u32) -> u32 {
        let before = self.action_points;
        self.action_points = self.action_points.saturating_add(amount.max(1));
        self.action_points - before
    }

    /// Spend AP if affordable
    pub fn spend_ap(&mut self, cost: u32) -> bool {
        if self.action_points < cost {
            return false;
        }
        self.action_points -= cost;
        true
    }

    // === Turn bookkeeping ===

    pub fn begin_monster_turn(&mut self) {
        self.perfect_parry_this_turn = false;
    }

    pub fn begin_player_turn(&mut self, ap_per_turn: u32) {
        self.gain_ap(ap_per_turn);
        self.first_action_this_turn = true;
        self.kills_this_turn = 0;
        self.clear_stances();
    }

    /// Bring every field back inside its bounds, logging each correction
    pub fn clamp_invariants(&mut self) {
        let max_hp = self.max_hp();
        if !(0.0..=max_hp).contains(&self.hp) {
            tracing::warn!(hp = self.hp, max_hp, "player hp out of range, clamping");
            self.hp = self.hp.clamp(0.0, max_hp);
        }
        if !(0.0..=self.max_posture).contains(&self.posture) {
            tracing::warn!(posture = self.posture, "player posture out of range, clamping");
            self.posture = self.posture.clamp(0.0, self.max_posture);
        }
        if self.is_parrying() && self.is_dashing() {
            tracing::warn!("parry and dash both active, keeping dash");
            self.parry_time_remaining = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(&BalanceConstants::default())
    }

    #[test]
    fn test_new_player_from_constants() {
        let p = player();
        assert!((p.hp - 1000.0).abs() < f64::EPSILON);
        assert!((p.max_hp() - 1000.0).abs() < f64::EPSILON);
        assert_eq!(p.action_points, 3);
        assert_eq!(p.combo_count, 0);
        assert!(!p.is_parrying());
        assert!(!p.is_dashing());
        assert!(p.augments.is_empty());
    }

    #[test]
    fn test_take_damage_floors_at_zero() {
        let mut p = player();
        let lost = p.take_damage(1500.0);
        assert!((lost - 1000.0).abs() < f64::EPSILON);
        assert!(p.hp.abs() < f64::EPSILON);
        assert!(!p.is_alive());
    }

    #[test]
    fn test_negative_damage_ignored() {
        let mut p = player();
        assert!(p.take_damage(-10.0).abs() < f64::EPSILON);
        assert!((p.hp - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parry_and_dash_exclusive() {
        let timing = TimingConstants::default();
        let mut p = player();
        p.start_parry(&timing);
        assert!(p.is_parrying());
        p.start_dash(&timing);
        assert!(p.is_dashing());
        assert!(!p.is_parrying());
        p.start_parry(&timing);
        assert!(p.is_parrying());
        assert!(!p.is_dashing());
    }

    #[test]
    fn test_timers_decay_and_floor() {
        let timing = TimingConstants::default();
        let mut p = player();
        p.start_parry(&timing);
        p.tick_timers(5.0);
        assert!((p.parry_elapsed(&timing) - 5.0).abs() < f64::EPSILON);
        p.tick_timers(100.0);
        assert!(p.parry_time_remaining.abs() < f64::EPSILON);
        assert!(!p.is_parrying());
    }

    #[test]
    fn test_ap_capped_and_spent() {
        let mut p = player();
        assert_eq!(p.gain_ap(20), 7);
        assert_eq!(p.action_points, 10);
        assert!(p.spend_ap(3));
        assert_eq!(p.action_points, 7);
        assert!(!p.spend_ap(8));
        assert_eq!(p.action_points, 7);
    }

    #[test]
    fn test_parry_ap_ignores_cap() {
        let mut p = player();
        p.action_points = p.max_action_points;
        assert_eq!(p.gain_parry_ap(2), 2);
        assert_eq!(p.action_points, 12);
        // Refill never takes back parry AP above the cap
        assert_eq!(p.gain_ap(1), 0);
        assert_eq!(p.action_points, 12);
        assert_eq!(p.gain_parry_ap(0), 1);
    }

    #[test]
    fn test_impact_and_stances_decay_separately() {
        let timing = TimingConstants::default();
        let mut p = player();
        p.start_dash(&timing);
        p.impact_time_remaining = 8.0;
        p.tick_impact(3.0);
        assert!((p.impact_time_remaining - 5.0).abs() < f64::EPSILON);
        assert!((p.dash_time_remaining - timing.dash_duration).abs() < f64::EPSILON);
        p.tick_stances(3.0);
        assert!((p.dash_time_remaining - (timing.dash_duration - 3.0)).abs() < f64::EPSILON);
        assert!((p.impact_time_remaining - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_begin_player_turn_resets_flags() {
        let mut p = player();
        p.first_action_this_turn = false;
        p.kills_this_turn = 2;
        p.begin_player_turn(1);
        assert!(p.first_action_this_turn);
        assert_eq!(p.kills_this_turn, 0);
        assert_eq!(p.action_points, 4);
    }

    #[test]
    fn test_clamp_invariants() {
        let mut p = player();
        p.hp = 5000.0;
        p.posture = -4.0;
        p.parry_time_remaining = 3.0;
        p.dash_time_remaining = 3.0;
        p.clamp_invariants();
        assert!((p.hp - p.max_hp()).abs() < f64::EPSILON);
        assert!(p.posture.abs() < f64::EPSILON);
        assert!(!(p.is_parrying() && p.is_dashing()));
    }

    #[test]
    fn test_trigger_bonus_from_luck() {
        let p = player();
        let bonus = p.trigger_bonus(&ProgressionConstants::default());
        assert!((bonus - 0.05).abs() < 1e-12);
    }
}
