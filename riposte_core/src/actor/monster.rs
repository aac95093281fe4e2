//! Monster - a scaled template instance with its own pattern machine

use crate::config::{MonsterTemplate, ProgressionConstants};
use crate::pattern::{AttackScript, AttackStep, PatternMachine, Position};
use serde::{Deserialize, Serialize};

/// Stat scaling for one sector of one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthScale {
    /// Compound growth applied to every combat stat
    pub growth: f64,
    /// Extra multiplier on hp, attack and posture (1 for regular sectors)
    pub boss_mult: f64,
    pub complexity_add: f64,
    pub is_boss: bool,
}

impl Default for GrowthScale {
    fn default() -> Self {
        GrowthScale {
            growth: 1.0,
            boss_mult: 1.0,
            complexity_add: 0.0,
            is_boss: false,
        }
    }
}

impl GrowthScale {
    /// Scaling for `stage`/`sector` (both 1-based).
    ///
    /// `growth = (1 + sector_growth)^((stage - 1) × sectors_per_stage + (sector - 1))`.
    /// The last sector of a stage is a boss.
    pub fn for_sector(stage: u32, sector: u32, progression: &ProgressionConstants) -> Self {
        let stage = stage.max(1);
        let sector = sector.max(1);
        let sectors_cleared =
            (stage - 1) as f64 * progression.sectors_per_stage as f64 + (sector - 1) as f64;
        let is_boss = sector >= progression.sectors_per_stage;
        let mut complexity_add = (stage - 1) as f64 * progression.complexity_per_stage;
        if is_boss {
            complexity_add += progression.boss_complexity;
        }
        GrowthScale {
            growth: (1.0 + progression.sector_growth).powf(sectors_cleared),
            boss_mult: if is_boss { progression.boss_power_jump } else { 1.0 },
            complexity_add,
            is_boss,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    // === Identity ===
    /// Unique within an encounter
    pub id: String,
    pub template_id: String,
    pub name: String,

    // === Vitals ===
    pub hp: f64,
    pub max_hp: f64,
    pub attack: f64,
    pub defense: f64,
    pub posture: f64,
    pub max_posture: f64,
    pub complexity: f64,
    pub groggy_turns_remaining: u32,
    pub is_boss: bool,

    // === Patterns ===
    pub scripts: Vec<AttackScript>,
    /// Flat strike list for statistical exchanges, cycled by `pattern_cursor`
    pub pattern: Vec<AttackStep>,
    pub pattern_cursor: usize,
    pub machine: PatternMachine,
}

impl Monster {
    /// Instantiate a template at `home`
    pub fn from_template(
        template: &MonsterTemplate,
        id: impl Into<String>,
        scale: &GrowthScale,
        home: Position,
    ) -> Self {
        let power = scale.growth * scale.boss_mult;
        let max_hp = template.hp * power;
        let max_posture = template.posture * power;
        Monster {
            id: id.into(),
            template_id: template.id.clone(),
            name: if scale.is_boss {
                format!("{} (Boss)", template.name)
            } else {
                template.name.clone()
            },
            hp: max_hp,
            max_hp,
            attack: template.attack * power,
            defense: template.defense * scale.growth,
            posture: max_posture,
            max_posture,
            complexity: template.complexity + scale.complexity_add,
            groggy_turns_remaining: 0,
            is_boss: scale.is_boss,
            scripts: template.scripts.clone(),
            pattern: template.flat_pattern(),
            pattern_cursor: 0,
            machine: PatternMachine::new(home),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn is_groggy(&self) -> bool {
        self.groggy_turns_remaining > 0
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        self.hp / self.max_hp
    }

    /// Remove hp, floored at 0. Returns the hp actually lost.
    pub fn take_damage(&mut self, amount: f64) -> f64 {
        if !amount.is_finite() || amount < 0.0 {
            tracing::warn!(monster = %self.id, amount, "invalid damage to monster clamped to 0");
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

    /// Consume one turn of groggy, if any
    pub fn tick_groggy(&mut self) {
        self.groggy_turns_remaining = self.groggy_turns_remaining.saturating_sub(1);
    }

    /// Next step of the flat pattern; the cursor wraps around
    pub fn next_flat_step(&mut self) -> AttackStep {
        if self.pattern.is_empty() {
            return AttackStep::new(1.0, 1.0, false);
        }
        let step = self.pattern[self.pattern_cursor % self.pattern.len()].clone();
        self.pattern_cursor = (self.pattern_cursor + 1) % self.pattern.len();
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> MonsterTemplate {
        MonsterTemplate {
            id: "grunt".to_string(),
            name: "Grunt".to_string(),
            hp: 300.0,
            attack: 40.0,
            defense: 5.0,
            posture: 50.0,
            complexity: 0.0,
            scripts: vec![AttackScript::new(
                "jab",
                vec![AttackStep::new(10.0, 1.0, false), AttackStep::new(10.0, 2.0, true)],
            )],
            pattern: Vec::new(),
        }
    }

    #[test]
    fn test_first_sector_is_unscaled() {
        let scale = GrowthScale::for_sector(1, 1, &ProgressionConstants::default());
        assert!((scale.growth - 1.0).abs() < f64::EPSILON);
        assert!(!scale.is_boss);

        let m = Monster::from_template(&template(), "grunt#0", &scale, Position::default());
        assert!((m.max_hp - 300.0).abs() < f64::EPSILON);
        assert!((m.attack - 40.0).abs() < f64::EPSILON);
        assert!(m.is_alive());
    }

    #[test]
    fn test_boss_sector_scaling() {
        let progression = ProgressionConstants::default();
        let scale = GrowthScale::for_sector(1, 10, &progression);
        assert!(scale.is_boss);
        assert!((scale.complexity_add - 5.0).abs() < f64::EPSILON);

        let m = Monster::from_template(&template(), "boss", &scale, Position::default());
        let growth = 1.12_f64.powi(9);
        assert!((m.max_hp - 300.0 * growth * 2.5).abs() < 1e-6);
        // Defense grows but skips the boss jump
        assert!((m.defense - 5.0 * growth).abs() < 1e-9);
        assert!(m.name.contains("Boss"));
    }

    #[test]
    fn test_stage_two_complexity() {
        let scale = GrowthScale::for_sector(2, 1, &ProgressionConstants::default());
        assert!((scale.complexity_add - 2.0).abs() < f64::EPSILON);
        assert!((scale.growth - 1.12_f64.powi(10)).abs() < 1e-9);
    }

    #[test]
    fn test_flat_pattern_cycles() {
        let mut m = Monster::from_template(
            &template(),
            "grunt#0",
            &GrowthScale::default(),
            Position::default(),
        );
        assert!(!m.next_flat_step().unparriable);
        assert!(m.next_flat_step().unparriable);
        assert!(!m.next_flat_step().unparriable);
    }

    #[test]
    fn test_take_damage_and_groggy() {
        let mut m = Monster::from_template(
            &template(),
            "grunt#0",
            &GrowthScale::default(),
            Position::default(),
        );
        assert!((m.take_damage(500.0) - 300.0).abs() < f64::EPSILON);
        assert!(!m.is_alive());

        m.groggy_turns_remaining = 1;
        assert!(m.is_groggy());
        m.tick_groggy();
        assert!(!m.is_groggy());
        m.tick_groggy();
        assert_eq!(m.groggy_turns_remaining, 0);
    }
}
