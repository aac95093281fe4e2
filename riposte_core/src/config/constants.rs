//! Balance constants configuration
//!
//! Every duration is measured in simulation ticks. The driver decides how long a
//! tick is in wall-clock terms; the core only ever sees `dt` in ticks.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable balance constants, loaded once and treated as immutable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceConstants {
    #[serde(default)]
    pub player: PlayerConstants,
    #[serde(default)]
    pub timing: TimingConstants,
    #[serde(default)]
    pub defense: DefenseConstants,
    #[serde(default)]
    pub statistical: StatisticalConstants,
    #[serde(default)]
    pub posture: PostureConstants,
    #[serde(default)]
    pub skills: SkillConstants,
    #[serde(default)]
    pub progression: ProgressionConstants,
}

impl BalanceConstants {
    /// Load and validate constants from a TOML or JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let constants: BalanceConstants = super::load_file(path)?;
        constants.validate()?;
        Ok(constants)
    }

    /// Parse and validate constants from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let constants: BalanceConstants = super::parse_toml(content)?;
        constants.validate()?;
        Ok(constants)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        let durations = [
            ("idle_threshold", t.idle_threshold),
            ("attack_duration", t.attack_duration),
            ("return_mid_duration", t.return_mid_duration),
            ("return_home_duration", t.return_home_duration),
            ("parry_stance_duration", t.parry_stance_duration),
            ("dash_duration", t.dash_duration),
            ("impact_duration", t.impact_duration),
        ];
        for (name, value) in durations {
            if value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "timing.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if t.hit_offset < 0.0 || t.hit_offset >= t.attack_duration {
            return Err(ConfigError::ValidationError(format!(
                "timing.hit_offset must be in [0, attack_duration), got {}",
                t.hit_offset
            )));
        }
        if t.perfect_window < 0.0 || t.perfect_window > t.parry_stance_duration {
            return Err(ConfigError::ValidationError(
                "timing.perfect_window must fit inside the parry stance".to_string(),
            ));
        }

        if self.player.combo_multipliers.is_empty() {
            return Err(ConfigError::ValidationError(
                "player.combo_multipliers must not be empty".to_string(),
            ));
        }
        if self.player.max_hp <= 0.0 || self.player.max_posture <= 0.0 {
            return Err(ConfigError::ValidationError(
                "player.max_hp and player.max_posture must be positive".to_string(),
            ));
        }

        let s = &self.statistical;
        if !(s.min_rate <= s.base_rate && s.base_rate <= s.max_rate) {
            return Err(ConfigError::ValidationError(format!(
                "statistical rates must satisfy min <= base <= max ({} / {} / {})",
                s.min_rate, s.base_rate, s.max_rate
            )));
        }
        if !(0.0..=1.0).contains(&s.guard_reduction) {
            return Err(ConfigError::ValidationError(
                "statistical.guard_reduction must be within [0, 1]".to_string(),
            ));
        }

        if self.defense.defense_constant <= 0.0 {
            return Err(ConfigError::ValidationError(
                "defense.defense_constant must be positive".to_string(),
            ));
        }
        if self.progression.sectors_per_stage == 0 {
            return Err(ConfigError::ValidationError(
                "progression.sectors_per_stage must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Combo multiplier for a combo count, saturating at the table's last entry
    pub fn combo_multiplier(&self, combo_count: u32) -> f64 {
        let table = &self.player.combo_multipliers;
        let idx = (combo_count as usize).min(table.len().saturating_sub(1));
        table.get(idx).copied().unwrap_or(1.0)
    }
}

/// Initial player attributes, restored on session reset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConstants {
    pub max_hp: f64,
    pub attack: f64,
    pub defense: f64,
    pub luck: f64,
    /// Chance in [0, 1]
    pub crit_rate: f64,
    pub crit_damage_mult: f64,
    pub counter_damage_mult: f64,
    pub max_posture: f64,
    pub max_action_points: u32,
    pub starting_action_points: u32,
    /// AP granted at the start of every player turn
    pub ap_per_turn: u32,
    pub combo_multipliers: Vec<f64>,
}

impl Default for PlayerConstants {
    fn default() -> Self {
        PlayerConstants {
            max_hp: 1000.0,
            attack: 50.0,
            defense: 10.0,
            luck: 5.0,
            crit_rate: 0.05,
            crit_damage_mult: 1.5,
            counter_damage_mult: 1.2,
            max_posture: 100.0,
            max_action_points: 10,
            starting_action_points: 3,
            ap_per_turn: 1,
            combo_multipliers: vec![1.0, 1.1, 1.2, 1.5, 2.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConstants {
    /// Ticks a monster idles before its first telegraph
    pub idle_threshold: f64,
    pub attack_duration: f64,
    /// The strike resolves at `attack_duration - hit_offset`
    pub hit_offset: f64,
    pub return_mid_duration: f64,
    pub return_home_duration: f64,
    pub parry_stance_duration: f64,
    pub perfect_window: f64,
    pub dash_duration: f64,
    pub impact_duration: f64,
    /// Telegraph progress after which an unparriable step is signaled
    pub telegraph_warning_ratio: f64,
    /// Length of the attack lunge toward the player
    pub attack_distance: f64,
    /// Horizontal distance between the player and the first monster
    pub monster_origin_x: f64,
    pub monster_spacing: f64,
}

impl Default for TimingConstants {
    fn default() -> Self {
        TimingConstants {
            idle_threshold: 30.0,
            attack_duration: 12.0,
            hit_offset: 2.0,
            return_mid_duration: 10.0,
            return_home_duration: 20.0,
            parry_stance_duration: 20.0,
            perfect_window: 6.0,
            dash_duration: 15.0,
            impact_duration: 8.0,
            telegraph_warning_ratio: 0.8,
            attack_distance: 120.0,
            monster_origin_x: 240.0,
            monster_spacing: 90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefenseConstants {
    /// Formula constant: damage × K / (K + defense)
    #[serde(default = "default_defense_constant")]
    pub defense_constant: f64,
    #[serde(default = "default_perfect_ap_gain")]
    pub perfect_ap_gain: u32,
    #[serde(default = "default_good_ap_gain")]
    pub good_ap_gain: u32,
}

impl Default for DefenseConstants {
    fn default() -> Self {
        DefenseConstants {
            defense_constant: 50.0,
            perfect_ap_gain: 2,
            good_ap_gain: 1,
        }
    }
}

fn default_defense_constant() -> f64 {
    50.0
}
fn default_perfect_ap_gain() -> u32 {
    2
}
fn default_good_ap_gain() -> u32 {
    1
}

/// Parameters of the probabilistic parry model used for batch runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticalConstants {
    #[serde(default = "default_base_rate")]
    pub base_rate: f64,
    #[serde(default = "default_max_rate")]
    pub max_rate: f64,
    #[serde(default = "default_min_rate")]
    pub min_rate: f64,
    #[serde(default = "default_mastery_speed")]
    pub mastery_speed: f64,
    /// Parry rate lost per point of monster complexity
    #[serde(default = "default_penalty_factor")]
    pub penalty_factor: f64,
    /// Width of the GUARD band above the parry rate
    #[serde(default = "default_guard_band")]
    pub guard_band: f64,
    /// Fraction of damage removed by a GUARD
    #[serde(default = "default_guard_reduction")]
    pub guard_reduction: f64,
}

impl Default for StatisticalConstants {
    fn default() -> Self {
        StatisticalConstants {
            base_rate: default_base_rate(),
            max_rate: default_max_rate(),
            min_rate: default_min_rate(),
            mastery_speed: default_mastery_speed(),
            penalty_factor: default_penalty_factor(),
            guard_band: default_guard_band(),
            guard_reduction: default_guard_reduction(),
        }
    }
}

fn default_base_rate() -> f64 {
    0.40
}
fn default_max_rate() -> f64 {
    0.85
}
fn default_min_rate() -> f64 {
    0.10
}
fn default_mastery_speed() -> f64 {
    0.5
}
fn default_penalty_factor() -> f64 {
    0.02
}
fn default_guard_band() -> f64 {
    0.3
}
fn default_guard_reduction() -> f64 {
    0.7
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConstants {
    /// Monster posture lost to a perfect parry
    pub perfect_parry_damage: f64,
    /// Monster posture lost to a good parry
    pub good_parry_damage: f64,
    /// Monster posture lost to a statistical parry/counter
    pub parry_damage: f64,
    /// Player posture lost to a guard
    pub guard_damage: f64,
    /// Player posture lost to a clean hit
    pub hit_damage: f64,
    /// HP lost by the player when their posture breaks
    pub player_break_penalty: f64,
    /// HP lost by a monster when its posture breaks
    pub monster_break_damage: f64,
    pub groggy_duration: u32,
    pub groggy_damage_mult: f64,
}

impl Default for PostureConstants {
    fn default() -> Self {
        PostureConstants {
            perfect_parry_damage: 25.0,
            good_parry_damage: 15.0,
            parry_damage: 20.0,
            guard_damage: 10.0,
            hit_damage: 20.0,
            player_break_penalty: 50.0,
            monster_break_damage: 50.0,
            groggy_duration: 3,
            groggy_damage_mult: 2.0,
        }
    }
}

/// AP cost and damage multiplier of one player skill
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkillCost {
    pub cost: u32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConstants {
    pub basic: SkillCost,
    /// Total damage, split evenly across living monsters
    pub area: SkillCost,
    pub heavy: SkillCost,
}

impl Default for SkillConstants {
    fn default() -> Self {
        SkillConstants {
            basic: SkillCost {
                cost: 1,
                multiplier: 1.0,
            },
            area: SkillCost {
                cost: 2,
                multiplier: 1.5,
            },
            heavy: SkillCost {
                cost: 3,
                multiplier: 2.5,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConstants {
    /// The last sector of every stage is a boss encounter
    pub sectors_per_stage: u32,
    /// Compound growth per sector cleared
    pub sector_growth: f64,
    pub boss_power_jump: f64,
    pub complexity_per_stage: f64,
    pub boss_complexity: f64,
    /// Chance an offer slot draws from every tier instead of Common only
    pub rare_base_chance: f64,
    pub luck_rare_chance: f64,
    /// Added to chance-based augment hooks per point of luck
    pub luck_trigger_bonus: f64,
    /// Entries kept in the rolling exchange log
    pub log_capacity: usize,
}

impl Default for ProgressionConstants {
    fn default() -> Self {
        ProgressionConstants {
            sectors_per_stage: 10,
            sector_growth: 0.12,
            boss_power_jump: 2.5,
            complexity_per_stage: 2.0,
            boss_complexity: 5.0,
            rare_base_chance: 0.1,
            luck_rare_chance: 0.01,
            luck_trigger_bonus: 0.01,
            log_capacity: 32,
        }
    }
}
