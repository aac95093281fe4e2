//! Monster templates and wave layouts

use super::ConfigError;
use crate::combat::ResolutionMode;
use crate::pattern::{AttackScript, AttackStep};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Base stats and attack scripts for one kind of monster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub id: String,
    pub name: String,
    pub hp: f64,
    pub attack: f64,
    #[serde(default)]
    pub defense: f64,
    pub posture: f64,
    /// Difficulty signal feeding the statistical parry-rate penalty
    #[serde(default)]
    pub complexity: f64,
    /// Multi-step scripts for the timed model; one is picked per monster turn
    #[serde(default)]
    pub scripts: Vec<AttackScript>,
    /// Flat strike list for the statistical model. Empty means "all script steps in order".
    #[serde(default)]
    pub pattern: Vec<AttackStep>,
}

impl MonsterTemplate {
    /// The flat pattern, falling back to every script step in declaration order
    pub fn flat_pattern(&self) -> Vec<AttackStep> {
        if !self.pattern.is_empty() {
            return self.pattern.clone();
        }
        self.scripts
            .iter()
            .flat_map(|s| s.steps.iter().cloned())
            .collect()
    }

    /// Whether this template can fight under `mode`
    pub fn supports(&self, mode: ResolutionMode) -> bool {
        match mode {
            ResolutionMode::Timed => !self.scripts.is_empty(),
            ResolutionMode::Statistical => !self.scripts.is_empty() || !self.pattern.is_empty(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hp <= 0.0 || self.posture <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "monster '{}' needs positive hp and posture",
                self.id
            )));
        }
        if self.attack < 0.0 || self.defense < 0.0 || self.complexity < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "monster '{}' has a negative attack, defense or complexity",
                self.id
            )));
        }
        if self.scripts.is_empty() && self.pattern.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "monster '{}' has neither attack scripts nor a flat pattern",
                self.id
            )));
        }
        for script in &self.scripts {
            script.validate(&self.id)?;
        }
        for step in &self.pattern {
            step.validate(&self.id, "pattern")?;
        }
        Ok(())
    }
}

/// Monsters that appear together in one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveDef {
    /// Sector index within a stage, starting at 1
    pub round: u32,
    /// Template ids, in the order they act
    pub monsters: Vec<String>,
}

/// Static wave table: templates plus round layouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveTable {
    pub monsters: Vec<MonsterTemplate>,
    pub waves: Vec<WaveDef>,
}

impl WaveTable {
    /// Load and validate a wave table from a TOML or JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let table: WaveTable = super::load_file(path)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut ids = HashSet::new();
        for template in &self.monsters {
            template.validate()?;
            if !ids.insert(template.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate monster template '{}'",
                    template.id
                )));
            }
        }

        if !self.waves.iter().any(|w| w.round == 1) {
            return Err(ConfigError::ValidationError(
                "wave table must define round 1".to_string(),
            ));
        }
        for wave in &self.waves {
            if wave.monsters.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "wave for round {} has no monsters",
                    wave.round
                )));
            }
            if let Some(unknown) = wave.monsters.iter().find(|id| !ids.contains(id.as_str())) {
                return Err(ConfigError::ValidationError(format!(
                    "wave for round {} references unknown monster '{}'",
                    wave.round, unknown
                )));
            }
        }
        Ok(())
    }

    /// Check that every monster placed in a wave can fight under `mode`.
    /// Timed play needs attack scripts; a flat pattern alone only serves statistical play.
    pub fn validate_for(&self, mode: ResolutionMode) -> Result<(), ConfigError> {
        for wave in &self.waves {
            for id in &wave.monsters {
                if let Some(template) = self.template(id) {
                    if !template.supports(mode) {
                        return Err(ConfigError::ValidationError(format!(
                            "monster '{}' in round {} has no attack data for {:?} mode",
                            id, wave.round, mode
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn template(&self, id: &str) -> Option<&MonsterTemplate> {
        self.monsters.iter().find(|m| m.id == id)
    }

    /// The wave for a round: the latest defined round not after it
    pub fn wave_for(&self, round: u32) -> Option<&WaveDef> {
        self.waves
            .iter()
            .filter(|w| w.round <= round)
            .max_by_key(|w| w.round)
            .or_else(|| self.waves.iter().min_by_key(|w| w.round))
    }
}

/// Parse and validate a wave table from a TOML string
pub fn parse_wave_table(content: &str) -> Result<WaveTable, ConfigError> {
    let table: WaveTable = super::parse_toml(content)?;
    table.validate()?;
    Ok(table)
}

/// The wave table shipped with the crate
pub fn default_waves() -> Result<WaveTable, ConfigError> {
    parse_wave_table(include_str!("../../config/waves.toml"))
}
