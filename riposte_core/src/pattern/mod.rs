//! Attack patterns - scripted, telegraphed monster strikes

mod machine;

pub use machine::{PatternMachine, Strike, TickSignal};

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// One telegraphed strike inside a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackStep {
    /// Telegraph length in ticks
    pub duration: f64,
    #[serde(default = "default_damage_mult")]
    pub damage_mult: f64,
    /// Unparriable steps go through an active parry
    #[serde(default)]
    pub unparriable: bool,
}

fn default_damage_mult() -> f64 {
    1.0
}

impl AttackStep {
    pub fn new(duration: f64, damage_mult: f64, unparriable: bool) -> Self {
        AttackStep {
            duration,
            damage_mult,
            unparriable,
        }
    }

    pub(crate) fn validate(&self, owner: &str, script: &str) -> Result<(), ConfigError> {
        if self.duration <= 0.0 || !self.duration.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "monster '{}' script '{}' has a step with non-positive duration {}",
                owner, script, self.duration
            )));
        }
        if self.damage_mult < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "monster '{}' script '{}' has a negative damage multiplier",
                owner, script
            )));
        }
        Ok(())
    }
}

/// Ordered list of steps a monster performs in a single turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackScript {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<AttackStep>,
}

impl AttackScript {
    pub fn new(name: impl Into<String>, steps: Vec<AttackStep>) -> Self {
        AttackScript {
            name: name.into(),
            steps,
        }
    }

    pub(crate) fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "monster '{}' script '{}' has no steps",
                owner, self.name
            )));
        }
        for step in &self.steps {
            step.validate(owner, &self.name)?;
        }
        Ok(())
    }
}

/// Phase of a monster's attack state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackPhase {
    Idle,
    Telegraph,
    Attack,
    Return,
    Done,
}

/// Threat state shown during a telegraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatSignal {
    #[default]
    None,
    /// A strike is coming and can be parried
    Telegraph,
    /// A strike is coming and cannot be parried
    Unparriable,
}

/// 2D position used for snapshots
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn lerp(self, to: Position, t: f64) -> Position {
        Position {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }

    pub fn distance(self, other: Position) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Unit vector pointing at `to`, or zero if both points coincide
    pub fn direction_to(self, to: Position) -> (f64, f64) {
        let len = self.distance(to);
        if len <= f64::EPSILON {
            return (0.0, 0.0);
        }
        ((to.x - self.x) / len, (to.y - self.y) / len)
    }

    pub fn offset(self, dir: (f64, f64), distance: f64) -> Position {
        Position {
            x: self.x + dir.0 * distance,
            y: self.y + dir.1 * distance,
        }
    }
}

pub fn ease_in_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

pub fn ease_out_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * (2.0 - t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        assert!((ease_in_quad(0.0)).abs() < f64::EPSILON);
        assert!((ease_in_quad(1.0) - 1.0).abs() < f64::EPSILON);
        assert!((ease_out_quad(1.0) - 1.0).abs() < f64::EPSILON);
        // Ease-in lags, ease-out leads
        assert!(ease_in_quad(0.5) < 0.5);
        assert!(ease_out_quad(0.5) > 0.5);
    }

    #[test]
    fn test_direction() {
        let from = Position::new(100.0, 0.0);
        let dir = from.direction_to(Position::new(0.0, 0.0));
        assert!((dir.0 + 1.0).abs() < f64::EPSILON);
        assert!(dir.1.abs() < f64::EPSILON);
        assert_eq!(from.direction_to(from), (0.0, 0.0));
    }

    #[test]
    fn test_script_validation() {
        let script = AttackScript::new("empty", vec![]);
        assert!(script.validate("m").is_err());

        let script = AttackScript::new("neg", vec![AttackStep::new(-1.0, 1.0, false)]);
        assert!(script.validate("m").is_err());

        let script = AttackScript::new("ok", vec![AttackStep::new(10.0, 1.0, true)]);
        assert!(script.validate("m").is_ok());
    }
}
