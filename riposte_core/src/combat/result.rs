//! Exchange and action records emitted by the combat engine

use super::TurnPhase;
use serde::{Deserialize, Serialize};

/// Defensive stance held by the player when a strike resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    #[default]
    None,
    Parry,
    Dash,
}

/// How a single strike was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    // === Timed model ===
    Evade,
    Perfect,
    Good,
    /// Parry attempted against an unparriable step
    Unparriable,
    // === Shared ===
    Hit,
    // === Statistical model ===
    Parry,
    Guard,
}

impl OutcomeKind {
    /// Whether the strike was deflected by a parry of any grade
    pub fn is_parry(self) -> bool {
        matches!(self, OutcomeKind::Perfect | OutcomeKind::Good | OutcomeKind::Parry)
    }

    /// Whether the player took the full strike
    pub fn is_hit(self) -> bool {
        matches!(self, OutcomeKind::Hit | OutcomeKind::Unparriable)
    }

    pub fn label(self) -> &'static str {
        match self {
            OutcomeKind::Evade => "EVADE",
            OutcomeKind::Perfect => "PERFECT",
            OutcomeKind::Good => "GOOD",
            OutcomeKind::Unparriable => "UNPARRIABLE",
            OutcomeKind::Hit => "HIT",
            OutcomeKind::Parry => "PARRY",
            OutcomeKind::Guard => "GUARD",
        }
    }
}

/// Record of one monster strike meeting the player's defense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeResult {
    pub monster_id: String,
    pub stance: Stance,
    pub kind: OutcomeKind,

    // === Damage ===
    pub damage_to_player: f64,
    /// Counter, hook and normal-attack damage combined
    pub damage_to_monster: f64,

    // === Economy ===
    pub ap_gained: u32,
    /// Combo multiplier used by the player's attack (1 when there was none)
    pub combo_mult: f64,

    // === Flags ===
    pub is_crit: bool,
    pub is_perfect: bool,
    /// A rescue hook turned a failed defense into a parry
    pub rescued: bool,
    pub player_posture_broken: bool,
    pub monster_posture_broken: bool,
}

impl ExchangeResult {
    pub fn new(monster_id: impl Into<String>, stance: Stance, kind: OutcomeKind) -> Self {
        ExchangeResult {
            monster_id: monster_id.into(),
            stance,
            kind,
            damage_to_player: 0.0,
            damage_to_monster: 0.0,
            ap_gained: 0,
            combo_mult: 1.0,
            is_crit: false,
            is_perfect: false,
            rescued: false,
            player_posture_broken: false,
            monster_posture_broken: false,
        }
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} vs {}", self.kind.label(), self.monster_id)];

        if self.rescued {
            parts.push("rescued".to_string());
        }
        if self.damage_to_player > 0.0 {
            parts.push(format!("{:.0} taken", self.damage_to_player));
        }
        if self.damage_to_monster > 0.0 {
            let crit = if self.is_crit { " (crit)" } else { "" };
            parts.push(format!("{:.0} dealt{}", self.damage_to_monster, crit));
        }
        if self.ap_gained > 0 {
            parts.push(format!("+{} AP", self.ap_gained));
        }
        if self.player_posture_broken {
            parts.push("player posture broken".to_string());
        }
        if self.monster_posture_broken {
            parts.push("monster staggered".to_string());
        }

        parts.join(", ")
    }
}

/// Player skills, gated by AP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    /// Single target
    Basic,
    /// Total damage split evenly across living monsters
    Area,
    /// Single target, higher multiplier and cost
    Heavy,
}

/// Damage one skill dealt to one monster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillHit {
    pub monster_id: String,
    pub damage: f64,
    pub is_crit: bool,
    /// Conditional augment multiplier in effect for this hit
    pub bonus_mult: f64,
    pub killed: bool,
}

/// Record of one player skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub skill: SkillKind,
    pub ap_spent: u32,
    pub combo_mult: f64,
    pub hits: Vec<SkillHit>,
}

impl ActionResult {
    pub fn total_damage(&self) -> f64 {
        self.hits.iter().map(|h| h.damage).sum()
    }

    pub fn kills(&self) -> usize {
        self.hits.iter().filter(|h| h.killed).count()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{:?} for {:.0} damage (-{} AP)",
            self.skill,
            self.total_damage(),
            self.ap_spent
        );
        let kills = self.kills();
        if kills > 0 {
            summary.push_str(&format!(", {} killed", kills));
        }
        summary
    }
}

/// Everything the engine reports to its driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    TurnStarted { phase: TurnPhase },
    Exchange(ExchangeResult),
    Action(ActionResult),
    MonsterDefeated { monster_id: String },
    Victory,
    Defeat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_partition() {
        assert!(OutcomeKind::Perfect.is_parry());
        assert!(OutcomeKind::Good.is_parry());
        assert!(OutcomeKind::Parry.is_parry());
        assert!(!OutcomeKind::Guard.is_parry());
        assert!(OutcomeKind::Unparriable.is_hit());
        assert!(!OutcomeKind::Evade.is_hit());
    }

    #[test]
    fn test_exchange_summary() {
        let mut result = ExchangeResult::new("grunt#0", Stance::None, OutcomeKind::Hit);
        result.damage_to_player = 36.0;
        result.player_posture_broken = true;

        let summary = result.summary();
        assert!(summary.contains("HIT"));
        assert!(summary.contains("36 taken"));
        assert!(summary.contains("posture broken"));
    }

    #[test]
    fn test_action_totals() {
        let action = ActionResult {
            skill: SkillKind::Area,
            ap_spent: 2,
            combo_mult: 1.0,
            hits: vec![
                SkillHit {
                    monster_id: "a".to_string(),
                    damage: 30.0,
                    is_crit: false,
                    bonus_mult: 1.0,
                    killed: true,
                },
                SkillHit {
                    monster_id: "b".to_string(),
                    damage: 30.0,
                    is_crit: false,
                    bonus_mult: 1.0,
                    killed: false,
                },
            ],
        };
        assert!((action.total_damage() - 60.0).abs() < f64::EPSILON);
        assert_eq!(action.kills(), 1);
        assert!(action.summary().contains("1 killed"));
    }

    #[test]
    fn test_event_serializes_tagged() {
        let json = serde_json::to_string(&CombatEvent::Victory).unwrap();
        assert_eq!(json, r#"{"event":"victory"}"#);
    }
}
