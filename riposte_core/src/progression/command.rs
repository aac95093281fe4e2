//! Commands accepted by a session, and what it reports back

use crate::combat::{CombatEvent, CombatSnapshot, Rejection, SkillKind};
use serde::{Deserialize, Serialize};

/// Player input, as delivered by a driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Skill { kind: SkillKind, target: usize },
    StartParry,
    StartDash,
    EndTurn,
    SelectAugment { id: String },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Accepted(Vec<CombatEvent>),
    Rejected(Rejection),
}

impl CommandOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CommandOutcome::Accepted(_))
    }
}

impl From<Result<Vec<CombatEvent>, Rejection>> for CommandOutcome {
    fn from(result: Result<Vec<CombatEvent>, Rejection>) -> Self {
        match result {
            Ok(events) => CommandOutcome::Accepted(events),
            Err(rejection) => CommandOutcome::Rejected(rejection),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    Fighting,
    /// Waiting for one of `offer` to be selected
    ChoosingAugment { offer: Vec<String> },
    /// Terminal until reset
    GameOver,
}

/// Full session state at a single tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stage: u32,
    pub sector: u32,
    pub phase: SessionPhase,
    pub combat: CombatSnapshot,
}
