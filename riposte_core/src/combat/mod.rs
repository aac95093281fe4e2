//! Combat - turn flow for one encounter

mod engine;
mod result;
mod snapshot;

pub use engine::{slot_position, CombatEngine, EncounterOutcome, Rejection, ResolutionMode, TurnPhase};
pub use result::{ActionResult, CombatEvent, ExchangeResult, OutcomeKind, SkillHit, SkillKind, Stance};
pub use snapshot::{CombatSnapshot, MonsterSnapshot, PlayerSnapshot};
