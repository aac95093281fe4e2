//! Prelude module for convenient imports
//!
//! ```rust
//! use riposte_core::prelude::*;
//! ```

// Session
pub use crate::progression::{Command, CommandOutcome, RunSummary, Session, SessionPhase, Snapshot};

// Combat
pub use crate::combat::{
    CombatEngine, CombatEvent, EncounterOutcome, ExchangeResult, OutcomeKind, Rejection,
    ResolutionMode, SkillKind, TurnPhase,
};

// Actors and patterns
pub use crate::actor::{Monster, Player};
pub use crate::pattern::{AttackPhase, AttackScript, AttackStep, Position, ThreatSignal};

// Augments
pub use crate::augment::{AugmentDef, AugmentEffect, ModifierRegistry, Rarity};

// Config
pub use crate::config::{default_augments, default_waves, BalanceConstants, ConfigError, WaveTable};
