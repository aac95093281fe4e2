//! riposte_core - Deterministic combat core for a parry-driven roguelite
//!
//! This library provides:
//! - PatternMachine: telegraphed, multi-step monster attack scripts
//! - Defense resolution: timed parry/dash input or a statistical parry model
//! - CombatEngine: monster and player turns, AP-gated skills, victory/defeat
//! - Augments: accumulated stat modifiers and ordered hook chains
//! - Session: sector progression, augment offers, game over and reset

pub mod actor;
pub mod augment;
pub mod combat;
pub mod config;
pub mod defense;
pub mod pattern;
pub mod prelude;
pub mod progression;

// Re-export core types for convenience
pub use actor::{GrowthScale, Monster, Player};
pub use augment::{
    AccumulatorStat, AugmentDef, AugmentEffect, DamageCondition, HookChain, ModifierAccumulator,
    ModifierRegistry, Rarity, OFFER_SIZE,
};
pub use combat::{
    ActionResult, CombatEngine, CombatEvent, EncounterOutcome, ExchangeResult, OutcomeKind,
    Rejection, ResolutionMode, SkillKind, Stance, TurnPhase,
};
pub use config::{default_augments, default_waves, BalanceConstants, ConfigError, WaveTable};
pub use defense::{resolve_exchange, ExchangeMode};
pub use pattern::{AttackPhase, AttackScript, AttackStep, PatternMachine, Position, ThreatSignal};
pub use progression::{Command, CommandOutcome, RunSummary, Session, SessionPhase, Snapshot};
