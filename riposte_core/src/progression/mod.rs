//! Progression - a run of encounters with augment picks in between

mod command;
mod session;
mod summary;

pub use command::{Command, CommandOutcome, SessionPhase, Snapshot};
pub use session::Session;
pub use summary::{RunStats, RunSummary};
