//! Actors - the player and the monsters it fights

mod monster;
mod player;

pub use monster::{GrowthScale, Monster};
pub use player::Player;
