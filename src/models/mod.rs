//! Core data models for the sync.

mod player;
mod team;

pub use player::*;
pub use team::*;
