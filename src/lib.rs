//! Space Invaders style arcade simulation.
//!
//! The library is the simulation core: entity model, collision resolver,
//! wave director and loop controller. Terminal input, rendering, timing and
//! the high-score file are the binary's business.

pub mod collision;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod highscore;
pub mod wave;
