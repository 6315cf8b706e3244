//! # Flight subsystems
//!
//! Building blocks of a mission, each one only depending on the [flight services](crate::services) it needs:
//! arrival-gated navigation on top of the fire-and-forget commands, the square formation table and the mission
//! sequence itself.

pub mod formation;
pub mod mission;
pub mod navigator;
