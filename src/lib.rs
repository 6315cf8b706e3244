//! # Formation flight
//!
//! This crate flies one quadrotor of a four-drone square formation: take off, join an assigned corner of the
//! square, hold, come back and land. The flight controller is not part of the crate; it is reached through four
//! small [services](crate::services) that only acknowledge commands, and the crate waits for the vehicle to get
//! there by polling telemetry.
//!
//! ## Status
//!
//! | Part | Module |
//! |------|--------|
//! | Flight services | [services] |
//! | Arrival-gated navigation | [subsystems::navigator] |
//! | Formation slots | [subsystems::formation] |
//! | Mission sequence | [subsystems::mission] |
//! | Simulated flight controller | [simulator] |
//! | Ctrl-C handling | [shutdown] |
//!
//! ## Usage
//!
//! The basic procedure is:
//!  - Get a handle implementing the flight services, for example a [simulator::SimulatedDrone]
//!  - Get a shutdown token, usually from [shutdown::on_ctrl_c()]
//!  - Pick the [FormationSlot](subsystems::formation::FormationSlot) of this drone from its number
//!  - Create a [Mission](subsystems::mission::Mission) and run it
//!
//! All service methods take `&self`, the handle is only borrowed by the mission.
//!
//! For example:
//! ``` no_run
//! # async fn fly() -> Result<(), Box<dyn std::error::Error>> {
//! use formation_flight::simulator::{SimConfig, SimulatedDrone};
//! use formation_flight::subsystems::formation::FormationSlot;
//! use formation_flight::subsystems::mission::{Mission, MissionConfig};
//!
//! let drone = SimulatedDrone::spawn(SimConfig::default());
//! let shutdown = formation_flight::shutdown::on_ctrl_c();
//!
//! let mut mission = Mission::new(
//!     &drone,
//!     FormationSlot::from_number(1)?,
//!     MissionConfig::default(),
//!     shutdown,
//! );
//!
//! match mission.run().await {
//!     Ok(()) | Err(formation_flight::Error::Interrupted) => (),
//!     Err(e) => return Err(e.into()),
//! }
//!
//! drone.disconnect().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;

pub mod services;
pub mod shutdown;
pub mod simulator;
pub mod subsystems;

#[cfg(test)]
mod testing;

pub use crate::error::{Error, Result};
