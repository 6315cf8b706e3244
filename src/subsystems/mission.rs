//! # Square formation mission
//!
//! Fixed choreography flown by every drone of the formation, each one toward its own [FormationSlot]:
//!
//! 1. **Takeoff**: indicator blue, climb above the start point (auto-arm), settle.
//! 2. **Transit to slot**: indicator white, fly to the slot corner.
//! 3. **Hold**: stay in formation for a fixed dwell.
//! 4. **Return**: indicator rainbow, fly back above the start point, settle.
//! 5. **Land**: land and wait for the motors to disarm.
//!
//! The sequence never branches and never retries. A shutdown request aborts the remaining steps as is: nothing is
//! sent after the interruption, the drone is *not* landed automatically.

use std::time::Duration;

use log::info;
use tokio_util::sync::CancellationToken;

use crate::services::{Effect, FlightServices, TargetPose, DEFAULT_SPEED, DEFAULT_TOLERANCE, WORLD_FRAME};
use crate::shutdown::sleep_or_shutdown;
use crate::subsystems::formation::FormationSlot;
use crate::subsystems::navigator::{ArrivalNavigator, DEFAULT_POLL_INTERVAL};
use crate::{Error, Result};

/// Mission choreography constants
#[derive(Debug, Clone, PartialEq)]
pub struct MissionConfig {
    /// Flight altitude (m)
    pub altitude: f32,
    /// Cruise speed (m/s)
    pub speed: f32,
    /// Center of the formation square in the world frame (m)
    pub formation_center: (f32, f32),
    /// Pause after takeoff and after return
    pub settle_time: Duration,
    /// Time spent in formation
    pub hold_time: Duration,
    /// Telemetry polling period while waiting
    pub poll_interval: Duration,
    /// Arrival tolerance (m)
    pub tolerance: f32,
    /// Frame all mission targets are expressed in
    pub frame: String,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            altitude: 1.5,
            speed: DEFAULT_SPEED,
            formation_center: (3.5, 3.5),
            settle_time: Duration::from_secs(1),
            hold_time: Duration::from_secs(8),
            poll_interval: DEFAULT_POLL_INTERVAL,
            tolerance: DEFAULT_TOLERANCE,
            frame: WORLD_FRAME.to_owned(),
        }
    }
}

/// Mission progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionStage {
    /// Not started yet
    Idle,
    /// Climbing above the start point
    Takeoff,
    /// Flying to the formation slot
    TransitToSlot,
    /// Holding the formation slot
    Hold,
    /// Flying back above the start point
    Return,
    /// Landing
    Land,
    /// Landed and disarmed
    Done,
}

/// One drone flying the square formation mission
pub struct Mission<'a, S: ?Sized> {
    services: &'a S,
    slot: FormationSlot,
    config: MissionConfig,
    shutdown: CancellationToken,
    stage: MissionStage,
}

impl<'a, S> Mission<'a, S>
where
    S: FlightServices + ?Sized,
{
    /// Prepare the mission of the drone owning `slot`
    pub fn new(
        services: &'a S,
        slot: FormationSlot,
        config: MissionConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            services,
            slot,
            config,
            shutdown,
            stage: MissionStage::Idle,
        }
    }

    /// Last stage entered. Stays on the interrupted stage if the mission was aborted.
    pub fn stage(&self) -> MissionStage {
        self.stage
    }

    /// Target above the start point
    pub fn home_target(&self) -> TargetPose {
        TargetPose::new(0.0, 0.0, self.config.altitude)
            .with_speed(self.config.speed)
            .in_frame(&self.config.frame)
            .with_auto_arm(true)
            .with_tolerance(self.config.tolerance)
    }

    /// Target at the formation slot
    pub fn slot_target(&self) -> TargetPose {
        let (x, y, z) = self
            .slot
            .position(self.config.formation_center, self.config.altitude);
        TargetPose::new(x, y, z)
            .with_speed(self.config.speed)
            .in_frame(&self.config.frame)
            .with_tolerance(self.config.tolerance)
    }

    fn enter(&mut self, stage: MissionStage) {
        info!("Drone {}: {:?}", self.slot.number(), stage);
        self.stage = stage;
    }

    async fn pause(&self, duration: Duration) -> Result<()> {
        sleep_or_shutdown(duration, &self.shutdown).await
    }

    /// Fly the whole mission
    ///
    /// Returns once landed and disarmed, or [Error::Interrupted] as soon as shutdown is requested.
    pub async fn run(&mut self) -> Result<()> {
        let navigator = ArrivalNavigator::new(self.services, self.shutdown.clone())
            .with_poll_interval(self.config.poll_interval);

        if self.shutdown.is_cancelled() {
            return Err(Error::Interrupted);
        }

        self.enter(MissionStage::Takeoff);
        self.services.set_effect(&Effect::BLUE).await?;
        navigator.move_and_wait(&self.home_target()).await?;
        self.pause(self.config.settle_time).await?;

        self.enter(MissionStage::TransitToSlot);
        info!("Drone {}: joining {}", self.slot.number(), self.slot);
        self.services.set_effect(&Effect::WHITE).await?;
        navigator.move_and_wait(&self.slot_target()).await?;

        self.enter(MissionStage::Hold);
        info!("Holding formation position for {:?}", self.config.hold_time);
        self.pause(self.config.hold_time).await?;

        self.enter(MissionStage::Return);
        self.services.set_effect(&Effect::rainbow()).await?;
        navigator.move_and_wait(&self.home_target()).await?;
        self.pause(self.config.settle_time).await?;

        self.enter(MissionStage::Land);
        navigator.land_and_wait().await?;

        self.enter(MissionStage::Done);
        info!("Mission completed successfully!");
        Ok(())
    }
}
