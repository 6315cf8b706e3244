//! # Arrival-gated navigation
//!
//! The flight services only acknowledge commands: [Navigate::navigate] returns as soon as the flight controller
//! accepted the new target and [Land::land] as soon as the descent started. This subsystem turns them into calls
//! that complete when the motion is done, by polling telemetry at a fixed interval:
//!  - [ArrivalNavigator::move_and_wait] polls the error to the navigation target until it falls under the
//!    tolerance,
//!  - [ArrivalNavigator::land_and_wait] polls the arming state until the vehicle disarmed.
//!
//! There is no timeout: if the vehicle never gets there, the wait lasts until shutdown is requested.
//!
//! ``` no_run
//! # use formation_flight::services::{TargetPose, WORLD_FRAME};
//! # use formation_flight::subsystems::navigator::ArrivalNavigator;
//! # async fn example(drone: &formation_flight::simulator::SimulatedDrone) -> formation_flight::Result<()> {
//! let navigator = ArrivalNavigator::new(drone, formation_flight::shutdown::on_ctrl_c());
//!
//! navigator
//!     .move_and_wait(&TargetPose::new(0.0, 0.0, 1.5).in_frame(WORLD_FRAME).with_auto_arm(true))
//!     .await?;
//! navigator.land_and_wait().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::services::{Land, Navigate, TargetPose, Telemetry, DEFAULT_FRAME, NAVIGATE_TARGET_FRAME};
use crate::shutdown::sleep_or_shutdown;
use crate::{Error, Result};

/// Telemetry polling period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Wraps fire-and-forget motion commands with a wait for completion
///
/// Only one command is ever outstanding: every wait sends exactly one command, then only reads telemetry.
pub struct ArrivalNavigator<'a, S: ?Sized> {
    services: &'a S,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl<'a, S: ?Sized> ArrivalNavigator<'a, S> {
    /// Create a navigator polling every [DEFAULT_POLL_INTERVAL]
    pub fn new(services: &'a S, shutdown: CancellationToken) -> Self {
        Self {
            services,
            poll_interval: DEFAULT_POLL_INTERVAL,
            shutdown,
        }
    }

    /// Change the telemetry polling period
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Telemetry polling period
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn check_shutdown(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            warn!("Shutdown requested, not sending new command");
            return Err(Error::Interrupted);
        }
        Ok(())
    }
}

impl<'a, S> ArrivalNavigator<'a, S>
where
    S: Navigate + Telemetry + ?Sized,
{
    /// Fly to `target` and wait for arrival
    ///
    /// Sends one navigate command, then samples the distance to the target right away and every poll interval
    /// after that. Returns as soon as a sample is strictly under `target.tolerance`.
    ///
    /// # Errors
    /// - [Error::InvalidArgument] if a coordinate is not finite, or if the tolerance or the speed is not a positive
    ///   finite number, nothing is sent
    /// - [Error::Interrupted] if shutdown is requested before the command or while waiting
    /// - any error returned by the services
    pub async fn move_and_wait(&self, target: &TargetPose) -> Result<()> {
        if !(target.x.is_finite() && target.y.is_finite() && target.z.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "target must be finite, got ({}, {}, {})",
                target.x, target.y, target.z
            )));
        }
        if !(target.tolerance.is_finite() && target.tolerance > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "tolerance must be > 0, got {}",
                target.tolerance
            )));
        }
        if !(target.speed.is_finite() && target.speed > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "speed must be > 0, got {}",
                target.speed
            )));
        }
        self.check_shutdown()?;

        info!(
            "Navigating to ({:.2}, {:.2}, {:.2}) in frame '{}' at {} m/s",
            target.x, target.y, target.z, target.frame, target.speed
        );
        self.services.navigate(target).await?;

        loop {
            let telemetry = self.services.get_telemetry(NAVIGATE_TARGET_FRAME).await?;
            let distance = telemetry.distance();
            debug!("Distance to target: {:.3}", distance);

            if distance < target.tolerance {
                return Ok(());
            }

            sleep_or_shutdown(self.poll_interval, &self.shutdown).await?;
        }
    }
}

impl<'a, S> ArrivalNavigator<'a, S>
where
    S: Land + Telemetry + ?Sized,
{
    /// Land and wait for the vehicle to disarm
    ///
    /// Sends one land command, then reads the absolute telemetry right away and every poll interval after that.
    /// Returns once the vehicle reports it is disarmed.
    ///
    /// # Errors
    /// - [Error::Interrupted] if shutdown is requested before the command or while waiting
    /// - any error returned by the services
    pub async fn land_and_wait(&self) -> Result<()> {
        self.check_shutdown()?;

        info!("Landing");
        self.services.land().await?;

        loop {
            let telemetry = self.services.get_telemetry(DEFAULT_FRAME).await?;
            debug!("Altitude: {:.3}, armed: {}", telemetry.z, telemetry.armed);

            if !telemetry.armed {
                return Ok(());
            }

            sleep_or_shutdown(self.poll_interval, &self.shutdown).await?;
        }
    }
}
