//! # Simulated flight controller
//!
//! A point-mass quadrotor living in a background tokio task. It implements the four
//! [flight services](crate::services) so that missions can be flown, and tested, without hardware.
//!
//! The vehicle flies in a straight line toward its navigation target at the requested speed, lands by
//! descending vertically at a fixed rate and disarms once on the ground. There is no dynamics, no wind and no
//! collision: arrival is only a matter of time.
//!
//! ``` no_run
//! # use formation_flight::simulator::{SimConfig, SimulatedDrone};
//! # async fn example() {
//! let drone = SimulatedDrone::spawn(SimConfig::default());
//! // Fly a mission with `&drone` ...
//! drone.disconnect().await;
//! # }
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flume::{Receiver, Sender};
use futures::lock::Mutex;
use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::{
    Effect, Land, Navigate, SetEffect, TargetPose, Telemetry, TelemetrySample, DEFAULT_FRAME,
    NAVIGATE_TARGET_FRAME, WORLD_FRAME,
};
use crate::{Error, Result};

/// Simulated vehicle parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Integration period
    pub tick: Duration,
    /// Navigation speeds above this are clamped (m/s)
    pub max_speed: f32,
    /// Vertical speed while landing (m/s)
    pub descent_rate: f32,
    /// Initial position in the world frame (m)
    pub start_position: [f32; 3],
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(20),
            max_speed: 2.0,
            descent_rate: 0.5,
            start_position: [0.0, 0.0, 0.0],
        }
    }
}

enum Command {
    Navigate(TargetPose, Sender<Result<()>>),
    Land(Sender<Result<()>>),
    SetEffect(Effect, Sender<Result<()>>),
    GetTelemetry(String, Sender<Result<TelemetrySample>>),
    GetEffect(Sender<Result<Option<Effect>>>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Idle,
    Navigating { speed: f32 },
    Landing,
}

struct Vehicle {
    position: [f32; 3],
    yaw: f32,
    target: [f32; 3],
    armed: bool,
    mode: Mode,
    effect: Option<Effect>,
    config: SimConfig,
}

impl Vehicle {
    fn new(config: SimConfig) -> Self {
        Self {
            position: config.start_position,
            yaw: 0.0,
            target: config.start_position,
            armed: false,
            mode: Mode::Idle,
            effect: None,
            config,
        }
    }

    fn handle(&mut self, command: Command) {
        // A reply channel can only fail if the caller gave up waiting, nothing to do then
        match command {
            Command::Navigate(target, reply) => {
                let _ = reply.send(self.navigate(&target));
            }
            Command::Land(reply) => {
                let _ = reply.send(self.land());
            }
            Command::SetEffect(effect, reply) => {
                debug!("Simulated LED effect: {}", effect);
                self.effect = Some(effect);
                let _ = reply.send(Ok(()));
            }
            Command::GetTelemetry(frame, reply) => {
                let _ = reply.send(self.telemetry(&frame));
            }
            Command::GetEffect(reply) => {
                let _ = reply.send(Ok(self.effect.clone()));
            }
        }
    }

    fn navigate(&mut self, target: &TargetPose) -> Result<()> {
        let point = [target.x, target.y, target.z];
        self.target = match target.frame.as_str() {
            WORLD_FRAME | DEFAULT_FRAME => point,
            NAVIGATE_TARGET_FRAME => add(self.target, point),
            other => return Err(Error::ServiceError(format!("unknown frame '{}'", other))),
        };
        if !target.yaw_or_nan().is_nan() {
            self.yaw = target.yaw_or_nan();
        }

        if target.auto_arm && !self.armed {
            info!("Simulated drone armed");
            self.armed = true;
        }
        self.mode = if self.armed {
            Mode::Navigating {
                speed: target.speed.min(self.config.max_speed),
            }
        } else {
            Mode::Idle
        };
        Ok(())
    }

    fn land(&mut self) -> Result<()> {
        if self.armed {
            self.mode = Mode::Landing;
        }
        Ok(())
    }

    fn telemetry(&self, frame: &str) -> Result<TelemetrySample> {
        let [x, y, z] = match frame {
            WORLD_FRAME | DEFAULT_FRAME => self.position,
            NAVIGATE_TARGET_FRAME => sub(self.position, self.target),
            other => return Err(Error::ServiceError(format!("unknown frame '{}'", other))),
        };
        Ok(TelemetrySample {
            x,
            y,
            z,
            yaw: self.yaw,
            armed: self.armed,
        })
    }

    fn step(&mut self, dt: f32) {
        match self.mode {
            Mode::Idle => (),
            Mode::Navigating { speed } => {
                let error = sub(self.target, self.position);
                let distance = norm(error);
                let travel = speed * dt;
                if distance <= travel {
                    self.position = self.target;
                } else {
                    self.position = add(self.position, scale(error, travel / distance));
                }
            }
            Mode::Landing => {
                let z = self.position[2] - self.config.descent_rate * dt;
                if z <= 0.0 {
                    self.position[2] = 0.0;
                    self.target = self.position;
                    self.armed = false;
                    self.mode = Mode::Idle;
                    info!("Simulated drone landed and disarmed");
                } else {
                    self.position[2] = z;
                }
            }
        }
    }
}

fn add(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: [f32; 3], k: f32) -> [f32; 3] {
    [a[0] * k, a[1] * k, a[2] * k]
}

fn norm(a: [f32; 3]) -> f32 {
    (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

/// # Simulated drone
///
/// Handle to a simulated vehicle. Like a real connection, it is one-time use: once disconnected, either by
/// calling [SimulatedDrone::disconnect()] or by dropping the handle, every service call returns
/// [Error::Disconnected].
pub struct SimulatedDrone {
    uplink: Sender<Command>,
    sim_task: Mutex<Option<JoinHandle<()>>>,
    disconnect: Arc<AtomicBool>,
}

impl SimulatedDrone {
    /// Start a simulated vehicle, disarmed at `config.start_position`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: SimConfig) -> Self {
        let disconnect = Arc::new(AtomicBool::new(false));
        let (uplink, rx) = flume::unbounded();

        let disconnect_sim = disconnect.clone();
        let sim_task = tokio::spawn(run_vehicle(Vehicle::new(config), rx, disconnect_sim));

        SimulatedDrone {
            uplink,
            sim_task: Mutex::new(Some(sim_task)),
            disconnect,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(Sender<Result<T>>) -> Command) -> Result<T> {
        let (reply, answer) = flume::bounded(1);
        self.uplink.send_async(command(reply)).await?;
        answer.recv_async().await?
    }

    /// LED effect currently displayed
    pub async fn current_effect(&self) -> Result<Option<Effect>> {
        self.request(Command::GetEffect).await
    }

    /// Stop the simulation
    ///
    /// Once this function returns, the simulation task has exited.
    pub async fn disconnect(&self) {
        self.disconnect.store(true, Relaxed);

        if let Some(sim_task) = self.sim_task.lock().await.take() {
            let _ = sim_task.await;
        }
    }
}

impl Drop for SimulatedDrone {
    fn drop(&mut self) {
        self.disconnect.store(true, Relaxed);
    }
}

async fn run_vehicle(mut vehicle: Vehicle, downlink: Receiver<Command>, disconnect: Arc<AtomicBool>) {
    let dt = vehicle.config.tick.as_secs_f32();
    let mut ticker = tokio::time::interval(vehicle.config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !disconnect.load(Relaxed) {
        tokio::select! {
            command = downlink.recv_async() => match command {
                Ok(command) => vehicle.handle(command),
                Err(flume::RecvError::Disconnected) => return,
            },
            _ = ticker.tick() => vehicle.step(dt),
        }
    }
}

#[async_trait]
impl Navigate for SimulatedDrone {
    async fn navigate(&self, target: &TargetPose) -> Result<()> {
        let target = target.clone();
        self.request(|reply| Command::Navigate(target, reply)).await
    }
}

#[async_trait]
impl Telemetry for SimulatedDrone {
    async fn get_telemetry(&self, frame: &str) -> Result<TelemetrySample> {
        let frame = frame.to_owned();
        self.request(|reply| Command::GetTelemetry(frame, reply)).await
    }
}

#[async_trait]
impl Land for SimulatedDrone {
    async fn land(&self) -> Result<()> {
        self.request(Command::Land).await
    }
}

#[async_trait]
impl SetEffect for SimulatedDrone {
    async fn set_effect(&self, effect: &Effect) -> Result<()> {
        let effect = effect.clone();
        self.request(|reply| Command::SetEffect(effect, reply)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::navigator::ArrivalNavigator;
    use tokio::time::{sleep, Instant};
    use tokio_util::sync::CancellationToken;

    fn takeoff() -> TargetPose {
        TargetPose::new(0.0, 0.0, 1.5)
            .in_frame(WORLD_FRAME)
            .with_auto_arm(true)
    }

    #[tokio::test(start_paused = true)]
    async fn auto_arm_takeoff_reaches_target() {
        let drone = SimulatedDrone::spawn(SimConfig::default());
        let navigator = ArrivalNavigator::new(&drone, CancellationToken::new());

        let start = Instant::now();
        navigator.move_and_wait(&takeoff()).await.unwrap();

        // 1.3 m to cover before entering the 0.2 m tolerance, at 0.5 m/s
        assert!(start.elapsed() >= Duration::from_millis(2_400));
        assert!(start.elapsed() <= Duration::from_millis(3_000));

        let telemetry = drone.get_telemetry(WORLD_FRAME).await.unwrap();
        assert!(telemetry.armed);
        assert!((telemetry.z - 1.5).abs() < 0.2);
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_drone_does_not_move_without_auto_arm() {
        let drone = SimulatedDrone::spawn(SimConfig::default());

        drone
            .navigate(&TargetPose::new(1.0, 1.0, 1.0).in_frame(WORLD_FRAME))
            .await
            .unwrap();
        sleep(Duration::from_secs(5)).await;

        let telemetry = drone.get_telemetry(DEFAULT_FRAME).await.unwrap();
        assert_eq!(telemetry, TelemetrySample::default());

        let error = drone.get_telemetry(NAVIGATE_TARGET_FRAME).await.unwrap();
        assert_eq!((error.x, error.y, error.z), (-1.0, -1.0, -1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn navigate_target_frame_is_relative_to_current_target() {
        let drone = SimulatedDrone::spawn(SimConfig::default());

        drone.navigate(&takeoff()).await.unwrap();
        drone
            .navigate(&TargetPose::new(1.0, 0.0, 0.0).in_frame(NAVIGATE_TARGET_FRAME))
            .await
            .unwrap();

        // The vehicle may already have started climbing
        let error = drone.get_telemetry(NAVIGATE_TARGET_FRAME).await.unwrap();
        assert!((error.x + 1.0).abs() < 0.05);
        assert!(error.y.abs() < 0.05);
        assert!((error.z + 1.5).abs() < 0.05);
    }

    #[tokio::test(start_paused = true)]
    async fn landing_disarms_on_the_ground() {
        let drone = SimulatedDrone::spawn(SimConfig::default());
        let navigator = ArrivalNavigator::new(&drone, CancellationToken::new());

        navigator.move_and_wait(&takeoff()).await.unwrap();
        navigator.land_and_wait().await.unwrap();

        let telemetry = drone.get_telemetry(DEFAULT_FRAME).await.unwrap();
        assert!(!telemetry.armed);
        assert_eq!(telemetry.z, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_frame_is_a_service_error() {
        let drone = SimulatedDrone::spawn(SimConfig::default());

        assert!(matches!(
            drone.get_telemetry("aruco_map").await,
            Err(Error::ServiceError(_))
        ));
        assert!(matches!(
            drone.navigate(&TargetPose::new(0.0, 0.0, 1.0).in_frame("body")).await,
            Err(Error::ServiceError(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn effect_is_recorded() {
        let drone = SimulatedDrone::spawn(SimConfig::default());
        assert_eq!(drone.current_effect().await.unwrap(), None);

        drone.set_effect(&Effect::rainbow()).await.unwrap();
        assert_eq!(drone.current_effect().await.unwrap(), Some(Effect::rainbow()));
    }

    #[tokio::test(start_paused = true)]
    async fn unspecified_yaw_keeps_heading() {
        let drone = SimulatedDrone::spawn(SimConfig::default());

        drone.navigate(&takeoff().with_yaw(1.0)).await.unwrap();
        drone.navigate(&takeoff()).await.unwrap();
        assert_eq!(drone.get_telemetry(WORLD_FRAME).await.unwrap().yaw, 1.0);

        drone.navigate(&takeoff().with_yaw(-0.5)).await.unwrap();
        assert_eq!(drone.get_telemetry(WORLD_FRAME).await.unwrap().yaw, -0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_simulation() {
        let drone = SimulatedDrone::spawn(SimConfig::default());
        let uplink = drone.uplink.clone();
        drop(drone);

        // The task notices on its next tick and drops its receiver
        sleep(Duration::from_millis(100)).await;

        let (reply, _answer) = flume::bounded(1);
        assert!(uplink.send_async(Command::Land(reply)).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn calls_fail_once_disconnected() {
        let drone = SimulatedDrone::spawn(SimConfig::default());
        drone.disconnect().await;

        assert_eq!(drone.land().await, Err(Error::Disconnected));
        assert_eq!(
            drone.get_telemetry(DEFAULT_FRAME).await,
            Err(Error::Disconnected)
        );
    }
}
