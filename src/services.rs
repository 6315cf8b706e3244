//! # Flight services
//!
//! The flight controller is reached through four independent services: navigation, telemetry, landing and the
//! onboard LED indicator. Each of them is a small async trait so that code driving a drone only asks for the
//! capabilities it needs, and so that a simulated vehicle or a test fake can stand in for the real thing.
//!
//! All service calls are acknowledgements only: [Navigate::navigate] and [Land::land] return as soon as the
//! flight controller accepted the command, the motion itself happens asynchronously. Use
//! [ArrivalNavigator](crate::subsystems::navigator::ArrivalNavigator) to wait for completion.

use async_trait::async_trait;

use crate::Result;

/// World frame, fixed to the flight arena.
pub const WORLD_FRAME: &str = "map";
/// Frame centered on the active navigation target: a position expressed in it is the error to the target.
pub const NAVIGATE_TARGET_FRAME: &str = "navigate_target";
/// Empty frame name, the flight controller picks its default frame.
pub const DEFAULT_FRAME: &str = "";

/// Default cruise speed in m/s
pub const DEFAULT_SPEED: f32 = 0.5;
/// Default arrival tolerance in m
pub const DEFAULT_TOLERANCE: f32 = 0.2;

/// # Navigation request
///
/// Ephemeral request value, built for one navigation call and dropped once arrival is confirmed.
///
/// ```
/// # use formation_flight::services::{TargetPose, WORLD_FRAME};
/// let pose = TargetPose::new(0.0, 0.0, 1.5)
///     .in_frame(WORLD_FRAME)
///     .with_auto_arm(true);
/// assert_eq!(pose.speed, 0.5);
/// assert!(pose.yaw.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPose {
    /// Target x position (m)
    pub x: f32,
    /// Target y position (m)
    pub y: f32,
    /// Target z position (m)
    pub z: f32,
    /// Target yaw (rad). `None` keeps the current heading.
    pub yaw: Option<f32>,
    /// Cruise speed (m/s)
    pub speed: f32,
    /// Frame the coordinates are expressed in
    pub frame: String,
    /// Arm the vehicle as part of the command
    pub auto_arm: bool,
    /// Distance to the target (m) under which the vehicle is considered arrived
    pub tolerance: f32,
}

impl TargetPose {
    /// Target at `(x, y, z)` with default heading, speed, frame, auto-arm and tolerance
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            yaw: None,
            speed: DEFAULT_SPEED,
            frame: DEFAULT_FRAME.to_owned(),
            auto_arm: false,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Set the target heading
    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = Some(yaw);
        self
    }

    /// Set the cruise speed
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set the frame the coordinates are expressed in
    pub fn in_frame(mut self, frame: &str) -> Self {
        self.frame = frame.to_owned();
        self
    }

    /// Enable or disable auto-arm
    pub fn with_auto_arm(mut self, auto_arm: bool) -> Self {
        self.auto_arm = auto_arm;
        self
    }

    /// Set the arrival tolerance
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Yaw as sent to the flight controller, NaN meaning "hold current heading"
    pub fn yaw_or_nan(&self) -> f32 {
        self.yaw.unwrap_or(f32::NAN)
    }
}

/// Telemetry sample, position expressed in the frame it was requested in
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetrySample {
    /// x position (m)
    pub x: f32,
    /// y position (m)
    pub y: f32,
    /// z position (m)
    pub z: f32,
    /// Heading (rad)
    pub yaw: f32,
    /// Motors armed
    pub armed: bool,
}

impl TelemetrySample {
    /// Euclidean norm of the position
    ///
    /// When the sample is expressed in [NAVIGATE_TARGET_FRAME], this is the distance to the target.
    pub fn distance(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Onboard LED indicator effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Solid color
    Fill {
        /// Red
        r: u8,
        /// Green
        g: u8,
        /// Blue
        b: u8,
    },
    /// Named animation implemented by the flight controller, for example `rainbow`
    Animation(String),
}

impl Effect {
    /// Solid blue
    pub const BLUE: Effect = Effect::Fill { r: 0, g: 0, b: 255 };
    /// Solid white
    pub const WHITE: Effect = Effect::Fill { r: 255, g: 255, b: 255 };

    /// Rainbow animation
    pub fn rainbow() -> Self {
        Effect::Animation("rainbow".to_owned())
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Fill { r, g, b } => write!(f, "fill({}, {}, {})", r, g, b),
            Effect::Animation(name) => write!(f, "{}", name),
        }
    }
}

/// Fire-and-forget motion toward a point
#[async_trait]
pub trait Navigate: Send + Sync {
    /// Start flying toward `target`. Returns once the command is accepted.
    async fn navigate(&self, target: &TargetPose) -> Result<()>;
}

/// Position and arming state readout
#[async_trait]
pub trait Telemetry: Send + Sync {
    /// Current telemetry expressed in `frame`
    ///
    /// [NAVIGATE_TARGET_FRAME] gives the error to the active target, [DEFAULT_FRAME] gives absolute telemetry.
    async fn get_telemetry(&self, frame: &str) -> Result<TelemetrySample>;
}

/// Fire-and-forget landing
#[async_trait]
pub trait Land: Send + Sync {
    /// Start descending. The vehicle disarms once on the ground.
    async fn land(&self) -> Result<()>;
}

/// LED indicator
#[async_trait]
pub trait SetEffect: Send + Sync {
    /// Change the indicator effect
    async fn set_effect(&self, effect: &Effect) -> Result<()>;
}

/// All the services needed to fly a full mission
pub trait FlightServices: Navigate + Telemetry + Land + SetEffect {}

impl<T> FlightServices for T where T: Navigate + Telemetry + Land + SetEffect {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_yaw_is_sent_as_nan() {
        assert!(TargetPose::new(1.0, 2.0, 3.0).yaw_or_nan().is_nan());
        assert_eq!(TargetPose::new(1.0, 2.0, 3.0).with_yaw(0.5).yaw_or_nan(), 0.5);
    }

    #[test]
    fn target_pose_defaults() {
        let pose = TargetPose::new(1.0, 2.0, 3.0);
        assert_eq!(pose.frame, DEFAULT_FRAME);
        assert_eq!(pose.tolerance, DEFAULT_TOLERANCE);
        assert!(!pose.auto_arm);
    }

    #[test]
    fn distance_is_euclidean() {
        let sample = TelemetrySample { x: 3.0, y: 0.0, z: 4.0, yaw: 0.0, armed: true };
        assert_eq!(sample.distance(), 5.0);
    }

    #[test]
    fn effect_display() {
        assert_eq!(Effect::BLUE.to_string(), "fill(0, 0, 255)");
        assert_eq!(Effect::rainbow().to_string(), "rainbow");
    }
}
