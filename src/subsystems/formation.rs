//! # Square formation
//!
//! Four drones hold the corners of a 2 m square centered on a reference point of the arena. Each drone is told
//! which corner it owns by its drone number, 1 to 4:
//!
//! | Number | Corner      | Offset   |
//! |--------|-------------|----------|
//! | 1      | lower left  | (-1, -1) |
//! | 2      | lower right | (1, -1)  |
//! | 3      | upper left  | (-1, 1)  |
//! | 4      | upper right | (1, 1)   |

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{Error, Result};

/// Corner of the square formation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum FormationSlot {
    /// Drone 1
    LowerLeft = 1,
    /// Drone 2
    LowerRight = 2,
    /// Drone 3
    UpperLeft = 3,
    /// Drone 4
    UpperRight = 4,
}

impl FormationSlot {
    /// Every slot, in drone number order
    pub const ALL: [FormationSlot; 4] = [
        FormationSlot::LowerLeft,
        FormationSlot::LowerRight,
        FormationSlot::UpperLeft,
        FormationSlot::UpperRight,
    ];

    /// Slot owned by drone `number`
    ///
    /// ```
    /// # use formation_flight::subsystems::formation::FormationSlot;
    /// assert_eq!(FormationSlot::from_number(3).unwrap(), FormationSlot::UpperLeft);
    /// assert!(FormationSlot::from_number(5).is_err());
    /// ```
    pub fn from_number(number: u8) -> Result<Self> {
        Self::try_from_primitive(number).map_err(|_| {
            Error::InvalidArgument(format!("drone number must be 1 to 4, got {}", number))
        })
    }

    /// Drone number owning this slot
    pub fn number(self) -> u8 {
        self.into()
    }

    /// Offset `(dx, dy)` from the formation reference point, in meters
    pub fn offset(self) -> (f32, f32) {
        match self {
            FormationSlot::LowerLeft => (-1.0, -1.0),
            FormationSlot::LowerRight => (1.0, -1.0),
            FormationSlot::UpperLeft => (-1.0, 1.0),
            FormationSlot::UpperRight => (1.0, 1.0),
        }
    }

    /// Position of the slot around `reference` at `altitude`
    pub fn position(self, reference: (f32, f32), altitude: f32) -> (f32, f32, f32) {
        let (dx, dy) = self.offset();
        (reference.0 + dx, reference.1 + dy, altitude)
    }
}

impl std::fmt::Display for FormationSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormationSlot::LowerLeft => "lower left",
            FormationSlot::LowerRight => "lower right",
            FormationSlot::UpperLeft => "upper left",
            FormationSlot::UpperRight => "upper right",
        };
        write!(f, "{} (drone {})", name, self.number())
    }
}
