//! Waypoints and their packed wire form.
//!
//! Internally a waypoint is a plain struct. Where an external system expects
//! the compact encoding it is packed into 32 bits as
//! `z | (x << 14) | (level << 28)`: 14 bits of z, 14 bits of x, 2 bits of level.

use serde::{Deserialize, Serialize};

/// Largest x or z coordinate representable in the packed form.
pub const MAX_COORD: u16 = 0x3FFF;
/// Largest level representable in the packed form.
pub const MAX_LEVEL: u8 = 0x3;

/// One tile of a computed route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: u16,
    pub z: u16,
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WaypointError {
    #[error("coordinate ({x}, {z}) exceeds 16383")]
    CoordinateOutOfRange { x: i64, z: i64 },
    #[error("level {0} exceeds 3")]
    LevelOutOfRange(i64),
}

impl Waypoint {
    pub const fn new(x: u16, z: u16, level: u8) -> Self {
        Self { x, z, level }
    }

    /// Build a waypoint from signed coordinates, rejecting values the packed
    /// form cannot hold.
    pub fn checked(x: i64, z: i64, level: i64) -> Result<Self, WaypointError> {
        if !(0..=i64::from(MAX_COORD)).contains(&x) || !(0..=i64::from(MAX_COORD)).contains(&z) {
            return Err(WaypointError::CoordinateOutOfRange { x, z });
        }
        if !(0..=i64::from(MAX_LEVEL)).contains(&level) {
            return Err(WaypointError::LevelOutOfRange(level));
        }
        Ok(Self::new(x as u16, z as u16, level as u8))
    }

    pub fn pack(self) -> u32 {
        (u32::from(self.z) & 0x3FFF)
            | ((u32::from(self.x) & 0x3FFF) << 14)
            | ((u32::from(self.level) & 0x3) << 28)
    }

    pub fn unpack(packed: u32) -> Self {
        Self {
            z: (packed & 0x3FFF) as u16,
            x: ((packed >> 14) & 0x3FFF) as u16,
            level: ((packed >> 28) & 0x3) as u8,
        }
    }

    /// Same tile, ignoring level.
    pub fn is_at(&self, x: u16, z: u16) -> bool {
        self.x == x && self.z == z
    }
}
