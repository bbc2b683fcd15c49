//! Sparse collision map split into 8x8 zones per level.
//!
//! A tile can only be read or written once its zone is allocated. Reads of an
//! unallocated tile return `None`, which the route search treats as a wall.

use std::collections::HashMap;

use rsbot_protocol::{MAX_COORD, MAX_LEVEL};
use serde::Deserialize;

use crate::flags::CollisionFlags;

/// Tiles along one side of a zone.
pub const ZONE_SIZE: i32 = 8;
const ZONE_TILES: usize = (ZONE_SIZE * ZONE_SIZE) as usize;

/// `(level, x >> 3, z >> 3)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneKey {
    pub level: u8,
    pub zone_x: u16,
    pub zone_z: u16,
}

impl ZoneKey {
    /// Zone containing a tile, or `None` when the tile is outside the map.
    pub fn of(level: i32, x: i32, z: i32) -> Option<Self> {
        if !in_bounds(level, x, z) {
            return None;
        }
        Some(Self {
            level: level as u8,
            zone_x: (x >> 3) as u16,
            zone_z: (z >> 3) as u16,
        })
    }
}

fn in_bounds(level: i32, x: i32, z: i32) -> bool {
    (0..=i32::from(MAX_LEVEL)).contains(&level)
        && (0..=i32::from(MAX_COORD)).contains(&x)
        && (0..=i32::from(MAX_COORD)).contains(&z)
}

fn tile_index(x: i32, z: i32) -> usize {
    ((x & 0x7) | ((z & 0x7) << 3)) as usize
}

/// One `[level, x, z, flags]` entry of a collision dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(i32, i32, i32, u32)")]
pub struct CollisionTile {
    pub level: i32,
    pub x: i32,
    pub z: i32,
    pub flags: u32,
}

impl From<(i32, i32, i32, u32)> for CollisionTile {
    fn from((level, x, z, flags): (i32, i32, i32, u32)) -> Self {
        Self { level, x, z, flags }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("tile ({x}, {z}) on level {level} is outside the map")]
    OutOfBounds { level: i32, x: i32, z: i32 },
    #[error("zone for tile ({x}, {z}) on level {level} is not allocated")]
    ZoneNotAllocated { level: i32, x: i32, z: i32 },
}

/// Outcome of [`CollisionGrid::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { tiles: usize, zones: usize },
    AlreadyInitialized,
}

#[derive(Debug, Default)]
pub struct CollisionGrid {
    zones: HashMap<ZoneKey, Box<[u32; ZONE_TILES]>>,
    initialized: bool,
}

impl CollisionGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from dataset tiles in one step.
    pub fn from_tiles(tiles: impl IntoIterator<Item = CollisionTile>) -> Result<Self, GridError> {
        let mut grid = Self::new();
        grid.load(tiles)?;
        Ok(grid)
    }

    /// Apply a dataset. Once a load has succeeded further calls do nothing.
    ///
    /// Every tile is validated before the grid is touched, so a rejected
    /// dataset leaves the grid as it was.
    pub fn load(
        &mut self,
        tiles: impl IntoIterator<Item = CollisionTile>,
    ) -> Result<LoadOutcome, GridError> {
        if self.initialized {
            return Ok(LoadOutcome::AlreadyInitialized);
        }

        let mut staged: HashMap<ZoneKey, Box<[u32; ZONE_TILES]>> = HashMap::new();
        let mut count = 0usize;
        for tile in tiles {
            let key = ZoneKey::of(tile.level, tile.x, tile.z).ok_or(GridError::OutOfBounds {
                level: tile.level,
                x: tile.x,
                z: tile.z,
            })?;
            let zone = staged.entry(key).or_insert_with(|| Box::new([0; ZONE_TILES]));
            zone[tile_index(tile.x, tile.z)] = tile.flags;
            count += 1;
        }

        let zones = staged.len();
        self.zones.extend(staged);
        self.initialized = true;
        Ok(LoadOutcome::Loaded {
            tiles: count,
            zones,
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Allocate the zone holding a tile; returns true if it was newly created.
    pub fn allocate_if_absent(&mut self, level: i32, x: i32, z: i32) -> Result<bool, GridError> {
        let key = ZoneKey::of(level, x, z).ok_or(GridError::OutOfBounds { level, x, z })?;
        let mut created = false;
        self.zones.entry(key).or_insert_with(|| {
            created = true;
            Box::new([0; ZONE_TILES])
        });
        Ok(created)
    }

    pub fn is_zone_allocated(&self, level: i32, x: i32, z: i32) -> bool {
        ZoneKey::of(level, x, z).is_some_and(|key| self.zones.contains_key(&key))
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Flags of a tile, `None` when its zone is not allocated.
    pub fn get(&self, level: i32, x: i32, z: i32) -> Option<CollisionFlags> {
        let key = ZoneKey::of(level, x, z)?;
        self.zones
            .get(&key)
            .map(|zone| CollisionFlags::from_bits_retain(zone[tile_index(x, z)]))
    }

    pub fn set(
        &mut self,
        level: i32,
        x: i32,
        z: i32,
        flags: CollisionFlags,
    ) -> Result<(), GridError> {
        *self.tile_mut(level, x, z)? = flags.bits();
        Ok(())
    }

    pub fn add(
        &mut self,
        level: i32,
        x: i32,
        z: i32,
        flags: CollisionFlags,
    ) -> Result<(), GridError> {
        *self.tile_mut(level, x, z)? |= flags.bits();
        Ok(())
    }

    pub fn remove(
        &mut self,
        level: i32,
        x: i32,
        z: i32,
        flags: CollisionFlags,
    ) -> Result<(), GridError> {
        *self.tile_mut(level, x, z)? &= !flags.bits();
        Ok(())
    }

    fn tile_mut(&mut self, level: i32, x: i32, z: i32) -> Result<&mut u32, GridError> {
        let key = ZoneKey::of(level, x, z).ok_or(GridError::OutOfBounds { level, x, z })?;
        let zone = self
            .zones
            .get_mut(&key)
            .ok_or(GridError::ZoneNotAllocated { level, x, z })?;
        Ok(&mut zone[tile_index(x, z)])
    }
}
