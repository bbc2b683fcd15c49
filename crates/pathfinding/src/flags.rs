//! Collision flag bits as stored per tile in the collision map.

use bitflags::bitflags;

bitflags! {
    /// Per-tile collision bits.
    ///
    /// Wall bits describe which edge or corner of the tile carries a wall;
    /// `LOC`, `FLOOR` and `FLOOR_DECORATION` block the whole tile. Bits this
    /// type has no name for are kept as-is (`from_bits_retain`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionFlags: u32 {
        const WALL_NORTH_WEST = 0x1;
        const WALL_NORTH = 0x2;
        const WALL_NORTH_EAST = 0x4;
        const WALL_EAST = 0x8;
        const WALL_SOUTH_EAST = 0x10;
        const WALL_SOUTH = 0x20;
        const WALL_SOUTH_WEST = 0x40;
        const WALL_WEST = 0x80;
        const LOC = 0x100;
        const FLOOR_DECORATION = 0x40000;
        const NPC = 0x80000;
        const PLAYER = 0x100000;
        const FLOOR = 0x200000;
        const ROOF = 0x8000_0000;

        const WALK_BLOCKED = Self::LOC.bits() | Self::FLOOR.bits() | Self::FLOOR_DECORATION.bits();

        // Masks checked on the tile being entered

        const BLOCK_WEST = Self::WALL_EAST.bits() | Self::WALK_BLOCKED.bits();
        const BLOCK_EAST = Self::WALL_WEST.bits() | Self::WALK_BLOCKED.bits();
        const BLOCK_SOUTH = Self::WALL_NORTH.bits() | Self::WALK_BLOCKED.bits();
        const BLOCK_NORTH = Self::WALL_SOUTH.bits() | Self::WALK_BLOCKED.bits();

        const BLOCK_SOUTH_WEST = Self::WALL_NORTH.bits()
            | Self::WALL_NORTH_EAST.bits()
            | Self::WALL_EAST.bits()
            | Self::WALK_BLOCKED.bits();
        const BLOCK_SOUTH_EAST = Self::WALL_NORTH_WEST.bits()
            | Self::WALL_NORTH.bits()
            | Self::WALL_WEST.bits()
            | Self::WALK_BLOCKED.bits();
        const BLOCK_NORTH_WEST = Self::WALL_EAST.bits()
            | Self::WALL_SOUTH_EAST.bits()
            | Self::WALL_SOUTH.bits()
            | Self::WALK_BLOCKED.bits();
        const BLOCK_NORTH_EAST = Self::WALL_SOUTH.bits()
            | Self::WALL_SOUTH_WEST.bits()
            | Self::WALL_WEST.bits()
            | Self::WALK_BLOCKED.bits();
    }
}

impl CollisionFlags {
    /// True when nothing prevents standing on the tile.
    pub fn is_walkable(self) -> bool {
        !self.intersects(Self::WALK_BLOCKED)
    }
}

/// One of the eight moves a walker can make from a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    West,
    East,
    South,
    North,
    SouthWest,
    SouthEast,
    NorthWest,
    NorthEast,
}

impl Direction {
    /// Expansion order used by the route search.
    pub const ALL: [Direction; 8] = [
        Direction::West,
        Direction::East,
        Direction::South,
        Direction::North,
        Direction::SouthWest,
        Direction::SouthEast,
        Direction::NorthWest,
        Direction::NorthEast,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::North => (0, 1),
            Direction::SouthWest => (-1, -1),
            Direction::SouthEast => (1, -1),
            Direction::NorthWest => (-1, 1),
            Direction::NorthEast => (1, 1),
        }
    }

    /// Mask that must be clear on the tile this move enters.
    pub const fn block_mask(self) -> CollisionFlags {
        match self {
            Direction::West => CollisionFlags::BLOCK_WEST,
            Direction::East => CollisionFlags::BLOCK_EAST,
            Direction::South => CollisionFlags::BLOCK_SOUTH,
            Direction::North => CollisionFlags::BLOCK_NORTH,
            Direction::SouthWest => CollisionFlags::BLOCK_SOUTH_WEST,
            Direction::SouthEast => CollisionFlags::BLOCK_SOUTH_EAST,
            Direction::NorthWest => CollisionFlags::BLOCK_NORTH_WEST,
            Direction::NorthEast => CollisionFlags::BLOCK_NORTH_EAST,
        }
    }

    /// The two orthogonal moves a diagonal cuts between.
    pub const fn components(self) -> Option<(Direction, Direction)> {
        match self {
            Direction::SouthWest => Some((Direction::West, Direction::South)),
            Direction::SouthEast => Some((Direction::East, Direction::South)),
            Direction::NorthWest => Some((Direction::West, Direction::North)),
            Direction::NorthEast => Some((Direction::East, Direction::North)),
            _ => None,
        }
    }
}
