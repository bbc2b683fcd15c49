//! rsbot Pathfinding - Collision grid and client-side route search
//!
//! The grid is filled once from a collision dataset and is read-only
//! afterwards, so it is shared between callers behind an `Arc`.

pub mod dataset;
pub mod finder;
pub mod flags;
pub mod grid;

pub use dataset::{bundled_grid, load_grid, CollisionData, DatasetError};
pub use finder::{
    PathError, PathFinder, Route, LONG_SEARCH_SIZE, SHORT_MAX_WAYPOINTS, SHORT_SEARCH_SIZE,
};
pub use flags::{CollisionFlags, Direction};
pub use grid::{CollisionGrid, CollisionTile, GridError, LoadOutcome, ZoneKey, ZONE_SIZE};

