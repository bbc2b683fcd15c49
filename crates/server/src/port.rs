//! Pathfinding seam used by the HTTP handlers.

use std::sync::Arc;

use rsbot_pathfinding::{CollisionGrid, PathError, Route};

/// Route search as seen by the HTTP layer.
#[cfg_attr(test, mockall::automock)]
pub trait PathfindingPort: Send + Sync {
    fn find_long_path(
        &self,
        level: i32,
        src_x: i32,
        src_z: i32,
        dest_x: i32,
        dest_z: i32,
        max_waypoints: usize,
    ) -> Result<Route, PathError>;
}

/// In-process search over a loaded collision grid.
pub struct LocalPathfinder {
    grid: Arc<CollisionGrid>,
}

impl LocalPathfinder {
    pub fn new(grid: Arc<CollisionGrid>) -> Self {
        Self { grid }
    }
}

impl PathfindingPort for LocalPathfinder {
    fn find_long_path(
        &self,
        level: i32,
        src_x: i32,
        src_z: i32,
        dest_x: i32,
        dest_z: i32,
        max_waypoints: usize,
    ) -> Result<Route, PathError> {
        self.grid
            .path_finder()
            .find_long_path(level, src_x, src_z, dest_x, dest_z, max_waypoints)
    }
}
