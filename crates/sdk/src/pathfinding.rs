//! Route planning from the bot's cached position.

use std::sync::Arc;

use rsbot_pathfinding::{bundled_grid, CollisionGrid, PathError, Route};

use crate::sdk::BotSdk;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdkPathError {
    #[error("No player state available")]
    NoPlayerState,
    #[error("Collision data unavailable: {0}")]
    CollisionData(String),
    #[error(transparent)]
    Path(#[from] PathError),
}

impl BotSdk {
    /// Plan a route from the player's current tile to `(dest_x, dest_z)` on
    /// the same level. Pure computation over the cached snapshot; nothing is
    /// sent to the gateway.
    pub fn find_path(
        &self,
        dest_x: i32,
        dest_z: i32,
        max_waypoints: usize,
    ) -> Result<Route, SdkPathError> {
        let player = self.player().ok_or(SdkPathError::NoPlayerState)?;
        let grid = self.collision_grid()?;

        let route = grid.path_finder().find_long_path(
            player.level,
            player.world_x,
            player.world_z,
            dest_x,
            dest_z,
            max_waypoints,
        )?;
        tracing::debug!(
            from_x = player.world_x,
            from_z = player.world_z,
            dest_x,
            dest_z,
            waypoints = route.waypoint_count(),
            reached = route.reached_destination,
            "Route planned"
        );
        Ok(route)
    }

    fn collision_grid(&self) -> Result<&Arc<CollisionGrid>, SdkPathError> {
        self.inner()
            .collision
            .get_or_try_init(bundled_grid)
            .map_err(|err| SdkPathError::CollisionData(err.to_string()))
    }
}
