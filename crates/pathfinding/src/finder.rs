//! Breadth-first route search over the collision grid.
//!
//! The search runs over a square window centred on the source. When the
//! destination cannot be reached it falls back to the reachable tile closest
//! to it, and the route is reported as an alternative.

use std::collections::VecDeque;

use rsbot_protocol::Waypoint;

use crate::flags::Direction;
use crate::grid::CollisionGrid;

/// Window side for [`PathFinder::find_path`].
pub const SHORT_SEARCH_SIZE: i32 = 128;
/// Window side for [`PathFinder::find_long_path`].
pub const LONG_SEARCH_SIZE: i32 = 512;
/// Waypoint budget for [`PathFinder::find_path`].
pub const SHORT_MAX_WAYPOINTS: usize = 25;
/// How far from the destination an alternative end tile may be.
pub const APPROACH_RADIUS: i32 = 10;
/// Alternative end tiles further than this many steps away are ignored.
pub const MAX_APPROACH_STEPS: u32 = 100;

const UNVISITED: u8 = u8::MAX;
const START: u8 = u8::MAX - 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error(
        "zone not allocated (source allocated: {src_zone_allocated}, destination allocated: {dest_zone_allocated})"
    )]
    ZoneNotAllocated {
        src_zone_allocated: bool,
        dest_zone_allocated: bool,
    },
}

/// A computed route.
///
/// `waypoints` holds the turn points after the source, nearest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Route {
    pub waypoints: Vec<Waypoint>,
    pub reached_destination: bool,
    /// The route ends on the closest reachable tile, not the destination.
    pub alternative: bool,
}

impl Route {
    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    /// Waypoints in their packed 32-bit form.
    pub fn packed(&self) -> Vec<u32> {
        self.waypoints.iter().map(|w| w.pack()).collect()
    }
}

impl CollisionGrid {
    pub fn path_finder(&self) -> PathFinder<'_> {
        PathFinder::new(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tile {
    x: i32,
    z: i32,
}

pub struct PathFinder<'a> {
    grid: &'a CollisionGrid,
}

impl<'a> PathFinder<'a> {
    pub fn new(grid: &'a CollisionGrid) -> Self {
        Self { grid }
    }

    /// Short-range search, capped at [`SHORT_MAX_WAYPOINTS`].
    pub fn find_path(
        &self,
        level: i32,
        src_x: i32,
        src_z: i32,
        dest_x: i32,
        dest_z: i32,
    ) -> Result<Route, PathError> {
        self.search(
            level,
            Tile { x: src_x, z: src_z },
            Tile { x: dest_x, z: dest_z },
            SHORT_SEARCH_SIZE,
            SHORT_MAX_WAYPOINTS,
        )
    }

    /// Long-range search over a wider window with a caller-chosen budget.
    pub fn find_long_path(
        &self,
        level: i32,
        src_x: i32,
        src_z: i32,
        dest_x: i32,
        dest_z: i32,
        max_waypoints: usize,
    ) -> Result<Route, PathError> {
        self.search(
            level,
            Tile { x: src_x, z: src_z },
            Tile { x: dest_x, z: dest_z },
            LONG_SEARCH_SIZE,
            max_waypoints,
        )
    }

    fn search(
        &self,
        level: i32,
        src: Tile,
        dest: Tile,
        size: i32,
        max_waypoints: usize,
    ) -> Result<Route, PathError> {
        let src_zone_allocated = self.grid.is_zone_allocated(level, src.x, src.z);
        let dest_zone_allocated = self.grid.is_zone_allocated(level, dest.x, dest.z);
        if !src_zone_allocated || !dest_zone_allocated {
            return Err(PathError::ZoneNotAllocated {
                src_zone_allocated,
                dest_zone_allocated,
            });
        }

        if src == dest {
            return Ok(Route {
                waypoints: Vec::new(),
                reached_destination: true,
                alternative: false,
            });
        }

        let window = Window::centred_on(src, size);
        let mut steps = vec![UNVISITED; window.area()];
        let mut distances = vec![u32::MAX; window.area()];
        let mut queue = VecDeque::new();

        let start = window.index(src).unwrap_or_default();
        steps[start] = START;
        distances[start] = 0;
        queue.push_back(src);

        let mut found = false;
        while let Some(current) = queue.pop_front() {
            if current == dest {
                found = true;
                break;
            }
            let Some(current_index) = window.index(current) else {
                continue;
            };
            let next_distance = distances[current_index] + 1;

            for (step, direction) in Direction::ALL.iter().enumerate() {
                let (dx, dz) = direction.delta();
                let next = Tile {
                    x: current.x + dx,
                    z: current.z + dz,
                };
                let Some(next_index) = window.index(next) else {
                    continue;
                };
                if steps[next_index] != UNVISITED || !self.can_step(level, current, *direction) {
                    continue;
                }
                steps[next_index] = step as u8;
                distances[next_index] = next_distance;
                queue.push_back(next);
            }
        }

        let end = if found {
            dest
        } else {
            match closest_approach(&window, &distances, dest) {
                Some(tile) => tile,
                None => return Ok(Route::default()),
            }
        };

        let mut waypoints = backtrack(&window, &steps, src, end, level);
        waypoints.truncate(max_waypoints);

        let reached_destination = waypoints
            .last()
            .is_some_and(|last| i32::from(last.x) == dest.x && i32::from(last.z) == dest.z);

        Ok(Route {
            waypoints,
            reached_destination,
            alternative: !found,
        })
    }

    /// Whether a walker on `from` may move one tile in `direction`.
    ///
    /// Diagonal moves also need both orthogonal moves they cut between to be
    /// open. Tiles in unallocated zones block every move into them.
    pub(crate) fn can_step(&self, level: i32, from: Tile, direction: Direction) -> bool {
        let enters = |direction: Direction| {
            let (dx, dz) = direction.delta();
            self.grid
                .get(level, from.x + dx, from.z + dz)
                .is_some_and(|flags| !flags.intersects(direction.block_mask()))
        };

        match direction.components() {
            Some((horizontal, vertical)) => {
                enters(direction) && enters(horizontal) && enters(vertical)
            }
            None => enters(direction),
        }
    }
}

struct Window {
    base_x: i32,
    base_z: i32,
    size: i32,
}

impl Window {
    fn centred_on(centre: Tile, size: i32) -> Self {
        Self {
            base_x: centre.x - size / 2,
            base_z: centre.z - size / 2,
            size,
        }
    }

    fn area(&self) -> usize {
        (self.size * self.size) as usize
    }

    fn index(&self, tile: Tile) -> Option<usize> {
        let lx = tile.x - self.base_x;
        let lz = tile.z - self.base_z;
        if lx < 0 || lz < 0 || lx >= self.size || lz >= self.size {
            return None;
        }
        Some((lx + lz * self.size) as usize)
    }
}

/// Reachable tile within [`APPROACH_RADIUS`] of `dest` with the smallest
/// squared distance, preferring the shorter route on ties.
fn closest_approach(window: &Window, distances: &[u32], dest: Tile) -> Option<Tile> {
    let mut best: Option<(i32, u32, Tile)> = None;

    for x in dest.x - APPROACH_RADIUS..=dest.x + APPROACH_RADIUS {
        for z in dest.z - APPROACH_RADIUS..=dest.z + APPROACH_RADIUS {
            let tile = Tile { x, z };
            let Some(index) = window.index(tile) else {
                continue;
            };
            let steps = distances[index];
            if steps >= MAX_APPROACH_STEPS {
                continue;
            }
            let (dx, dz) = (x - dest.x, z - dest.z);
            let cost = dx * dx + dz * dz;
            let better = match best {
                None => true,
                Some((best_cost, best_steps, _)) => {
                    cost < best_cost || (cost == best_cost && steps < best_steps)
                }
            };
            if better {
                best = Some((cost, steps, tile));
            }
        }
    }

    best.map(|(_, _, tile)| tile)
}

/// Walk the step table back from `end` and keep the tiles where the route
/// changes direction, plus `end` itself.
fn backtrack(window: &Window, steps: &[u8], src: Tile, end: Tile, level: i32) -> Vec<Waypoint> {
    let mut turns = Vec::new();
    let mut current = end;
    let mut later_step: Option<u8> = None;

    // The step table is a BFS tree, so the walk ends within area() moves.
    for _ in 0..window.area() {
        if current == src {
            break;
        }
        let Some(step) = window.index(current).map(|index| steps[index]) else {
            break;
        };
        let Some(direction) = Direction::ALL.get(usize::from(step)) else {
            break;
        };
        if later_step != Some(step) {
            turns.push(Waypoint::new(current.x as u16, current.z as u16, level as u8));
            later_step = Some(step);
        }
        let (dx, dz) = direction.delta();
        current = Tile {
            x: current.x - dx,
            z: current.z - dz,
        };
    }

    turns.reverse();
    turns
}
