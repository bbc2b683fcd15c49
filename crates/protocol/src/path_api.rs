//! DTOs for the HTTP pathfinding endpoint (`GET /api/findPath`).

use serde::{Deserialize, Serialize};

use crate::waypoint::Waypoint;

/// Waypoint budget used when a caller does not supply one.
pub const DEFAULT_MAX_WAYPOINTS: usize = 500;

/// Raw query parameters; values stay strings so malformed numbers can be
/// reported with the endpoint's own JSON error shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FindPathQuery {
    pub src_x: Option<String>,
    pub src_z: Option<String>,
    pub dest_x: Option<String>,
    pub dest_z: Option<String>,
    pub level: Option<String>,
    pub max_waypoints: Option<String>,
}

/// Response body of the pathfinding endpoint.
///
/// Success carries `waypoints`, `waypointCount` and `reachedDestination`;
/// failure carries `error` and, for zone failures, both allocation flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindPathResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<Vec<Waypoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoint_count: Option<usize>,
    /// True when the last waypoint is the destination. A request whose
    /// source already is the destination reports `true` with no waypoints,
    /// where a plain last-waypoint check would report `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reached_destination: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_zone_allocated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_zone_allocated: Option<bool>,
}

impl FindPathResponse {
    pub fn route(waypoints: Vec<Waypoint>, reached_destination: bool) -> Self {
        Self {
            success: true,
            waypoint_count: Some(waypoints.len()),
            waypoints: Some(waypoints),
            reached_destination: Some(reached_destination),
            error: None,
            src_zone_allocated: None,
            dest_zone_allocated: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            waypoints: None,
            waypoint_count: None,
            reached_destination: None,
            error: Some(message.into()),
            src_zone_allocated: None,
            dest_zone_allocated: None,
        }
    }

    pub fn zone_not_allocated(src_zone_allocated: bool, dest_zone_allocated: bool) -> Self {
        Self {
            src_zone_allocated: Some(src_zone_allocated),
            dest_zone_allocated: Some(dest_zone_allocated),
            ..Self::error("Zone not allocated (collision data not loaded)")
        }
    }
}
