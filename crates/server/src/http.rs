//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use rsbot_pathfinding::PathError;
use rsbot_protocol::{FindPathQuery, FindPathResponse, DEFAULT_MAX_WAYPOINTS};

use crate::port::PathfindingPort;

pub type SharedPathfinder = Arc<dyn PathfindingPort>;

/// Create all HTTP routes.
pub fn routes() -> Router<SharedPathfinder> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/findPath", get(find_path))
}

async fn health() -> &'static str {
    "OK"
}

async fn find_path(
    State(finder): State<SharedPathfinder>,
    Query(query): Query<FindPathQuery>,
) -> Result<Json<FindPathResponse>, ApiError> {
    let request = PathRequest::parse(&query)?;
    let route = finder.find_long_path(
        request.level,
        request.src_x,
        request.src_z,
        request.dest_x,
        request.dest_z,
        request.max_waypoints,
    )?;

    tracing::debug!(
        src_x = request.src_x,
        src_z = request.src_z,
        dest_x = request.dest_x,
        dest_z = request.dest_z,
        waypoints = route.waypoint_count(),
        reached = route.reached_destination,
        "Path computed"
    );
    Ok(Json(FindPathResponse::route(
        route.waypoints,
        route.reached_destination,
    )))
}

/// Validated `/api/findPath` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathRequest {
    src_x: i32,
    src_z: i32,
    dest_x: i32,
    dest_z: i32,
    level: i32,
    max_waypoints: usize,
}

impl PathRequest {
    /// Coordinates must be present non-negative integers. An unparsable
    /// `level` or `maxWaypoints` falls back to its default.
    fn parse(query: &FindPathQuery) -> Result<Self, ApiError> {
        let coordinate = |value: &Option<String>| {
            parse_number::<i32>(value)
                .filter(|v| *v >= 0)
                .ok_or(ApiError::MissingCoordinates)
        };

        Ok(Self {
            src_x: coordinate(&query.src_x)?,
            src_z: coordinate(&query.src_z)?,
            dest_x: coordinate(&query.dest_x)?,
            dest_z: coordinate(&query.dest_z)?,
            level: parse_number(&query.level).unwrap_or(0),
            max_waypoints: parse_number(&query.max_waypoints).unwrap_or(DEFAULT_MAX_WAYPOINTS),
        })
    }
}

fn parse_number<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required parameters: srcX, srcZ, destX, destZ")]
    MissingCoordinates,
    #[error("Zone not allocated (collision data not loaded)")]
    ZoneNotAllocated {
        src_zone_allocated: bool,
        dest_zone_allocated: bool,
    },
}

impl From<PathError> for ApiError {
    fn from(e: PathError) -> Self {
        match e {
            PathError::ZoneNotAllocated {
                src_zone_allocated,
                dest_zone_allocated,
            } => ApiError::ZoneNotAllocated {
                src_zone_allocated,
                dest_zone_allocated,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::MissingCoordinates => FindPathResponse::error(self.to_string()),
            ApiError::ZoneNotAllocated {
                src_zone_allocated,
                dest_zone_allocated,
            } => FindPathResponse::zone_not_allocated(src_zone_allocated, dest_zone_allocated),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}
