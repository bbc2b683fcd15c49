//! Collision dataset loading.
//!
//! A dataset is JSON of the form `{ "tiles": [[level, x, z, flags], ...] }`.
//! A small sample dataset is compiled into the crate; deployments with the
//! full map point at a file instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::grid::{CollisionGrid, CollisionTile, GridError, LoadOutcome};

const BUNDLED_DATASET: &str = include_str!("../data/collision-data.json");

static BUNDLED_GRID: OnceCell<Arc<CollisionGrid>> = OnceCell::new();

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollisionData {
    #[serde(default)]
    pub tiles: Vec<CollisionTile>,
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read collision data from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid collision data: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl CollisionData {
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn bundled() -> Result<Self, DatasetError> {
        Self::from_json_str(BUNDLED_DATASET)
    }

    pub fn into_grid(self) -> Result<CollisionGrid, DatasetError> {
        let started = Instant::now();
        let mut grid = CollisionGrid::new();
        if let LoadOutcome::Loaded { tiles, zones } = grid.load(self.tiles)? {
            tracing::info!(
                tiles,
                zones,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Collision grid loaded"
            );
        }
        Ok(grid)
    }
}

/// The bundled grid, loaded on first use and shared for the rest of the
/// process.
pub fn bundled_grid() -> Result<Arc<CollisionGrid>, DatasetError> {
    BUNDLED_GRID
        .get_or_try_init(|| CollisionData::bundled()?.into_grid().map(Arc::new))
        .cloned()
}

/// Load a grid from `path`, or share the bundled one when no path is given.
pub fn load_grid(path: Option<&Path>) -> Result<Arc<CollisionGrid>, DatasetError> {
    match path {
        Some(path) => Ok(Arc::new(CollisionData::from_path(path)?.into_grid()?)),
        None => bundled_grid(),
    }
}
