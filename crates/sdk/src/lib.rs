//! rsbot SDK - Remote control client for a running game session
//!
//! A [`BotSdk`] holds one WebSocket connection to the control gateway. It
//! sends typed commands and screenshot requests, correlates their replies,
//! caches the latest world-state snapshot and plans routes over the bundled
//! collision grid.
//!
//! ```no_run
//! # async fn run() -> Result<(), rsbot_sdk::SdkError> {
//! use rsbot_sdk::{BotSdk, SdkConfig};
//!
//! let sdk = BotSdk::new(SdkConfig::new("bot1"))?;
//! sdk.connect().await?;
//! sdk.send_walk(3222, 3218, None).await?;
//! # Ok(())
//! # }
//! ```

mod actions;
pub mod config;
mod connection;
mod dispatch;
pub mod error;
mod ids;
mod listeners;
mod pathfinding;
mod pending;
mod sdk;
mod state_cache;

#[cfg(test)]
mod gateway_tests;
#[cfg(test)]
mod test_support;

pub use config::SdkConfig;
pub use connection::{BackoffPolicy, ConnectionEvent, ConnectionState};
pub use dispatch::RECONNECT_GATE_TIMEOUT;
pub use error::SdkError;
pub use listeners::Subscription;
pub use pathfinding::SdkPathError;
pub use sdk::{
    BotSdk, DEFAULT_CONDITION_TIMEOUT, DEFAULT_CONNECTION_WAIT, DEFAULT_SCREENSHOT_TIMEOUT,
};
pub use state_cache::Pattern;

pub use rsbot_pathfinding::{CollisionGrid, Route};
pub use rsbot_protocol::{
    ActionCommand, ActionResult, BotAction, DialogState, GroundItem, InventoryItem, NearbyLoc,
    NearbyNpc, PlayerState, SkillState, Waypoint, WorldState,
};
