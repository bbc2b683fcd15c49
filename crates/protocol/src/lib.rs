//! rsbot Protocol - Shared types for the bot SDK and the control gateway
//!
//! This crate contains every type that crosses a process boundary:
//! - WebSocket message types (`ClientMessage`, `GatewayMessage`)
//! - Typed bot commands (`BotAction`, `ActionCommand`) and their acknowledgement
//! - The world-state snapshot pushed by the gateway
//! - Waypoints and their packed wire encoding
//! - Request/response DTOs for the HTTP pathfinding endpoint
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Forgiving decoding** - Absent snapshot fields default, unknown message
//!    types decode to an `Unknown` variant

pub mod actions;
pub mod messages;
pub mod path_api;
pub mod state;
pub mod waypoint;

pub use actions::{ActionCommand, ActionResult, BotAction, DEFAULT_REASON};
pub use messages::{ClientMessage, GatewayMessage, ProtocolError};
pub use path_api::{FindPathQuery, FindPathResponse, DEFAULT_MAX_WAYPOINTS};
pub use state::{
    BankState, CombatEvent, CombatEventKind, CombatStyleOption, CombatStyleState, DialogOption,
    DialogState, GameMessage, GroundItem, InterfaceState, InventoryItem, NearbyLoc, NearbyNpc,
    OptionEntry, PlayerCombatState, PlayerState, ShopState, SkillState, StoreItem, WorldState,
};
pub use waypoint::{Waypoint, WaypointError, MAX_COORD, MAX_LEVEL};
