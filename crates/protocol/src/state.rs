//! World-state snapshot pushed by the gateway.
//!
//! A snapshot is a complete picture: when one arrives it replaces the previous
//! snapshot wholesale. Every field defaults when absent so a sparse payload
//! still decodes, and an absent field means "empty", never "unchanged".

use serde::{Deserialize, Serialize};

/// Complete world state as last reported by the gateway
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldState {
    pub tick: u64,
    pub in_game: bool,
    pub player: Option<PlayerState>,
    pub skills: Vec<SkillState>,
    pub inventory: Vec<InventoryItem>,
    pub equipment: Vec<InventoryItem>,
    pub nearby_npcs: Vec<NearbyNpc>,
    pub nearby_locs: Vec<NearbyLoc>,
    pub ground_items: Vec<GroundItem>,
    pub dialog: DialogState,
    pub interface: InterfaceState,
    pub shop: ShopState,
    pub bank: BankState,
    pub combat_style: Option<CombatStyleState>,
    pub combat_events: Vec<CombatEvent>,
    pub game_messages: Vec<GameMessage>,
}

// =============================================================================
// Player
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerState {
    pub name: String,
    pub combat_level: i32,
    pub world_x: i32,
    pub world_z: i32,
    pub level: i32,
    /// Current animation, `-1` when idle
    pub anim_id: i32,
    pub combat: PlayerCombatState,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            name: String::new(),
            combat_level: 0,
            world_x: 0,
            world_z: 0,
            level: 0,
            anim_id: -1,
            combat: PlayerCombatState::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerCombatState {
    pub in_combat: bool,
    pub target_index: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkillState {
    pub name: String,
    /// Current (possibly boosted or drained) level
    pub level: i32,
    pub base_level: i32,
    pub experience: i64,
}

// =============================================================================
// Items
// =============================================================================

/// An interaction option together with the index the gateway expects back
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionEntry {
    pub index: i32,
    pub text: String,
}

/// An inventory or equipment slot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InventoryItem {
    pub slot: i32,
    pub id: i32,
    pub name: String,
    pub count: i32,
    pub options_with_index: Vec<OptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroundItem {
    pub x: i32,
    pub z: i32,
    pub id: i32,
    pub name: String,
    pub count: i32,
    pub distance: f64,
}

// =============================================================================
// Surroundings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NearbyNpc {
    pub index: i32,
    pub name: String,
    pub combat_level: i32,
    pub distance: f64,
    pub in_combat: bool,
    pub target_index: Option<i32>,
    pub hp: i32,
    pub max_hp: i32,
    /// Tick until which the NPC counts as engaged
    pub combat_cycle: u64,
    pub options_with_index: Vec<OptionEntry>,
}

/// A world object (door, tree, rock, bank booth, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NearbyLoc {
    pub x: i32,
    pub z: i32,
    pub id: i32,
    pub name: String,
    pub distance: f64,
    pub options_with_index: Vec<OptionEntry>,
}

// =============================================================================
// Dialogs, interfaces, shops
// =============================================================================

pub type DialogOption = OptionEntry;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DialogState {
    pub is_open: bool,
    pub options: Vec<DialogOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterfaceState {
    pub is_open: bool,
    pub interface_id: Option<i32>,
    pub options: Vec<OptionEntry>,
}

/// A stocked item in a shop or a bank
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreItem {
    pub slot: i32,
    pub id: i32,
    pub name: String,
    pub count: i32,
    pub price: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShopState {
    pub is_open: bool,
    pub title: String,
    pub shop_items: Vec<StoreItem>,
    pub player_items: Vec<StoreItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BankState {
    pub is_open: bool,
    pub items: Vec<StoreItem>,
}

// =============================================================================
// Combat
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatStyleState {
    pub current_style: i32,
    pub weapon_name: String,
    pub styles: Vec<CombatStyleOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatStyleOption {
    pub index: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub style_type: String,
    pub trained_skill: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatEventKind {
    DamageDealt,
    DamageTaken,
    /// Unknown discriminator for forward compatibility
    #[default]
    #[serde(other)]
    Unknown,
}

/// A hit that happened on a specific game tick
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatEvent {
    pub tick: u64,
    #[serde(rename = "type")]
    pub kind: CombatEventKind,
    pub damage: i32,
    /// Index of the NPC the event refers to
    pub target_index: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMessage {
    pub tick: u64,
    pub text: String,
    pub sender: Option<String>,
}
