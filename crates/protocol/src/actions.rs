//! Typed bot commands and their acknowledgement payload.
//!
//! Every command travels as a JSON object tagged by `type`, carrying its own
//! camelCase fields plus a free-form `reason` used by the gateway for logging:
//!
//! ```json
//! { "type": "walkTo", "x": 3222, "z": 3218, "running": true, "reason": "SDK" }
//! ```
//!
//! Input validation (slot ranges, option indices) is the gateway's job.

use serde::{Deserialize, Serialize};

/// Reason attached to commands issued through the SDK convenience methods.
pub const DEFAULT_REASON: &str = "SDK";

/// A command plus the reason it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotAction {
    #[serde(flatten)]
    pub command: ActionCommand,
    pub reason: String,
}

impl BotAction {
    pub fn new(command: ActionCommand, reason: impl Into<String>) -> Self {
        Self {
            command,
            reason: reason.into(),
        }
    }

    /// Wire name of the command (`"walkTo"`, `"shopBuy"`, ...).
    pub fn kind(&self) -> &'static str {
        self.command.kind()
    }
}

impl From<ActionCommand> for BotAction {
    fn from(command: ActionCommand) -> Self {
        Self::new(command, DEFAULT_REASON)
    }
}

/// Commands understood by the control gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ActionCommand {
    // -------------------------------------------------------------------------
    // Movement and world interaction
    // -------------------------------------------------------------------------
    WalkTo {
        x: i32,
        z: i32,
        running: bool,
    },
    InteractLoc {
        x: i32,
        z: i32,
        loc_id: i32,
        option_index: i32,
    },
    InteractNpc {
        npc_index: i32,
        option_index: i32,
    },
    TalkToNpc {
        npc_index: i32,
    },
    PickupItem {
        x: i32,
        z: i32,
        item_id: i32,
    },

    // -------------------------------------------------------------------------
    // Inventory and equipment
    // -------------------------------------------------------------------------
    UseInventoryItem {
        slot: i32,
        option_index: i32,
    },
    UseEquipmentItem {
        slot: i32,
        option_index: i32,
    },
    DropItem {
        slot: i32,
    },
    UseItemOnItem {
        source_slot: i32,
        target_slot: i32,
    },
    UseItemOnLoc {
        item_slot: i32,
        x: i32,
        z: i32,
        loc_id: i32,
    },

    // -------------------------------------------------------------------------
    // Dialogs and interfaces
    // -------------------------------------------------------------------------
    ClickDialogOption {
        option_index: i32,
    },
    ClickInterfaceOption {
        option_index: i32,
    },
    ClickInterfaceComponent {
        component_id: i32,
        option_index: i32,
    },
    AcceptCharacterDesign,
    SkipTutorial,
    CloseModal,
    SetTab {
        tab_index: i32,
    },

    // -------------------------------------------------------------------------
    // Shops and banks
    // -------------------------------------------------------------------------
    ShopBuy {
        slot: i32,
        amount: i32,
    },
    ShopSell {
        slot: i32,
        amount: i32,
    },
    CloseShop,
    BankDeposit {
        slot: i32,
        amount: i32,
    },
    BankWithdraw {
        slot: i32,
        amount: i32,
    },

    // -------------------------------------------------------------------------
    // Combat and magic
    // -------------------------------------------------------------------------
    SetCombatStyle {
        style: i32,
    },
    SpellOnNpc {
        npc_index: i32,
        spell_component: i32,
    },
    SpellOnItem {
        slot: i32,
        spell_component: i32,
    },

    // -------------------------------------------------------------------------
    // Misc
    // -------------------------------------------------------------------------
    Say {
        message: String,
    },
    Wait {
        ticks: u32,
    },
}

impl ActionCommand {
    /// Wire name of the command, as written in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionCommand::WalkTo { .. } => "walkTo",
            ActionCommand::InteractLoc { .. } => "interactLoc",
            ActionCommand::InteractNpc { .. } => "interactNpc",
            ActionCommand::TalkToNpc { .. } => "talkToNpc",
            ActionCommand::PickupItem { .. } => "pickupItem",
            ActionCommand::UseInventoryItem { .. } => "useInventoryItem",
            ActionCommand::UseEquipmentItem { .. } => "useEquipmentItem",
            ActionCommand::DropItem { .. } => "dropItem",
            ActionCommand::UseItemOnItem { .. } => "useItemOnItem",
            ActionCommand::UseItemOnLoc { .. } => "useItemOnLoc",
            ActionCommand::ClickDialogOption { .. } => "clickDialogOption",
            ActionCommand::ClickInterfaceOption { .. } => "clickInterfaceOption",
            ActionCommand::ClickInterfaceComponent { .. } => "clickInterfaceComponent",
            ActionCommand::AcceptCharacterDesign => "acceptCharacterDesign",
            ActionCommand::SkipTutorial => "skipTutorial",
            ActionCommand::CloseModal => "closeModal",
            ActionCommand::SetTab { .. } => "setTab",
            ActionCommand::ShopBuy { .. } => "shopBuy",
            ActionCommand::ShopSell { .. } => "shopSell",
            ActionCommand::CloseShop => "closeShop",
            ActionCommand::BankDeposit { .. } => "bankDeposit",
            ActionCommand::BankWithdraw { .. } => "bankWithdraw",
            ActionCommand::SetCombatStyle { .. } => "setCombatStyle",
            ActionCommand::SpellOnNpc { .. } => "spellOnNpc",
            ActionCommand::SpellOnItem { .. } => "spellOnItem",
            ActionCommand::Say { .. } => "say",
            ActionCommand::Wait { .. } => "wait",
        }
    }
}

/// Acknowledgement payload of a command.
///
/// `success` reports whether the gateway accepted the command, not whether
/// its in-game effect has finished.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walk_to_serializes_with_type_tag_and_reason() {
        let action = BotAction::from(ActionCommand::WalkTo {
            x: 3222,
            z: 3218,
            running: true,
        });

        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(
            value,
            json!({ "type": "walkTo", "x": 3222, "z": 3218, "running": true, "reason": "SDK" })
        );
    }

    #[test]
    fn multi_word_fields_are_camel_case() {
        let action = BotAction::new(
            ActionCommand::ClickInterfaceComponent {
                component_id: 3321,
                option_index: 2,
            },
            "bank",
        );

        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "clickInterfaceComponent");
        assert_eq!(value["componentId"], 3321);
        assert_eq!(value["optionIndex"], 2);
        assert_eq!(value["reason"], "bank");
    }

    #[test]
    fn unit_commands_carry_only_type_and_reason() {
        let action = BotAction::from(ActionCommand::CloseShop);
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value, json!({ "type": "closeShop", "reason": "SDK" }));
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let commands = [
            ActionCommand::SpellOnNpc {
                npc_index: 4,
                spell_component: 1152,
            },
            ActionCommand::UseItemOnLoc {
                item_slot: 0,
                x: 1,
                z: 2,
                loc_id: 3,
            },
            ActionCommand::SkipTutorial,
            ActionCommand::Wait { ticks: 3 },
        ];

        for command in commands {
            let value = serde_json::to_value(BotAction::from(command.clone())).unwrap();
            assert_eq!(value["type"], command.kind());
        }
    }

    #[test]
    fn action_decodes_from_gateway_shape() {
        let action: BotAction = serde_json::from_value(json!({
            "type": "shopBuy",
            "slot": 3,
            "amount": 10,
            "reason": "restock"
        }))
        .unwrap();

        assert_eq!(action.command, ActionCommand::ShopBuy { slot: 3, amount: 10 });
        assert_eq!(action.reason, "restock");
    }
}
