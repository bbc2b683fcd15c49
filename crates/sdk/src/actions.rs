//! One convenience method per gateway command.
//!
//! `Option` parameters fall back to the usual defaults: running on, option
//! index 1, dialog option 0, amount 1, one tick.

use rsbot_protocol::{ActionCommand, ActionResult};

use crate::error::SdkError;
use crate::sdk::BotSdk;

type ActionOutcome = Result<ActionResult, SdkError>;

const DEFAULT_OPTION: i32 = 1;
const DEFAULT_DIALOG_OPTION: i32 = 0;
const DEFAULT_AMOUNT: i32 = 1;
const DEFAULT_WAIT_TICKS: u32 = 1;

impl BotSdk {
    // =========================================================================
    // Movement and world interaction
    // =========================================================================

    pub async fn send_walk(&self, x: i32, z: i32, running: Option<bool>) -> ActionOutcome {
        self.send_action(ActionCommand::WalkTo {
            x,
            z,
            running: running.unwrap_or(true),
        })
        .await
    }

    pub async fn send_interact_loc(
        &self,
        x: i32,
        z: i32,
        loc_id: i32,
        option: Option<i32>,
    ) -> ActionOutcome {
        self.send_action(ActionCommand::InteractLoc {
            x,
            z,
            loc_id,
            option_index: option.unwrap_or(DEFAULT_OPTION),
        })
        .await
    }

    pub async fn send_interact_npc(&self, npc_index: i32, option: Option<i32>) -> ActionOutcome {
        self.send_action(ActionCommand::InteractNpc {
            npc_index,
            option_index: option.unwrap_or(DEFAULT_OPTION),
        })
        .await
    }

    pub async fn send_talk_to_npc(&self, npc_index: i32) -> ActionOutcome {
        self.send_action(ActionCommand::TalkToNpc { npc_index }).await
    }

    pub async fn send_pickup(&self, x: i32, z: i32, item_id: i32) -> ActionOutcome {
        self.send_action(ActionCommand::PickupItem { x, z, item_id })
            .await
    }

    // =========================================================================
    // Inventory and equipment
    // =========================================================================

    pub async fn send_use_item(&self, slot: i32, option: Option<i32>) -> ActionOutcome {
        self.send_action(ActionCommand::UseInventoryItem {
            slot,
            option_index: option.unwrap_or(DEFAULT_OPTION),
        })
        .await
    }

    pub async fn send_use_equipment_item(&self, slot: i32, option: Option<i32>) -> ActionOutcome {
        self.send_action(ActionCommand::UseEquipmentItem {
            slot,
            option_index: option.unwrap_or(DEFAULT_OPTION),
        })
        .await
    }

    pub async fn send_drop_item(&self, slot: i32) -> ActionOutcome {
        self.send_action(ActionCommand::DropItem { slot }).await
    }

    pub async fn send_use_item_on_item(&self, source_slot: i32, target_slot: i32) -> ActionOutcome {
        self.send_action(ActionCommand::UseItemOnItem {
            source_slot,
            target_slot,
        })
        .await
    }

    pub async fn send_use_item_on_loc(
        &self,
        item_slot: i32,
        x: i32,
        z: i32,
        loc_id: i32,
    ) -> ActionOutcome {
        self.send_action(ActionCommand::UseItemOnLoc {
            item_slot,
            x,
            z,
            loc_id,
        })
        .await
    }

    // =========================================================================
    // Dialogs and interfaces
    // =========================================================================

    pub async fn send_click_dialog(&self, option: Option<i32>) -> ActionOutcome {
        self.send_action(ActionCommand::ClickDialogOption {
            option_index: option.unwrap_or(DEFAULT_DIALOG_OPTION),
        })
        .await
    }

    pub async fn send_click_interface_option(&self, option_index: i32) -> ActionOutcome {
        self.send_action(ActionCommand::ClickInterfaceOption { option_index })
            .await
    }

    pub async fn send_click_component(
        &self,
        component_id: i32,
        option: Option<i32>,
    ) -> ActionOutcome {
        self.send_action(ActionCommand::ClickInterfaceComponent {
            component_id,
            option_index: option.unwrap_or(DEFAULT_OPTION),
        })
        .await
    }

    pub async fn send_accept_character_design(&self) -> ActionOutcome {
        self.send_action(ActionCommand::AcceptCharacterDesign).await
    }

    pub async fn send_skip_tutorial(&self) -> ActionOutcome {
        self.send_action(ActionCommand::SkipTutorial).await
    }

    pub async fn send_close_modal(&self) -> ActionOutcome {
        self.send_action(ActionCommand::CloseModal).await
    }

    pub async fn send_set_tab(&self, tab_index: i32) -> ActionOutcome {
        self.send_action(ActionCommand::SetTab { tab_index }).await
    }

    // =========================================================================
    // Shops and banks
    // =========================================================================

    pub async fn send_shop_buy(&self, slot: i32, amount: Option<i32>) -> ActionOutcome {
        self.send_action(ActionCommand::ShopBuy {
            slot,
            amount: amount.unwrap_or(DEFAULT_AMOUNT),
        })
        .await
    }

    pub async fn send_shop_sell(&self, slot: i32, amount: Option<i32>) -> ActionOutcome {
        self.send_action(ActionCommand::ShopSell {
            slot,
            amount: amount.unwrap_or(DEFAULT_AMOUNT),
        })
        .await
    }

    pub async fn send_close_shop(&self) -> ActionOutcome {
        self.send_action(ActionCommand::CloseShop).await
    }

    pub async fn send_bank_deposit(&self, slot: i32, amount: Option<i32>) -> ActionOutcome {
        self.send_action(ActionCommand::BankDeposit {
            slot,
            amount: amount.unwrap_or(DEFAULT_AMOUNT),
        })
        .await
    }

    pub async fn send_bank_withdraw(&self, slot: i32, amount: Option<i32>) -> ActionOutcome {
        self.send_action(ActionCommand::BankWithdraw {
            slot,
            amount: amount.unwrap_or(DEFAULT_AMOUNT),
        })
        .await
    }

    // =========================================================================
    // Combat and magic
    // =========================================================================

    pub async fn send_set_combat_style(&self, style: i32) -> ActionOutcome {
        self.send_action(ActionCommand::SetCombatStyle { style }).await
    }

    pub async fn send_spell_on_npc(&self, npc_index: i32, spell_component: i32) -> ActionOutcome {
        self.send_action(ActionCommand::SpellOnNpc {
            npc_index,
            spell_component,
        })
        .await
    }

    pub async fn send_spell_on_item(&self, slot: i32, spell_component: i32) -> ActionOutcome {
        self.send_action(ActionCommand::SpellOnItem {
            slot,
            spell_component,
        })
        .await
    }

    // =========================================================================
    // Misc
    // =========================================================================

    pub async fn send_say(&self, message: impl Into<String>) -> ActionOutcome {
        self.send_action(ActionCommand::Say {
            message: message.into(),
        })
        .await
    }

    pub async fn send_wait(&self, ticks: Option<u32>) -> ActionOutcome {
        self.send_action(ActionCommand::Wait {
            ticks: ticks.unwrap_or(DEFAULT_WAIT_TICKS),
        })
        .await
    }
}
