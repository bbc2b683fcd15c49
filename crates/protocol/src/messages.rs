//! WebSocket message types for SDK-Gateway communication
//!
//! The SDK sends `ClientMessage` and receives `GatewayMessage`. Both are JSON
//! objects tagged by a snake_case `type` field; payload fields are camelCase.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Renaming variants is a breaking change
//! - Unknown gateway message types deserialize to `Unknown`

use serde::{Deserialize, Serialize};

use crate::actions::{ActionResult, BotAction};
use crate::state::WorldState;

fn default_true() -> bool {
    true
}

// =============================================================================
// Client Messages (SDK → Gateway)
// =============================================================================

/// Messages from the SDK to the control gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Identification handshake, sent once the transport is open
    SdkConnect { username: String, client_id: String },
    /// A command tagged with the identifier its acknowledgement will carry
    SdkAction {
        username: String,
        action_id: String,
        action: BotAction,
    },
    /// Request for a rendered frame
    SdkScreenshotRequest {
        username: String,
        screenshot_id: String,
    },
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

// =============================================================================
// Gateway Messages (Gateway → SDK)
// =============================================================================

/// Messages from the control gateway to the SDK
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum GatewayMessage {
    /// Handshake acknowledgement
    SdkConnected {
        #[serde(default = "default_true")]
        success: bool,
    },
    /// Full world-state snapshot; replaces the previous one wholesale
    SdkState {
        #[serde(default)]
        state: Option<Box<WorldState>>,
    },
    /// Acknowledgement of a dispatched command
    SdkActionResult {
        action_id: String,
        #[serde(default)]
        result: Option<ActionResult>,
    },
    /// Failure report referencing an action or a screenshot request
    SdkError {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        screenshot_id: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    /// Rendered frame as a data URL
    SdkScreenshotResponse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        screenshot_id: Option<String>,
        #[serde(default)]
        data_url: Option<String>,
    },
    /// Unknown message type for forward compatibility
    #[serde(other)]
    Unknown,
}

impl GatewayMessage {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(String),
    #[error("failed to decode message: {0}")]
    Decode(String),
}
