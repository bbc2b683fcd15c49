//! Demultiplexing of gateway messages and request dispatch.

use std::sync::Arc;
use std::time::Duration;

use rsbot_protocol::{ActionResult, BotAction, ClientMessage, GatewayMessage};

use crate::connection::ConnectionState;
use crate::error::SdkError;
use crate::ids;
use crate::sdk::SdkInner;

/// How long a request waits for an ongoing reconnect before giving up.
pub const RECONNECT_GATE_TIMEOUT: Duration = Duration::from_secs(60);

impl SdkInner {
    /// Hand one decoded message to the state cache or a correlation table.
    pub(crate) fn route(&self, message: GatewayMessage) {
        match message {
            GatewayMessage::SdkState { state: Some(state) } => {
                self.cache.replace(Arc::from(state));
            }
            GatewayMessage::SdkState { state: None } => {
                tracing::debug!("State message without payload");
            }
            GatewayMessage::SdkActionResult { action_id, result } => {
                let outcome = result.ok_or(SdkError::MissingResult);
                self.actions.resolve(&action_id, outcome);
            }
            GatewayMessage::SdkError {
                action_id,
                screenshot_id,
                error,
            } => {
                if action_id.is_none() && screenshot_id.is_none() {
                    tracing::warn!(error = ?error, "Gateway error without correlation id");
                }
                if let Some(id) = action_id {
                    let text = error.clone().unwrap_or_else(|| "Unknown error".to_string());
                    self.actions.resolve(&id, Err(SdkError::Gateway(text)));
                }
                if let Some(id) = screenshot_id {
                    let text = error.unwrap_or_else(|| "Screenshot error".to_string());
                    self.screenshots.resolve(&id, Err(SdkError::Gateway(text)));
                }
            }
            GatewayMessage::SdkScreenshotResponse {
                screenshot_id,
                data_url,
            } => self.route_screenshot(screenshot_id, data_url),
            GatewayMessage::SdkConnected { .. } => {
                tracing::debug!("Ignoring handshake acknowledgement outside of connect");
            }
            GatewayMessage::Unknown => {}
        }
    }

    /// A response with an unknown or missing id is only trusted when a single
    /// request is outstanding.
    fn route_screenshot(&self, screenshot_id: Option<String>, data_url: Option<String>) {
        let outcome =
            data_url.ok_or_else(|| SdkError::Gateway("Screenshot response without data".into()));

        if let Some(id) = screenshot_id.as_deref() {
            if self.screenshots.contains(id) {
                self.screenshots.resolve(id, outcome);
                return;
            }
        }
        if !self.screenshots.resolve_sole(outcome) {
            tracing::warn!(
                screenshot_id = screenshot_id.as_deref().unwrap_or("<none>"),
                pending = self.screenshots.len(),
                "Dropping uncorrelated screenshot response"
            );
        }
    }

    /// Gate every outbound request. Waits out a reconnect, fails fast otherwise.
    pub(crate) async fn ensure_connected(&self) -> Result<(), SdkError> {
        match self.connection_state() {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Reconnecting => {
                if let Err(err) = self.wait_for_connection(RECONNECT_GATE_TIMEOUT).await {
                    tracing::debug!(error = %err, "Reconnect did not complete");
                }
                match self.connection_state() {
                    ConnectionState::Connected => Ok(()),
                    state => Err(SdkError::NotConnected { state }),
                }
            }
            state => Err(SdkError::NotConnected { state }),
        }
    }

    /// Send an action and wait for its acknowledgement.
    pub(crate) async fn dispatch_action(
        &self,
        action: BotAction,
        timeout: Duration,
    ) -> Result<ActionResult, SdkError> {
        self.ensure_connected().await?;

        let kind = action.kind();
        let pending = self.actions.register(ids::action_id());
        let message = ClientMessage::SdkAction {
            username: self.config.bot_username.clone(),
            action_id: pending.id().to_string(),
            action,
        };
        self.send_frame(&message).await?;
        tracing::debug!(action = kind, action_id = pending.id(), "Action sent");

        pending.wait(timeout, SdkError::ActionTimeout { action: kind }).await
    }

    /// Request a frame and wait for its data URL.
    pub(crate) async fn request_screenshot(&self, timeout: Duration) -> Result<String, SdkError> {
        self.ensure_connected().await?;

        let pending = self.screenshots.register(ids::screenshot_id());
        let message = ClientMessage::SdkScreenshotRequest {
            username: self.config.bot_username.clone(),
            screenshot_id: pending.id().to_string(),
        };
        self.send_frame(&message).await?;

        pending.wait(timeout, SdkError::ScreenshotTimeout).await
    }
}
