//! SDK configuration

use std::time::Duration;

use url::Url;

use crate::error::SdkError;

pub const DEFAULT_GATEWAY_HOST: &str = "localhost";
pub const DEFAULT_GATEWAY_PORT: u16 = 7780;
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Construction-time settings for a [`crate::BotSdk`].
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Account the gateway routes commands to
    pub bot_username: String,
    /// Full gateway URL; when unset it is built from `host` and `port`
    pub gateway_url: Option<String>,
    pub host: String,
    pub port: u16,
    /// Default deadline for an action acknowledgement
    pub action_timeout: Duration,
    /// Deadline for opening the socket and completing the handshake
    pub connect_timeout: Duration,
    pub auto_reconnect: bool,
    /// `None` retries forever
    pub reconnect_max_retries: Option<u32>,
    pub reconnect_base_delay: Duration,
    pub reconnect_max_delay: Duration,
}

impl SdkConfig {
    pub fn new(bot_username: impl Into<String>) -> Self {
        Self {
            bot_username: bot_username.into(),
            gateway_url: None,
            host: DEFAULT_GATEWAY_HOST.to_string(),
            port: DEFAULT_GATEWAY_PORT,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            auto_reconnect: true,
            reconnect_max_retries: None,
            reconnect_base_delay: DEFAULT_RECONNECT_BASE_DELAY,
            reconnect_max_delay: DEFAULT_RECONNECT_MAX_DELAY,
        }
    }

    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = Some(url.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn with_reconnect_backoff(
        mut self,
        base_delay: Duration,
        max_delay: Duration,
        max_retries: Option<u32>,
    ) -> Self {
        self.reconnect_base_delay = base_delay;
        self.reconnect_max_delay = max_delay;
        self.reconnect_max_retries = max_retries;
        self
    }

    /// URL the connection manager dials.
    pub fn gateway_url(&self) -> String {
        match &self.gateway_url {
            Some(url) => url.clone(),
            None => format!("ws://{}:{}", self.host, self.port),
        }
    }

    pub fn validate(&self) -> Result<(), SdkError> {
        if self.bot_username.trim().is_empty() {
            return Err(SdkError::InvalidConfig("bot_username must not be empty".into()));
        }

        let raw = self.gateway_url();
        let url = Url::parse(&raw)
            .map_err(|e| SdkError::InvalidConfig(format!("invalid gateway url {raw}: {e}")))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(SdkError::InvalidConfig(format!(
                "gateway url must use ws or wss, got {}",
                url.scheme()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_gateway() {
        let config = SdkConfig::new("bot1");
        assert_eq!(config.gateway_url(), "ws://localhost:7780");
        assert_eq!(config.action_timeout, Duration::from_secs(30));
        assert!(config.auto_reconnect);
        assert_eq!(config.reconnect_max_retries, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_url_wins_over_host_and_port() {
        let config = SdkConfig::new("bot1")
            .with_host("example.org", 9000)
            .with_gateway_url("wss://gateway.example.org/bot");
        assert_eq!(config.gateway_url(), "wss://gateway.example.org/bot");
    }

    #[test]
    fn empty_username_is_rejected() {
        let err = SdkConfig::new("  ").validate().unwrap_err();
        assert!(matches!(err, SdkError::InvalidConfig(_)));
    }

    #[test]
    fn non_websocket_url_is_rejected() {
        let err = SdkConfig::new("bot1")
            .with_gateway_url("http://localhost:7780")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("ws or wss"));

        assert!(SdkConfig::new("bot1")
            .with_gateway_url("not a url")
            .validate()
            .is_err());
    }
}
