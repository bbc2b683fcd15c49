//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8888;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Collision dataset to load; the bundled sample when `None`.
    pub collision_data_path: Option<PathBuf>,
    pub cors_allowed_origins: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match non_empty("SERVER_PORT").or_else(|| non_empty("PORT")) {
            Some(port) => port
                .parse()
                .with_context(|| format!("invalid server port: {port}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: non_empty("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            collision_data_path: non_empty("COLLISION_DATA_PATH").map(PathBuf::from),
            cors_allowed_origins: non_empty("CORS_ALLOWED_ORIGINS"),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
