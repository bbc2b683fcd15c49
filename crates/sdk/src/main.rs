//! rsbot probe - connects one bot to the gateway and reports what it sees.

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rsbot_sdk::{BotSdk, SdkConfig, DEFAULT_CONNECTION_WAIT};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rsbot_sdk=info,rsbot_probe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config_from_env()?;
    tracing::info!(
        bot = %config.bot_username,
        gateway = %config.gateway_url(),
        "Starting rsbot probe"
    );

    let sdk = BotSdk::new(config).context("invalid SDK configuration")?;
    let transitions = sdk.on_connection_state_change(|state, attempt| {
        tracing::info!(%state, attempt, "Connection state changed");
    });

    sdk.connect().await.context("failed to connect to gateway")?;
    let state = sdk
        .wait_for_state_change(DEFAULT_CONNECTION_WAIT)
        .await
        .context("no world state received")?;

    match &state.player {
        Some(player) => tracing::info!(
            name = %player.name,
            combat_level = player.combat_level,
            x = player.world_x,
            z = player.world_z,
            level = player.level,
            "Player"
        ),
        None => tracing::info!("No player in snapshot"),
    }
    tracing::info!(
        tick = state.tick,
        in_game = state.in_game,
        skills = state.skills.len(),
        inventory = state.inventory.len(),
        npcs = state.nearby_npcs.len(),
        locs = state.nearby_locs.len(),
        ground_items = state.ground_items.len(),
        "Snapshot received"
    );

    transitions.unsubscribe();
    sdk.disconnect().await;
    Ok(())
}

/// Build the SDK configuration from `BOT_USERNAME`, `GATEWAY_URL` or
/// `GATEWAY_HOST`/`GATEWAY_PORT`, `ACTION_TIMEOUT_MS` and `AUTO_RECONNECT`.
fn config_from_env() -> anyhow::Result<SdkConfig> {
    let username = std::env::var("BOT_USERNAME").context("BOT_USERNAME must be set")?;
    let mut config = SdkConfig::new(username);

    if let Ok(url) = std::env::var("GATEWAY_URL") {
        config = config.with_gateway_url(url);
    } else {
        let host = std::env::var("GATEWAY_HOST").unwrap_or_else(|_| config.host.clone());
        let port = match std::env::var("GATEWAY_PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("GATEWAY_PORT is not a port number: {port}"))?,
            Err(_) => config.port,
        };
        config = config.with_host(host, port);
    }

    if let Ok(ms) = std::env::var("ACTION_TIMEOUT_MS") {
        let ms: u64 = ms
            .parse()
            .with_context(|| format!("ACTION_TIMEOUT_MS is not a number: {ms}"))?;
        config = config.with_action_timeout(Duration::from_millis(ms));
    }

    if let Ok(flag) = std::env::var("AUTO_RECONNECT") {
        let enabled = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        config = config.with_auto_reconnect(enabled);
    }

    Ok(config)
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
