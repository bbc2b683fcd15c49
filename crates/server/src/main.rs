//! rsbot Server - HTTP pathfinding endpoint.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod http;
mod port;

use config::ServerConfig;
use http::SharedPathfinder;
use port::LocalPathfinder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rsbot_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rsbot server");

    let config = ServerConfig::from_env()?;

    let started = Instant::now();
    let grid = rsbot_pathfinding::load_grid(config.collision_data_path.as_deref())
        .context("failed to load collision data")?;
    tracing::info!(
        path = ?config.collision_data_path,
        zones = grid.zone_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Collision grid ready"
    );
    let finder: SharedPathfinder = Arc::new(LocalPathfinder::new(grid));

    let mut router = http::routes()
        .with_state(finder)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(config.cors_allowed_origins.as_deref()) {
        router = router.layer(cors);
    }

    let addr = config.addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

/// `*` allows any origin; otherwise a comma-separated origin list.
fn build_cors_layer(allowed_origins: Option<&str>) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins?;
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if allowed_origins == "*" {
        return Some(cors.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS has no valid origins; CORS disabled");
        return None;
    }
    Some(cors.allow_origin(origins))
}
