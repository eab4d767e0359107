//! Gamedrop Discord Gateway Server
//!
//! Fronts the Discord REST API for the notification services: webhook
//! management and guild lookups over HTTP, with per-bucket rate-limit
//! handling underneath. Configuration comes from `GD_*` environment
//! variables (a `.env` file is honored in development).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gd_api::create_router;
use gd_common::GatewayConfig;
use gd_gateway::{DiscordOps, DiscordRest, RestGateway};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Starting Gamedrop Discord gateway");

    let config = load_gateway_config();
    info!(
        api_base_url = %config.api_base_url,
        global_rate_limit = ?config.global_requests_per_second,
        "Gateway configuration loaded"
    );

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {e}"))?;

    let gateway = Arc::new(RestGateway::new(config)?);
    let ops: Arc<dyn DiscordOps> = Arc::new(DiscordRest::new(gateway));

    let app = create_router(ops, Some(metrics_handle))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let api_port: u16 = std::env::var("GD_API_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);

    let addr = format!("0.0.0.0:{}", api_port);
    info!(port = api_port, "Starting HTTP API server");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gamedrop gateway shutdown complete");
    Ok(())
}

/// Load gateway configuration from environment variables
fn load_gateway_config() -> GatewayConfig {
    let defaults = GatewayConfig::default();

    GatewayConfig {
        api_base_url: std::env::var("GD_DISCORD_API_BASE").unwrap_or(defaults.api_base_url),
        bot_token: std::env::var("GD_BOT_TOKEN").ok().filter(|t| !t.is_empty()),
        connect_timeout: env_secs("GD_CONNECT_TIMEOUT_SECS").unwrap_or(defaults.connect_timeout),
        request_timeout: env_secs("GD_REQUEST_TIMEOUT_SECS").unwrap_or(defaults.request_timeout),
        global_requests_per_second: match std::env::var("GD_GLOBAL_RATE_LIMIT") {
            // 0 disables the global limiter
            Ok(v) => v.parse().ok().filter(|rps| *rps > 0),
            Err(_) => defaults.global_requests_per_second,
        },
        webhook_default_name: std::env::var("GD_WEBHOOK_NAME")
            .unwrap_or(defaults.webhook_default_name),
        webhook_default_avatar: std::env::var("GD_WEBHOOK_AVATAR")
            .ok()
            .filter(|a| !a.is_empty()),
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
