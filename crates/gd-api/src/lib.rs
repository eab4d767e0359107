//! Gamedrop REST facade
//!
//! Thin HTTP layer over the gateway operations: routes translate sentinel
//! results into status codes and nothing else. Also serves health probes,
//! Prometheus metrics, and OpenAPI documentation.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gd_common::{GuildChannel, Webhook};
use gd_gateway::DiscordOps;

pub mod common;
pub mod guilds;
pub mod monitoring;
pub mod webhooks;

pub use common::respond;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ops: Arc<dyn DiscordOps>,
    pub metrics: Option<PrometheusHandle>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        webhooks::get_webhooks,
        webhooks::post_webhook,
        guilds::get_guild,
        monitoring::health_handler,
    ),
    components(schemas(Webhook, GuildChannel, monitoring::HealthResponse)),
    tags(
        (name = "webhooks", description = "Channel webhook management"),
        (name = "guilds", description = "Guild lookups"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Create the full router with all endpoints
pub fn create_router(ops: Arc<dyn DiscordOps>, metrics: Option<PrometheusHandle>) -> Router {
    let state = AppState { ops, metrics };

    Router::new()
        .route("/health", get(monitoring::health_handler))
        .route("/health/live", get(monitoring::liveness_probe))
        .route("/health/ready", get(monitoring::readiness_probe))
        .route("/metrics", get(monitoring::metrics_handler))
        .route(
            "/channels/:channel/webhooks",
            get(webhooks::get_webhooks).post(webhooks::post_webhook),
        )
        .route("/guilds/:guild", get(guilds::get_guild))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
