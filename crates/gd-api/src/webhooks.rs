//! Webhook routes

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::common::respond;
use crate::AppState;

/// List webhooks for a channel
#[utoipa::path(
    get,
    path = "/channels/{channel}/webhooks",
    tag = "webhooks",
    params(
        ("channel" = String, Path, description = "Channel id")
    ),
    responses(
        (status = 200, description = "Webhooks for the channel", body = Vec<gd_common::Webhook>),
        (status = 400, description = "Blank channel id"),
        (status = 403, description = "Bot lacks permission on the channel"),
        (status = 404, description = "Channel not found"),
        (status = 502, description = "Upstream unavailable")
    )
)]
pub async fn get_webhooks(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if channel.trim().is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let directives: Vec<String> = query.into_keys().collect();
    respond(state.ops.fetch_webhooks(&channel, &directives).await)
}

/// Create a webhook in a channel
#[utoipa::path(
    post,
    path = "/channels/{channel}/webhooks",
    tag = "webhooks",
    params(
        ("channel" = String, Path, description = "Channel id")
    ),
    responses(
        (status = 200, description = "Created webhook", body = gd_common::Webhook),
        (status = 400, description = "Blank channel id"),
        (status = 403, description = "Bot lacks permission on the channel"),
        (status = 404, description = "Channel not found"),
        (status = 502, description = "Upstream unavailable")
    )
)]
pub async fn post_webhook(State(state): State<AppState>, Path(channel): Path<String>) -> Response {
    if channel.trim().is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    info!(channel = %channel, "Creating webhook");
    respond(state.ops.create_webhook(&channel).await)
}
