//! Guild routes

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::common::respond;
use crate::AppState;

/// List a guild's channels
#[utoipa::path(
    get,
    path = "/guilds/{guild}",
    tag = "guilds",
    params(
        ("guild" = String, Path, description = "Guild id")
    ),
    responses(
        (status = 200, description = "Channels of the guild", body = Vec<gd_common::GuildChannel>),
        (status = 400, description = "Blank guild id"),
        (status = 403, description = "Bot lacks permission on the guild"),
        (status = 404, description = "Guild not found"),
        (status = 502, description = "Upstream unavailable")
    )
)]
pub async fn get_guild(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if guild.trim().is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let directives: Vec<String> = query.into_keys().collect();
    respond(state.ops.fetch_guild_channels(&guild, &directives).await)
}
