//! Guild operations.

use std::sync::Arc;

use serde_json::Value;
use tracing::error;

use gd_common::{ApiResult, GuildChannel, RawGuildChannel};

use crate::gateway::{RestGateway, RestRequest};
use crate::map_resolution;

// Channel kinds a webhook can post into
const CHANNEL_KIND_TEXT: u8 = 0;
const CHANNEL_KIND_ANNOUNCEMENT: u8 = 5;

pub struct GuildsApi {
    gateway: Arc<RestGateway>,
}

impl GuildsApi {
    pub fn new(gateway: Arc<RestGateway>) -> Self {
        Self { gateway }
    }

    /// List a guild's channels. The `text` directive narrows the result to
    /// channels notifications can actually be posted into.
    pub async fn fetch_guild_channels(
        &self,
        guild: &str,
        directives: &[String],
    ) -> ApiResult<Vec<GuildChannel>> {
        let text_only = directives.iter().any(|d| d == "text");
        let request = RestRequest::get(format!("/guilds/{guild}/channels"));

        let resolution = self.gateway.submit(request).await;
        map_resolution(resolution, |body| parse_channel_list(body, text_only))
    }
}

fn parse_channel_list(body: Value, text_only: bool) -> ApiResult<Vec<GuildChannel>> {
    match serde_json::from_value::<Vec<RawGuildChannel>>(body) {
        Ok(raw) => ApiResult::Payload(
            raw.into_iter()
                .map(GuildChannel::sanitize)
                .filter(|c| {
                    !text_only || c.kind == CHANNEL_KIND_TEXT || c.kind == CHANNEL_KIND_ANNOUNCEMENT
                })
                .collect(),
        ),
        Err(e) => {
            error!(error = %e, "Failed to parse guild channel payload");
            ApiResult::UpstreamUnavailable
        }
    }
}
