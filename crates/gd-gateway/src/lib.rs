//! Gamedrop Discord REST gateway
//!
//! This crate provides the rate-limited dispatch core and the typed
//! operations built on it:
//! - RestGateway: per-bucket FIFO queues, cooldown handling, once-retry budget
//! - bucket_key: pure bucket identity derivation from the target route
//! - classify: status-code classification into the closed `Outcome` set
//! - RetryPolicy: stateless retry decision
//! - WebhooksApi / GuildsApi: caller adapters mapping resolutions to sentinels

pub mod bucket;
pub mod classify;
pub mod gateway;
pub mod guilds;
pub mod retry;
pub mod webhooks;

pub use bucket::bucket_key;
pub use classify::classify;
pub use gateway::{RestGateway, RestRequest};
pub use guilds::GuildsApi;
pub use retry::RetryPolicy;
pub use webhooks::WebhooksApi;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use gd_common::{ApiResult, DeliveredMessage, GuildChannel, Outcome, Resolution, Webhook};

/// Operations the REST facade consumes. The facade only ever sees sentinel
/// results; classification and retries stay behind this seam.
#[async_trait]
pub trait DiscordOps: Send + Sync {
    async fn fetch_webhooks(&self, channel: &str, directives: &[String])
        -> ApiResult<Vec<Webhook>>;

    async fn create_webhook(&self, channel: &str) -> ApiResult<Webhook>;

    async fn fetch_guild_channels(
        &self,
        guild: &str,
        directives: &[String],
    ) -> ApiResult<Vec<GuildChannel>>;

    async fn execute_webhook(
        &self,
        webhook_id: &str,
        token: &str,
        payload: Value,
    ) -> ApiResult<DeliveredMessage>;
}

/// Gateway-backed implementation of [`DiscordOps`].
pub struct DiscordRest {
    webhooks: WebhooksApi,
    guilds: GuildsApi,
}

impl DiscordRest {
    pub fn new(gateway: Arc<RestGateway>) -> Self {
        Self {
            webhooks: WebhooksApi::new(Arc::clone(&gateway)),
            guilds: GuildsApi::new(gateway),
        }
    }
}

#[async_trait]
impl DiscordOps for DiscordRest {
    async fn fetch_webhooks(
        &self,
        channel: &str,
        directives: &[String],
    ) -> ApiResult<Vec<Webhook>> {
        self.webhooks.fetch_webhooks(channel, directives).await
    }

    async fn create_webhook(&self, channel: &str) -> ApiResult<Webhook> {
        self.webhooks.create_webhook(channel).await
    }

    async fn fetch_guild_channels(
        &self,
        guild: &str,
        directives: &[String],
    ) -> ApiResult<Vec<GuildChannel>> {
        self.guilds.fetch_guild_channels(guild, directives).await
    }

    async fn execute_webhook(
        &self,
        webhook_id: &str,
        token: &str,
        payload: Value,
    ) -> ApiResult<DeliveredMessage> {
        self.webhooks.execute_webhook(webhook_id, token, payload).await
    }
}

/// Map a resolution to the caller-facing sentinel set. `parse` handles the
/// success payload; a parse failure is not retried (the data will not get
/// better) and reads as unavailable to the caller.
pub(crate) fn map_resolution<T>(
    resolution: Resolution,
    parse: impl FnOnce(Value) -> ApiResult<T>,
) -> ApiResult<T> {
    match resolution {
        Resolution::Completed(Outcome::Success(body)) => parse(body),
        Resolution::Completed(Outcome::Forbidden) => ApiResult::MissingPermissions,
        Resolution::Completed(Outcome::ClientRejected { .. }) => ApiResult::NotFound,
        Resolution::Completed(Outcome::RateLimited { .. })
        | Resolution::Completed(Outcome::ServerError { .. })
        | Resolution::Completed(Outcome::TransportFailure)
        | Resolution::Exhausted { .. } => ApiResult::UpstreamUnavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_map_resolution_sentinels() {
        let forbidden: ApiResult<()> =
            map_resolution(Resolution::Completed(Outcome::Forbidden), |_| {
                ApiResult::Payload(())
            });
        assert_eq!(forbidden, ApiResult::MissingPermissions);

        let rejected: ApiResult<()> = map_resolution(
            Resolution::Completed(Outcome::ClientRejected { status: 404 }),
            |_| ApiResult::Payload(()),
        );
        assert_eq!(rejected, ApiResult::NotFound);

        let exhausted: ApiResult<()> = map_resolution(
            Resolution::Exhausted {
                attempts: 2,
                last: Outcome::ServerError { status: 502 },
            },
            |_| ApiResult::Payload(()),
        );
        assert_eq!(exhausted, ApiResult::UpstreamUnavailable);
    }

    #[test]
    fn test_map_resolution_runs_parser_on_success_only() {
        let ok = map_resolution(
            Resolution::Completed(Outcome::Success(json!({"id": "1"}))),
            |body| ApiResult::Payload(body["id"].as_str().unwrap_or_default().to_string()),
        );
        assert_eq!(ok, ApiResult::Payload("1".to_string()));

        let unavailable: ApiResult<String> = map_resolution(
            Resolution::Completed(Outcome::RateLimited {
                retry_after: Duration::from_secs(1),
            }),
            |_| panic!("parser must not run without a success payload"),
        );
        assert_eq!(unavailable, ApiResult::UpstreamUnavailable);
    }
}
