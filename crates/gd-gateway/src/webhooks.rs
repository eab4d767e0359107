//! Webhook operations.
//!
//! Each operation builds one request, submits it, and maps the resolution
//! to a sentinel result. Retrying is the gateway's job alone; a second
//! create issued here could double-create a webhook.

use std::sync::Arc;

use serde_json::Value;
use tracing::error;

use gd_common::{ApiResult, DeliveredMessage, RawWebhook, Webhook};

use crate::gateway::{RestGateway, RestRequest};
use crate::map_resolution;

pub struct WebhooksApi {
    gateway: Arc<RestGateway>,
}

impl WebhooksApi {
    pub fn new(gateway: Arc<RestGateway>) -> Self {
        Self { gateway }
    }

    /// List the webhooks of a channel. Tokens are stripped unless the
    /// `tokens` directive is present.
    pub async fn fetch_webhooks(
        &self,
        channel: &str,
        directives: &[String],
    ) -> ApiResult<Vec<Webhook>> {
        let include_tokens = directives.iter().any(|d| d == "tokens");
        let request = RestRequest::get(format!("/channels/{channel}/webhooks"));

        let resolution = self.gateway.submit(request).await;
        map_resolution(resolution, |body| parse_webhook_list(body, include_tokens))
    }

    /// Create a webhook in a channel with the configured identity. The
    /// token is kept on the created webhook so the caller can post with it.
    pub async fn create_webhook(&self, channel: &str) -> ApiResult<Webhook> {
        let config = self.gateway.config();
        let mut payload = serde_json::json!({ "name": config.webhook_default_name });
        if let Some(avatar) = &config.webhook_default_avatar {
            payload["avatar"] = Value::String(avatar.clone());
        }

        let request = RestRequest::post(format!("/channels/{channel}/webhooks"), payload);

        let resolution = self.gateway.submit(request).await;
        map_resolution(resolution, |body| parse_webhook(body, true))
    }

    /// Post a notification payload through an existing webhook.
    pub async fn execute_webhook(
        &self,
        webhook_id: &str,
        token: &str,
        payload: Value,
    ) -> ApiResult<DeliveredMessage> {
        let request = RestRequest::post(format!("/webhooks/{webhook_id}/{token}?wait=true"), payload);

        let resolution = self.gateway.submit(request).await;
        map_resolution(resolution, parse_delivery)
    }
}

fn parse_webhook_list(body: Value, include_tokens: bool) -> ApiResult<Vec<Webhook>> {
    match serde_json::from_value::<Vec<RawWebhook>>(body) {
        Ok(raw) => ApiResult::Payload(
            raw.into_iter()
                .map(|w| Webhook::sanitize(w, include_tokens))
                .collect(),
        ),
        Err(e) => {
            error!(error = %e, "Failed to parse webhook list payload");
            ApiResult::UpstreamUnavailable
        }
    }
}

fn parse_webhook(body: Value, include_token: bool) -> ApiResult<Webhook> {
    match serde_json::from_value::<RawWebhook>(body) {
        Ok(raw) => ApiResult::Payload(Webhook::sanitize(raw, include_token)),
        Err(e) => {
            error!(error = %e, "Failed to parse webhook payload");
            ApiResult::UpstreamUnavailable
        }
    }
}

fn parse_delivery(body: Value) -> ApiResult<DeliveredMessage> {
    match serde_json::from_value::<DeliveredMessage>(body) {
        Ok(message) => ApiResult::Payload(message),
        Err(e) => {
            error!(error = %e, "Failed to parse webhook execution payload");
            ApiResult::UpstreamUnavailable
        }
    }
}
