use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

// ============================================================================
// Dispatch Outcome Types
// ============================================================================

/// Classified result of a single HTTP attempt against the Discord API.
///
/// Closed variant set: every status the upstream can produce maps to exactly
/// one of these, and every consumer must branch on all of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 2xx with the (possibly null) response body
    Success(serde_json::Value),
    /// 4xx other than 403/429 - stable, a second identical attempt cannot fix it
    ClientRejected { status: u16 },
    /// 403 - the bot lacks permissions on the target resource
    Forbidden,
    /// 429 - bucket exhausted; no dispatch in this bucket before `retry_after`
    RateLimited { retry_after: Duration },
    /// 5xx (and out-of-partition statuses, see the classifier)
    ServerError { status: u16 },
    /// Network-level failure before any status was obtained
    TransportFailure,
}

impl Outcome {
    /// Plausibly transient: worth one more attempt under the retry budget.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Outcome::ServerError { .. } | Outcome::TransportFailure | Outcome::RateLimited { .. }
        )
    }

    /// Stable: retrying an identical request cannot change the result.
    pub fn is_stable(&self) -> bool {
        !self.is_transient()
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::ClientRejected { .. } => "client_rejected",
            Outcome::Forbidden => "forbidden",
            Outcome::RateLimited { .. } => "rate_limited",
            Outcome::ServerError { .. } => "server_error",
            Outcome::TransportFailure => "transport_failure",
        }
    }
}

/// Terminal state of a dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A stable classification was reached within the attempt budget.
    Completed(Outcome),
    /// Every attempt classified transient; the retry budget is spent.
    Exhausted { attempts: u32, last: Outcome },
}

// ============================================================================
// Caller-Facing Sentinels
// ============================================================================

/// What a caller adapter hands back to the facade: a payload or one of the
/// closed rejection sentinels. Callers check structurally, nothing is thrown.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    Payload(T),
    /// The resource does not exist (or the request was otherwise rejected)
    NotFound,
    /// The bot is not permitted to touch the resource
    MissingPermissions,
    /// Transient upstream trouble outlasted the retry budget
    UpstreamUnavailable,
}

impl<T> ApiResult<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            ApiResult::Payload(v) => ApiResult::Payload(f(v)),
            ApiResult::NotFound => ApiResult::NotFound,
            ApiResult::MissingPermissions => ApiResult::MissingPermissions,
            ApiResult::UpstreamUnavailable => ApiResult::UpstreamUnavailable,
        }
    }
}

// ============================================================================
// Discord Data Types
// ============================================================================

/// Webhook object as Discord returns it. Only ever deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWebhook {
    pub id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub token: Option<String>,
    pub application_id: Option<String>,
}

/// Sanitized webhook served by the facade. The token is stripped unless the
/// caller asked for it with the `tokens` directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Webhook {
    pub id: String,
    pub channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Webhook {
    pub fn sanitize(raw: RawWebhook, include_token: bool) -> Self {
        Self {
            id: raw.id,
            channel_id: raw.channel_id,
            guild_id: raw.guild_id,
            name: raw.name,
            avatar: raw.avatar,
            token: if include_token { raw.token } else { None },
        }
    }
}

/// Guild channel object as Discord returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGuildChannel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: Option<String>,
    pub position: Option<i32>,
    pub parent_id: Option<String>,
    pub nsfw: Option<bool>,
}

/// Sanitized guild channel served by the facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GuildChannel {
    pub id: String,
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub nsfw: bool,
}

impl GuildChannel {
    pub fn sanitize(raw: RawGuildChannel) -> Self {
        Self {
            id: raw.id,
            kind: raw.kind,
            name: raw.name,
            position: raw.position,
            parent_id: raw.parent_id,
            nsfw: raw.nsfw.unwrap_or(false),
        }
    }
}

/// Confirmation returned when a notification is delivered through a webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeliveredMessage {
    pub id: String,
    pub channel_id: String,
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Discord REST API base URL
    pub api_base_url: String,
    /// Bot token for the Authorization header; absent in tests
    pub bot_token: Option<String>,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// Process-wide outbound request cap; None disables the global limiter
    pub global_requests_per_second: Option<u32>,
    /// Name given to webhooks the gateway creates
    pub webhook_default_name: String,
    /// Avatar (base64 image data) for created webhooks
    pub webhook_default_avatar: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://discord.com/api/v10".to_string(),
            bot_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            global_requests_per_second: Some(50),
            webhook_default_name: "Gamedrop".to_string(),
            webhook_default_avatar: None,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_transient_partition() {
        assert!(Outcome::ServerError { status: 500 }.is_transient());
        assert!(Outcome::TransportFailure.is_transient());
        assert!(Outcome::RateLimited { retry_after: Duration::from_secs(1) }.is_transient());
        assert!(Outcome::Success(json!(null)).is_stable());
        assert!(Outcome::Forbidden.is_stable());
        assert!(Outcome::ClientRejected { status: 404 }.is_stable());
    }

    #[test]
    fn test_webhook_sanitize_strips_token() {
        let raw = RawWebhook {
            id: "w1".to_string(),
            channel_id: "c1".to_string(),
            guild_id: Some("g1".to_string()),
            name: Some("hook".to_string()),
            avatar: None,
            token: Some("secret".to_string()),
            application_id: None,
        };

        let stripped = Webhook::sanitize(raw.clone(), false);
        assert_eq!(stripped.token, None);

        let kept = Webhook::sanitize(raw, true);
        assert_eq!(kept.token, Some("secret".to_string()));
    }

    #[test]
    fn test_guild_channel_sanitize_defaults_nsfw() {
        let raw = RawGuildChannel {
            id: "c1".to_string(),
            kind: 0,
            name: Some("general".to_string()),
            position: Some(1),
            parent_id: None,
            nsfw: None,
        };

        let channel = GuildChannel::sanitize(raw);
        assert!(!channel.nsfw);
    }

    #[test]
    fn test_api_result_map_preserves_sentinels() {
        let ok: ApiResult<u32> = ApiResult::Payload(2);
        assert_eq!(ok.map(|v| v * 2), ApiResult::Payload(4));

        let missing: ApiResult<u32> = ApiResult::MissingPermissions;
        assert_eq!(missing.map(|v| v * 2), ApiResult::MissingPermissions);
    }
}
