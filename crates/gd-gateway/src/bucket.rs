//! Bucket key resolution.

/// Derive the rate-limit bucket for an endpoint path.
///
/// Discord scopes its limits by the owning resource, so the key is the
/// route family plus the first resource id: `/channels/123/webhooks` maps
/// to `channels:123`, `/webhooks/{id}/{token}` to `webhooks:{id}`. Pure
/// function of the route, no state.
pub fn bucket_key(endpoint: &str) -> String {
    let mut segments = endpoint.trim_start_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some(family), Some(id)) if !id.is_empty() => format!("{family}:{id}"),
        (Some(family), _) if !family.is_empty() => family.to_string(),
        _ => "global".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_routes_get_per_resource_buckets() {
        assert_eq!(bucket_key("/channels/123/webhooks"), "channels:123");
        assert_eq!(bucket_key("/guilds/9/channels"), "guilds:9");
        assert_eq!(bucket_key("/webhooks/w1/tok?wait=true"), "webhooks:w1");
    }

    #[test]
    fn test_same_resource_same_bucket() {
        assert_eq!(
            bucket_key("/channels/123/webhooks"),
            bucket_key("/channels/123/messages")
        );
        assert_ne!(
            bucket_key("/channels/123/webhooks"),
            bucket_key("/channels/456/webhooks")
        );
    }

    #[test]
    fn test_degenerate_routes_fall_back() {
        assert_eq!(bucket_key("/gateway"), "gateway");
        assert_eq!(bucket_key("/"), "global");
        assert_eq!(bucket_key(""), "global");
    }
}
