//! Response classification.
//!
//! The single seam every retry and caller-visible-error decision hangs off.
//! New status handling belongs here, never at call sites.

use gd_common::Outcome;
use serde_json::Value;
use std::time::Duration;

/// Cooldown applied when a 429 carries no usable retry-after value.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Map one HTTP attempt to its [`Outcome`]. Total over the status space.
///
/// `header_retry_after` is the parsed `Retry-After` header in seconds,
/// consulted when the 429 body has no `retry_after` field.
pub fn classify(status: u16, body: &Value, header_retry_after: Option<f64>) -> Outcome {
    match status {
        200..=299 => Outcome::Success(body.clone()),
        403 => Outcome::Forbidden,
        429 => Outcome::RateLimited {
            retry_after: retry_after(body, header_retry_after),
        },
        400..=499 => Outcome::ClientRejected { status },
        500..=599 => Outcome::ServerError { status },
        // 1xx/3xx never carry a usable payload at this seam; treat them as
        // server faults so they stay inside the transient retry path
        _ => Outcome::ServerError { status },
    }
}

/// Normalize the upstream retry-after (seconds, possibly fractional) to a
/// millisecond-precision duration.
fn retry_after(body: &Value, header_secs: Option<f64>) -> Duration {
    let secs = body.get("retry_after").and_then(Value::as_f64).or(header_secs);
    match secs {
        Some(s) if s >= 0.0 => Duration::from_millis((s * 1000.0) as u64),
        _ => DEFAULT_COOLDOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_range() {
        for status in 200..300 {
            let outcome = classify(status, &json!({"id": "1"}), None);
            assert!(
                matches!(outcome, Outcome::Success(_)),
                "status {} should classify as success",
                status
            );
        }
    }

    #[test]
    fn test_server_error_range() {
        for status in 500..600 {
            assert_eq!(
                classify(status, &Value::Null, None),
                Outcome::ServerError { status },
                "status {} should classify as server error",
                status
            );
        }
    }

    #[test]
    fn test_client_range_excludes_forbidden_and_rate_limited() {
        for status in 400..500 {
            let outcome = classify(status, &Value::Null, None);
            match status {
                403 => assert_eq!(outcome, Outcome::Forbidden),
                429 => assert!(matches!(outcome, Outcome::RateLimited { .. })),
                _ => assert_eq!(outcome, Outcome::ClientRejected { status }),
            }
        }
    }

    #[test]
    fn test_out_of_partition_statuses_are_server_faults() {
        assert_eq!(
            classify(100, &Value::Null, None),
            Outcome::ServerError { status: 100 }
        );
        assert_eq!(
            classify(301, &Value::Null, None),
            Outcome::ServerError { status: 301 }
        );
    }

    #[test]
    fn test_retry_after_from_body() {
        let outcome = classify(429, &json!({"retry_after": 2.5}), None);
        assert_eq!(
            outcome,
            Outcome::RateLimited {
                retry_after: Duration::from_millis(2500)
            }
        );
    }

    #[test]
    fn test_retry_after_header_fallback() {
        let outcome = classify(429, &Value::Null, Some(3.0));
        assert_eq!(
            outcome,
            Outcome::RateLimited {
                retry_after: Duration::from_secs(3)
            }
        );
    }

    #[test]
    fn test_retry_after_defaults_when_absent() {
        let outcome = classify(429, &Value::Null, None);
        assert_eq!(
            outcome,
            Outcome::RateLimited {
                retry_after: DEFAULT_COOLDOWN
            }
        );
    }

    #[test]
    fn test_body_retry_after_wins_over_header() {
        let outcome = classify(429, &json!({"retry_after": 1.0}), Some(9.0));
        assert_eq!(
            outcome,
            Outcome::RateLimited {
                retry_after: Duration::from_secs(1)
            }
        );
    }
}
