//! Retry policy.
//!
//! Stateless decision over (outcome, attempts made so far). The attempt
//! counter lives in the dispatch loop, never in recursion, so the budget
//! stays enforceable.

use gd_common::Outcome;

/// Once-retry policy: transient outcomes get one more attempt, stable
/// outcomes none. A 429 retry additionally waits out the bucket cooldown
/// before the next attempt is released.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts allowed per request, initial call included.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, outcome: &Outcome, attempts_so_far: u32) -> bool {
        attempts_so_far < self.max_attempts && outcome.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_transient_outcomes_retry_within_budget() {
        let policy = RetryPolicy::default();
        let transients = [
            Outcome::ServerError { status: 500 },
            Outcome::TransportFailure,
            Outcome::RateLimited {
                retry_after: Duration::from_secs(1),
            },
        ];

        for outcome in &transients {
            assert!(policy.should_retry(outcome, 1), "{:?}", outcome);
            assert!(!policy.should_retry(outcome, 2), "{:?}", outcome);
        }
    }

    #[test]
    fn test_stable_outcomes_never_retry() {
        let policy = RetryPolicy::default();
        let stables = [
            Outcome::Success(json!(null)),
            Outcome::Forbidden,
            Outcome::ClientRejected { status: 404 },
        ];

        for outcome in &stables {
            assert!(!policy.should_retry(outcome, 1), "{:?}", outcome);
        }
    }
}
