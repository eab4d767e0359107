//! RestGateway - bucketed request dispatch against the Discord REST API
//!
//! One FIFO lane per rate-limit bucket:
//! - Lazily spawned worker task per bucket key, single request in flight
//! - Cooldown honored after a 429 before the bucket releases anything else
//! - Once-retry budget applied with an explicit attempt counter
//! - Optional process-global send-rate cap using governor

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use metrics::counter;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use gd_common::{GatewayConfig, GatewayError, Outcome, Resolution, Result};

use crate::bucket::bucket_key;
use crate::classify::classify;
use crate::retry::RetryPolicy;

const BUCKET_QUEUE_CAPACITY: usize = 100;
const BUCKET_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// One request against the upstream API. Owned by the gateway once
/// submitted; only the attempt counter changes after construction.
#[derive(Debug)]
pub struct RestRequest {
    pub id: String,
    pub method: reqwest::Method,
    pub bucket: String,
    pub endpoint: String,
    pub payload: Option<Value>,
    pub attempts: u32,
}

impl RestRequest {
    pub fn new(method: reqwest::Method, endpoint: impl Into<String>, payload: Option<Value>) -> Self {
        let endpoint = endpoint.into();
        Self {
            id: Uuid::new_v4().to_string(),
            method,
            bucket: bucket_key(&endpoint),
            endpoint,
            payload,
            attempts: 0,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(reqwest::Method::GET, endpoint, None)
    }

    pub fn post(endpoint: impl Into<String>, payload: Value) -> Self {
        Self::new(reqwest::Method::POST, endpoint, Some(payload))
    }
}

/// Queued request plus the channel its resolution travels back on.
struct BucketTask {
    request: RestRequest,
    resolve_tx: oneshot::Sender<Resolution>,
}

/// Rate-limited request gateway.
pub struct RestGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    policy: RetryPolicy,
    buckets: Arc<DashMap<String, mpsc::Sender<BucketTask>>>,
    global_limiter: Option<Arc<GlobalLimiter>>,
}

impl RestGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        if config.api_base_url.is_empty() {
            return Err(GatewayError::Config(
                "api_base_url must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        let global_limiter = config
            .global_requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Ok(Self {
            client,
            config,
            policy: RetryPolicy::default(),
            buckets: Arc::new(DashMap::new()),
            global_limiter,
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Live bucket count, for monitoring.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Queue a request under its bucket and await the resolution.
    ///
    /// Non-blocking for the caller beyond the await itself; requests in the
    /// same bucket resolve strictly FIFO, unrelated buckets are independent.
    pub async fn submit(&self, request: RestRequest) -> Resolution {
        let (resolve_tx, resolve_rx) = oneshot::channel();
        let mut task = BucketTask {
            request,
            resolve_tx,
        };

        loop {
            let tx = self.bucket_sender(&task.request.bucket);
            match tx.send(task).await {
                Ok(()) => break,
                Err(mpsc::error::SendError(returned)) => {
                    // the worker idled out between lookup and send; drop the
                    // stale entry and route through a fresh one
                    self.buckets
                        .remove_if(&returned.request.bucket, |_, v| v.same_channel(&tx));
                    task = returned;
                }
            }
        }

        match resolve_rx.await {
            Ok(resolution) => resolution,
            Err(_) => Resolution::Completed(Outcome::TransportFailure),
        }
    }

    /// Get or create the queue for a bucket, spawning its worker on first use.
    fn bucket_sender(&self, bucket: &str) -> mpsc::Sender<BucketTask> {
        if let Some(tx) = self.buckets.get(bucket) {
            return tx.clone();
        }

        self.buckets
            .entry(bucket.to_string())
            .or_insert_with(|| {
                let (tx, rx) = mpsc::channel(BUCKET_QUEUE_CAPACITY);
                let worker = BucketWorker {
                    bucket: bucket.to_string(),
                    client: self.client.clone(),
                    config: self.config.clone(),
                    policy: self.policy,
                    global_limiter: self.global_limiter.clone(),
                    cooldown_until: None,
                };
                tokio::spawn(worker.run(rx, Arc::clone(&self.buckets)));
                tx
            })
            .clone()
    }
}

/// Worker loop state for one bucket. The worker is the only dispatcher for
/// its bucket, which is what makes the single-in-flight invariant hold.
struct BucketWorker {
    bucket: String,
    client: reqwest::Client,
    config: GatewayConfig,
    policy: RetryPolicy,
    global_limiter: Option<Arc<GlobalLimiter>>,
    /// No dispatch in this bucket before this instant. Survives across
    /// tasks so queued requests wait out a 429 from an earlier one.
    cooldown_until: Option<Instant>,
}

impl BucketWorker {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<BucketTask>,
        buckets: Arc<DashMap<String, mpsc::Sender<BucketTask>>>,
    ) {
        debug!(bucket = %self.bucket, "Bucket worker started");

        loop {
            match time::timeout(BUCKET_IDLE_TIMEOUT, rx.recv()).await {
                Ok(Some(mut task)) => {
                    let resolution = self.dispatch(&mut task.request).await;
                    let _ = task.resolve_tx.send(resolution);
                }
                Ok(None) => break,
                Err(_) => {
                    // idle: deregister, then drain anything that raced in
                    debug!(bucket = %self.bucket, "Bucket idle timeout, cleaning up");
                    buckets.remove(&self.bucket);
                    rx.close();
                    while let Some(mut task) = rx.recv().await {
                        let resolution = self.dispatch(&mut task.request).await;
                        let _ = task.resolve_tx.send(resolution);
                    }
                    break;
                }
            }
        }

        debug!(bucket = %self.bucket, "Bucket worker exited");
    }

    /// Drive one request to resolution: QUEUED -> IN_FLIGHT -> CLASSIFIED,
    /// looping back on a retry decision, at most `policy.max_attempts`
    /// network calls.
    async fn dispatch(&mut self, request: &mut RestRequest) -> Resolution {
        let outcome = loop {
            if let Some(until) = self.cooldown_until.take() {
                if until > Instant::now() {
                    debug!(bucket = %self.bucket, "Cooling down before next dispatch");
                    time::sleep_until(until).await;
                }
            }
            if let Some(limiter) = &self.global_limiter {
                limiter.until_ready().await;
            }

            request.attempts += 1;
            let outcome = self.perform(request).await;
            counter!("gd_gateway_attempts_total", "outcome" => outcome.kind()).increment(1);

            if let Outcome::RateLimited { retry_after } = &outcome {
                // applies to every later dispatch in this bucket, a retry of
                // this request included
                self.cooldown_until = Some(Instant::now() + *retry_after);
            }

            if !self.policy.should_retry(&outcome, request.attempts) {
                break outcome;
            }

            counter!("gd_gateway_retries_total").increment(1);
            debug!(
                request_id = %request.id,
                attempts = request.attempts,
                outcome = outcome.kind(),
                "Transient outcome, retrying"
            );
        };

        if outcome.is_transient() {
            warn!(
                request_id = %request.id,
                bucket = %self.bucket,
                attempts = request.attempts,
                outcome = outcome.kind(),
                "Retry budget exhausted"
            );
            Resolution::Exhausted {
                attempts: request.attempts,
                last: outcome,
            }
        } else {
            Resolution::Completed(outcome)
        }
    }

    /// Exactly one network call, classified.
    async fn perform(&self, request: &RestRequest) -> Outcome {
        let url = format!("{}{}", self.config.api_base_url, request.endpoint);
        let mut call = self.client.request(request.method.clone(), &url);

        if let Some(token) = &self.config.bot_token {
            call = call.header(reqwest::header::AUTHORIZATION, format!("Bot {token}"));
        }
        if let Some(payload) = &request.payload {
            call = call.json(payload);
        }

        match call.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let header_retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<f64>().ok());
                // 204s and error pages have no JSON body
                let body = response.json::<Value>().await.unwrap_or(Value::Null);
                classify(status, &body, header_retry_after)
            }
            Err(e) => {
                warn!(
                    request_id = %request.id,
                    bucket = %self.bucket,
                    error = %e,
                    "Request failed before a status was obtained"
                );
                Outcome::TransportFailure
            }
        }
    }
}
