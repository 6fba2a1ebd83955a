//! Per-client token bucket rate limiting for API routes.
//!
//! Clients are keyed by the first hop of `X-Forwarded-For` when present,
//! otherwise by the peer address.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::metrics::RATE_LIMITED_TOTAL;
use crate::state::AppState;

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RETRY_AFTER_HEADER: &str = "x-ratelimit-retry-after";

/// Token bucket for a single client.
///
/// Tokens are added at a constant rate and consumed one per request. The
/// bucket starts full.
pub struct TokenBucket {
    /// Max tokens (= requests per minute).
    capacity: f64,
    /// Current available tokens.
    tokens: f64,
    /// Tokens added per second.
    refill_rate: f64,
    /// Last refill time.
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = f64::from(requests_per_minute);
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    /// Try to take a token.
    ///
    /// Returns the whole tokens left on success, or how long to wait for the
    /// next one.
    pub fn try_acquire(&mut self) -> Result<u32, Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(self.tokens.floor() as u32)
        } else {
            let tokens_needed = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(tokens_needed / self.refill_rate))
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Buckets by client key.
///
/// Thread-safe and async-compatible. Buckets are never evicted.
pub struct RateLimiter {
    requests_per_minute: u32,
    buckets: RwLock<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Take a token for `client`.
    pub async fn check(&self, client: &str) -> Result<u32, Duration> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::new(self.requests_per_minute))
            .try_acquire()
    }
}

/// Key a request by forwarded client address, peer address, or `"unknown"`.
pub fn client_key(request: &Request<Body>) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware.
///
/// Passes through when rate limiting is disabled. Otherwise answers 429 with
/// a JSON error body once the client's bucket is empty.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = state.rate_limiter() else {
        return next.run(request).await;
    };

    let client = client_key(&request);
    match limiter.check(&client).await {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert(REMAINING_HEADER, HeaderValue::from(remaining));
            response
        }
        Err(wait) => {
            RATE_LIMITED_TOTAL.inc();
            debug!(client = %client, wait_ms = wait.as_millis() as u64, "Rate limit exceeded");
            rate_limited_response(wait)
        }
    }
}

fn rate_limited_response(wait: Duration) -> Response {
    let body = json!({
        "errors": [{
            "message": "Rate limit exceeded. Please try again later.",
            "extensions": {
                "code": "RATE_LIMIT_EXCEEDED",
                "httpStatus": 429
            }
        }]
    });

    let retry_after = wait.as_secs_f64().ceil() as u64;
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(RETRY_AFTER_HEADER, HeaderValue::from(retry_after));
    response
}
