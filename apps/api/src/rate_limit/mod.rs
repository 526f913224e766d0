//! Fixed-window rate limiting for the AI routes.
//!
//! Default backend is an in-process map. When `REDIS_URL` is set the window
//! counters live in Redis so several API instances share one budget.
//!
//! `AppState` holds an `Arc<dyn RateLimiter>`, chosen at startup.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::errors::AppError;
use crate::state::AppState;

/// Entries beyond this count trigger a sweep of expired windows.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one request for `key` and decides whether it may proceed.
    async fn check(&self, key: &str) -> Result<RateDecision>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-process backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

pub struct InMemoryRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateDecision> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        if windows.len() > SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                count: 0,
                started: now,
            };
        }

        entry.count = entry.count.saturating_add(1);
        if entry.count > self.max_requests {
            let remaining = self.window.saturating_sub(now.duration_since(entry.started));
            return Ok(RateDecision::Limited {
                retry_after_secs: remaining.as_secs_f64().ceil().max(1.0) as u64,
            });
        }

        Ok(RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis backend
// ────────────────────────────────────────────────────────────────────────────

/// Counters keyed by `ratelimit:{caller}:{window index}`; each key expires
/// with its window.
pub struct RedisRateLimiter {
    connection: MultiplexedConnection,
    max_requests: u32,
    window_secs: u64,
}

impl RedisRateLimiter {
    pub async fn connect(client: &redis::Client, max_requests: u32, window_secs: u64) -> Result<Self> {
        let connection = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            connection,
            max_requests,
            window_secs: window_secs.max(1),
        })
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &str) -> Result<RateDecision> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let window_index = now / self.window_secs;
        let redis_key = format!("ratelimit:{key}:{window_index}");

        let mut connection = self.connection.clone();
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(&redis_key, 1u64)
            .expire(&redis_key, self.window_secs as i64)
            .ignore()
            .query_async(&mut connection)
            .await?;

        if count > u64::from(self.max_requests) {
            return Ok(RateDecision::Limited {
                retry_after_secs: self.window_secs - (now % self.window_secs),
            });
        }

        Ok(RateDecision::Allowed {
            remaining: (u64::from(self.max_requests) - count) as u32,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Middleware
// ────────────────────────────────────────────────────────────────────────────

/// Caller identity. The socket peer address, unless `trust_proxy_headers` is
/// set, in which case the first `X-Forwarded-For` hop, then `X-Real-IP`, take
/// precedence. Those headers are client-controlled without a trusted proxy.
pub fn caller_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
    let peer_key = || peer.map(|addr| addr.ip().to_string());
    if !trust_proxy_headers {
        return peer_key().unwrap_or_else(|| "unknown".to_string());
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(peer_key)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rejects the request with 429 once the caller's window budget is spent.
/// Backend failures let the request through.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = caller_key(request.headers(), peer, state.config.trust_proxy_headers);
    let path = request.uri().path().to_string();

    match state.rate_limiter.check(&key).await {
        Ok(RateDecision::Allowed { remaining }) => {
            debug!(caller = %key, path = %path, remaining, "Request allowed by rate limiter");
        }
        Ok(RateDecision::Limited { retry_after_secs }) => {
            warn!(caller = %key, path = %path, retry_after_secs, "Request blocked by rate limiter");
            return Err(AppError::TooManyRequests { retry_after_secs });
        }
        Err(e) => {
            error!(caller = %key, "Rate limiter unavailable, allowing request: {e:?}");
        }
    }

    Ok(next.run(request).await)
}
