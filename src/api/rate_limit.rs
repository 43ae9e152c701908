//! Per-client rate limiting for API routes.
//!
//! Each (IP, tier) pair gets a bucket of tokens that refills gradually over
//! the configured window and is fully reset once the window has elapsed.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ApiError;
use crate::config::RateLimitConfig;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitTier {
    /// Guest-facing routes: quotes, bookings, promo validation, hall inquiries
    Public,
    /// Back-office routes
    Admin,
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    tokens: u32,
    window_start: Instant,
    last_request: Instant,
}

impl RateLimitEntry {
    fn new(max_tokens: u32) -> Self {
        let now = Instant::now();
        Self {
            tokens: max_tokens,
            window_start: now,
            last_request: now,
        }
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<(IpAddr, RateLimitTier), RateLimitEntry>,
    config: RateLimitConfig,
    window_duration: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub limit: u32,
    /// Seconds until the window resets
    pub reset_after: u64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            window_duration: Duration::from_secs(config.window_seconds.max(1)),
            config,
        }
    }

    /// Consume a token for `ip` on `tier`.
    /// Returns the bucket state when allowed, or the seconds to wait when not.
    pub fn check_rate_limit(&self, ip: IpAddr, tier: RateLimitTier) -> Result<RateLimitInfo, u64> {
        if !self.config.enabled {
            return Ok(RateLimitInfo {
                remaining: u32::MAX,
                limit: u32::MAX,
                reset_after: 0,
            });
        }

        let max_tokens = self.max_tokens(tier);
        let now = Instant::now();

        let mut entry = self
            .entries
            .entry((ip, tier))
            .or_insert_with(|| RateLimitEntry::new(max_tokens));

        let elapsed = now.duration_since(entry.window_start);
        if elapsed >= self.window_duration {
            entry.tokens = max_tokens;
            entry.window_start = now;
        } else {
            let since_last = now.duration_since(entry.last_request);
            let replenish_rate = max_tokens as f64 / self.window_duration.as_secs_f64();
            let replenished = (since_last.as_secs_f64() * replenish_rate) as u32;
            entry.tokens = entry.tokens.saturating_add(replenished).min(max_tokens);
        }
        entry.last_request = now;

        let reset_after = self
            .window_duration
            .saturating_sub(now.duration_since(entry.window_start))
            .as_secs();

        if entry.tokens > 0 {
            entry.tokens -= 1;
            Ok(RateLimitInfo {
                remaining: entry.tokens,
                limit: max_tokens,
                reset_after,
            })
        } else {
            Err(reset_after.max(1))
        }
    }

    pub fn max_tokens(&self, tier: RateLimitTier) -> u32 {
        match tier {
            RateLimitTier::Public => self.config.public_requests_per_window,
            RateLimitTier::Admin => self.config.admin_requests_per_window,
        }
    }

    /// Drop buckets idle for more than two windows
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let expiry = self.window_duration * 2;
        self.entries
            .retain(|_, entry| now.duration_since(entry.window_start) < expiry);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Client address: proxy headers first, then the socket peer, then loopback.
fn extract_client_ip(request: &Request<Body>) -> IpAddr {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(Ok(ip)) = forwarded.split(',').next().map(|s| s.trim().parse::<IpAddr>()) {
            return ip;
        }
    }

    if let Some(Ok(ip)) = header("x-real-ip").map(|s| s.trim().parse::<IpAddr>()) {
        return ip;
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub async fn rate_limit_public(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    rate_limit_with_tier(state, request, next, RateLimitTier::Public).await
}

pub async fn rate_limit_admin(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    rate_limit_with_tier(state, request, next, RateLimitTier::Admin).await
}

async fn rate_limit_with_tier(
    state: Arc<AppState>,
    request: Request<Body>,
    next: Next,
    tier: RateLimitTier,
) -> Response {
    let ip = extract_client_ip(&request);
    let limit = state.rate_limiter.max_tokens(tier);

    match state.rate_limiter.check_rate_limit(ip, tier) {
        Ok(info) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(info.limit));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(info.remaining));
            headers.insert("X-RateLimit-Reset", HeaderValue::from(info.reset_after));
            response
        }
        Err(retry_after) => {
            tracing::warn!(%ip, ?tier, retry_after, "Rate limit exceeded");
            let mut response = ApiError::rate_limited(format!(
                "Rate limit exceeded. Try again in {} seconds.",
                retry_after
            ))
            .into_response();
            let headers = response.headers_mut();
            headers.insert("Retry-After", HeaderValue::from(retry_after));
            headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
            response
        }
    }
}

/// Periodically evict stale buckets
pub fn spawn_cleanup_task(rate_limiter: Arc<RateLimiter>, cleanup_interval_secs: u64) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(cleanup_interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            rate_limiter.cleanup_expired();
            tracing::debug!(
                entries = rate_limiter.entry_count(),
                "Rate limiter cleanup complete"
            );
        }
    });
}
