//! Per-client rate limiting for the contact form.
//!
//! Fixed window: the first accepted request from a client opens a window; at most
//! `contact_max_requests` requests are accepted until the window elapses.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ApiError;
use crate::config::RateLimitConfig;
use crate::AppState;

#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

/// Thread-safe rate limiter keyed by client address
#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    config: RateLimitConfig,
    window_duration: Duration,
}

/// Information about rate limit status
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Remaining requests in the current window
    pub remaining: u32,
    /// Maximum requests per window
    pub limit: u32,
    /// Seconds until the window resets
    pub reset_after: u64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            window_duration: Duration::from_secs(config.contact_window_seconds),
            config,
        }
    }

    /// Count a request from `client`.
    /// Returns Ok(info) if allowed, Err(retry_after_seconds) if rate limited.
    pub fn check(&self, client: &str) -> Result<RateLimitInfo, u64> {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> Result<RateLimitInfo, u64> {
        let limit = self.config.contact_max_requests;
        if !self.config.enabled {
            return Ok(RateLimitInfo {
                remaining: u32::MAX,
                limit: u32::MAX,
                reset_after: 0,
            });
        }

        let mut entry = self
            .entries
            .entry(client.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                window_start: now,
            });

        let mut elapsed = now.saturating_duration_since(entry.window_start);
        if elapsed >= self.window_duration {
            entry.count = 0;
            entry.window_start = now;
            elapsed = Duration::ZERO;
        }

        let reset_after = self.window_duration.saturating_sub(elapsed).as_secs().max(1);

        if entry.count >= limit {
            return Err(reset_after);
        }

        entry.count += 1;
        Ok(RateLimitInfo {
            remaining: limit - entry.count,
            limit,
            reset_after,
        })
    }

    /// Clean up expired entries to prevent memory leaks
    pub fn cleanup_expired(&self) {
        self.cleanup_expired_at(Instant::now());
    }

    fn cleanup_expired_at(&self, now: Instant) {
        let window = self.window_duration;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.window_start) < window);
    }

    /// Get the number of tracked entries (for monitoring)
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Identify the client by peer address. With `trust_proxy_headers`, the first
/// `X-Forwarded-For` hop or `X-Real-IP` takes precedence.
pub fn client_address(
    headers: &HeaderMap,
    conn_info: Option<&SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_client(headers) {
            return ip;
        }
    }

    conn_info
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first_ip) = forwarded.split(',').next() {
            let ip = first_ip.trim();
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// Rate limiting middleware for the contact endpoint
pub async fn rate_limit_contact(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let conn_info = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_address(
        request.headers(),
        conn_info.as_ref(),
        state.config.server.trust_proxy_headers,
    );

    match state.rate_limiter.check(&client) {
        Ok(info) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", info.limit.into());
            headers.insert("x-ratelimit-remaining", info.remaining.into());
            headers.insert("x-ratelimit-reset", info.reset_after.into());
            Ok(response)
        }
        Err(retry_after) => {
            tracing::warn!(client = %client, "Contact form rate limit exceeded");
            Err((
                [("retry-after", retry_after.to_string())],
                ApiError::rate_limited("Too many requests. Please try again later."),
            )
                .into_response())
        }
    }
}

/// Spawn a background task to periodically clean up expired rate limit entries
pub fn spawn_cleanup_task(rate_limiter: Arc<RateLimiter>, cleanup_interval_secs: u64) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(cleanup_interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            rate_limiter.cleanup_expired();
            tracing::debug!(
                "Rate limiter cleanup complete, {} entries remaining",
                rate_limiter.entry_count()
            );
        }
    });
}
