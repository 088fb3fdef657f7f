//! Fixed-window rate limiting, one limiter instance per tier.
//!
//! Two tiers are stacked in the pipeline: a global tier covering every path
//! and a stricter tier scoped to `/api/`. Each limiter owns its counters, so
//! exhausting one tier never touches the other.
//!
//! # Design Decisions
//! - Keyed by resolved client IP ([`ClientIp`])
//! - Rejected requests do not count: a window's count never exceeds its cap
//! - Counters are per-process; horizontally scaled instances limit independently
//! - Expired windows are purged by a background sweeper

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::TierConfig;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::routing::{Matcher, PathPrefixMatcher};
use crate::security::client_ip::ClientIp;

pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
pub const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Static description of one tier.
#[derive(Debug, Clone)]
pub struct RateLimitTier {
    pub name: &'static str,
    pub window: Duration,
    pub max_requests: u32,
    pub message: &'static str,
    /// `None` applies the tier to every request.
    pub scope: Option<PathPrefixMatcher>,
}

impl RateLimitTier {
    /// Tier A: every path.
    pub fn global(config: TierConfig) -> Self {
        Self {
            name: "global",
            window: config.window(),
            max_requests: config.max_requests,
            message: "Too many requests from this IP, please try again later.",
            scope: None,
        }
    }

    /// Tier B: `/api/` only.
    pub fn api(config: TierConfig) -> Self {
        Self {
            name: "api",
            window: config.window(),
            max_requests: config.max_requests,
            message: "Too many API requests, please try again later.",
            scope: Some(PathPrefixMatcher::api()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Quota state reported back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl Quota {
    /// Write `RateLimit-*` headers. With `overwrite == false` existing values
    /// are kept, so the innermost (most specific) tier wins.
    pub fn apply(&self, headers: &mut HeaderMap, overwrite: bool) {
        if !overwrite && headers.contains_key(&RATELIMIT_LIMIT) {
            return;
        }
        headers.insert(RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(RATELIMIT_RESET, HeaderValue::from(self.reset_secs()));
    }

    /// Seconds until the window resets, rounded up.
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed(Quota),
    Limited(Quota),
}

/// Per-tier limiter with its own counter store.
#[derive(Debug)]
pub struct RateLimiter {
    tier: RateLimitTier,
    windows: DashMap<IpAddr, Window>,
}

impl RateLimiter {
    pub fn new(tier: RateLimitTier) -> Self {
        Self {
            tier,
            windows: DashMap::new(),
        }
    }

    pub fn tier(&self) -> &RateLimitTier {
        &self.tier
    }

    /// Whether this tier covers the request.
    pub fn applies_to(&self, request: &Request) -> bool {
        self.tier
            .scope
            .as_ref()
            .map(|scope| scope.matches(request))
            .unwrap_or(true)
    }

    pub fn check(&self, client: IpAddr) -> Decision {
        self.check_at(client, Instant::now())
    }

    /// Count a request from `client` at `now`.
    pub fn check_at(&self, client: IpAddr, now: Instant) -> Decision {
        let mut window = self.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.tier.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        let reset_after = self
            .tier
            .window
            .saturating_sub(now.saturating_duration_since(window.started));

        if window.count >= self.tier.max_requests {
            return Decision::Limited(Quota {
                limit: self.tier.max_requests,
                remaining: 0,
                reset_after,
            });
        }

        window.count += 1;
        Decision::Allowed(Quota {
            limit: self.tier.max_requests,
            remaining: self.tier.max_requests - window.count,
            reset_after,
        })
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        let window = self.tier.window;
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of clients currently tracked.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

/// Human-readable window length for the `retryAfter` field.
pub fn describe_window(window: Duration) -> String {
    let secs = window.as_secs();
    let (amount, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };

    if amount == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", amount, unit)
    }
}

/// Middleware enforcing one tier.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    Extension(ClientIp(client)): Extension<ClientIp>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.applies_to(&request) {
        return next.run(request).await;
    }

    match limiter.check(client) {
        Decision::Allowed(quota) => {
            let mut response = next.run(request).await;
            quota.apply(response.headers_mut(), false);
            response
        }
        Decision::Limited(quota) => {
            let tier = limiter.tier();
            tracing::warn!(
                client = %client,
                tier = tier.name,
                path = %request.uri().path(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(tier.name);

            let mut response = ApiError::RateLimited {
                message: tier.message.to_string(),
                retry_after: describe_window(tier.window),
            }
            .into_response();
            let headers = response.headers_mut();
            quota.apply(headers, true);
            headers.insert(header::RETRY_AFTER, HeaderValue::from(quota.reset_secs()));
            response
        }
    }
}

/// Periodically purge expired windows until shutdown.
pub async fn run_sweeper(
    limiters: Vec<Arc<RateLimiter>>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                for limiter in &limiters {
                    let removed = limiter.sweep_at(now);
                    if removed > 0 {
                        tracing::debug!(
                            tier = limiter.tier().name,
                            removed,
                            tracked = limiter.tracked(),
                            "Swept expired rate limit windows"
                        );
                    }
                }
            }
            _ = shutdown.recv() => {
                tracing::debug!("Rate limit sweeper stopping");
                return;
            }
        }
    }
}
