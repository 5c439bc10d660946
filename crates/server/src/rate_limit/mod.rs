//! Fixed-window request throttling keyed by client IP and route.
//!
//! State lives in a process-local [`RateLimitStore`]. Running several server
//! instances behind a load balancer multiplies every limit by the instance
//! count; there is no shared backend.
//!
//! ## Submodules
//!
//! - `clock` - injectable time source
//! - `middleware` - axum middleware and client IP extraction

pub mod clock;
pub mod middleware;

pub use clock::{Clock, ManualClock, SystemClock, duration_ms};
pub use middleware::{client_ip, enforce_rate_limit};

use crate::config::{RateLimitRule, RateLimitsConfig};
use axum::Json;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::task::JoinHandle;

/// Counter for one `(client, route)` pair within the current window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    /// End of the window, epoch milliseconds. Fixed when the entry is created.
    pub reset_time_ms: i64,
}

/// Shared counter map plus the clock every limiter reads.
#[derive(Clone)]
pub struct RateLimitStore {
    entries: Arc<DashMap<String, RateLimitEntry>>,
    clock: Arc<dyn Clock>,
}

impl Default for RateLimitStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl RateLimitStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            clock,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| *e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry whose window has ended. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.reset_time_ms);
        before.saturating_sub(self.entries.len())
    }

    /// Runs [`Self::sweep`] every `every` until the returned handle is aborted.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = store.sweep();
                if removed > 0 {
                    tracing::debug!(
                        name = "rate_limit.sweep",
                        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                        removed,
                        remaining = store.len(),
                        message = "Swept expired rate limit entries"
                    );
                }
            }
        })
    }
}

/// Returned instead of letting a throttled request through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitRejection {
    pub limit: u32,
    pub reset_time_ms: i64,
    pub retry_after_secs: u64,
    pub message: String,
}

impl RateLimitRejection {
    /// Window end as an RFC 3339 timestamp.
    pub fn reset_at(&self) -> String {
        OffsetDateTime::from_unix_timestamp_nanos(self.reset_time_ms as i128 * 1_000_000)
            .ok()
            .and_then(|t| t.format(&Rfc3339).ok())
            .unwrap_or_default()
    }
}

impl IntoResponse for RateLimitRejection {
    fn into_response(self) -> Response {
        let headers = [
            (
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(self.limit),
            ),
            (
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from_static("0"),
            ),
            (
                HeaderName::from_static("x-ratelimit-reset"),
                HeaderValue::from_str(&self.reset_at())
                    .unwrap_or_else(|_| HeaderValue::from_static("")),
            ),
            (
                axum::http::header::RETRY_AFTER,
                HeaderValue::from(self.retry_after_secs),
            ),
        ];
        let body = Json(json!({
            "error": self.message,
            "retryAfter": self.retry_after_secs,
        }));
        (StatusCode::TOO_MANY_REQUESTS, headers, body).into_response()
    }
}

/// One configured limit sharing the process-wide store.
#[derive(Clone)]
pub struct RateLimiter {
    store: RateLimitStore,
    window_ms: i64,
    max_requests: u32,
    message: Arc<str>,
}

impl RateLimiter {
    pub fn new(store: RateLimitStore, window: Duration, max_requests: u32, message: &str) -> Self {
        Self {
            store,
            window_ms: duration_ms(window),
            max_requests,
            message: Arc::from(message),
        }
    }

    pub fn from_rule(store: RateLimitStore, rule: &RateLimitRule) -> Self {
        Self::new(store, rule.window(), rule.max_requests, &rule.message)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn store(&self) -> &RateLimitStore {
        &self.store
    }

    pub fn key(client_ip: &str, route: &str) -> String {
        format!("{client_ip}:{route}")
    }

    /// Counts one request. `None` means proceed.
    ///
    /// The entry lock is held across the read-modify-write, so two concurrent
    /// requests from the same client cannot both take the last slot.
    pub fn check(&self, client_ip: &str, route: &str) -> Option<RateLimitRejection> {
        let now = self.store.now_ms();
        let fresh = RateLimitEntry {
            count: 1,
            reset_time_ms: now.saturating_add(self.window_ms),
        };

        match self.store.entries.entry(Self::key(client_ip, route)) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                None
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if now > entry.reset_time_ms {
                    *entry = fresh;
                    None
                } else if entry.count >= self.max_requests {
                    let remaining_ms = entry.reset_time_ms.saturating_sub(now).max(0) as u64;
                    Some(RateLimitRejection {
                        limit: self.max_requests,
                        reset_time_ms: entry.reset_time_ms,
                        retry_after_secs: remaining_ms.div_ceil(1000),
                        message: self.message.to_string(),
                    })
                } else {
                    entry.count += 1;
                    None
                }
            }
        }
    }
}

/// The four route classes and their limits.
#[derive(Clone)]
pub struct RateLimiters {
    pub auth: RateLimiter,
    pub alert: RateLimiter,
    pub public_page: RateLimiter,
    pub general_api: RateLimiter,
}

impl RateLimiters {
    pub fn from_config(store: &RateLimitStore, config: &RateLimitsConfig) -> Self {
        Self {
            auth: RateLimiter::from_rule(store.clone(), &config.auth),
            alert: RateLimiter::from_rule(store.clone(), &config.alert),
            public_page: RateLimiter::from_rule(store.clone(), &config.public_page),
            general_api: RateLimiter::from_rule(store.clone(), &config.general_api),
        }
    }
}
