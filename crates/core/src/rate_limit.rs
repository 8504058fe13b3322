//! Structured HTTP 429 errors.
//!
//! The proxy layer answers rate-limited requests with a `Retry-After`
//! header, `X-RateLimit-*` identity headers, and a JSON body carrying
//! `error` (and sometimes `remaining` / `limit`). [`RateLimitError`]
//! keeps those fields for UI-level backoff display and composes the
//! human-readable message shown to users.

use serde::Serialize;
use serde_json::Value;

/// Header names read from a 429 response (lowercase).
pub mod headers {
    pub const RETRY_AFTER: &str = "retry-after";
    pub const REMAINING: &str = "x-ratelimit-remaining";
    pub const LIMIT: &str = "x-ratelimit-limit";
    pub const WINDOW: &str = "x-ratelimit-window";
}

/// Message used when the body carries no `error` field.
const DEFAULT_RATE_LIMIT_MESSAGE: &str = "Too many requests.";

/// Window reported when a limit header arrives without a window header.
const DEFAULT_WINDOW: &str = "minute";

/// Raw header values copied off a 429 response.
#[derive(Debug, Clone, Default)]
pub struct RateLimitHeaders {
    pub retry_after: Option<String>,
    pub remaining: Option<String>,
    pub limit: Option<String>,
    pub window: Option<String>,
}

impl RateLimitHeaders {
    /// Collect the rate-limit headers through a case-insensitive lookup.
    pub fn from_lookup<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string());
        Self {
            retry_after: get(headers::RETRY_AFTER),
            remaining: get(headers::REMAINING),
            limit: get(headers::LIMIT),
            window: get(headers::WINDOW),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitError {
    pub message: String,
    pub retry_after_secs: Option<u64>,
    pub remaining: Option<u64>,
    pub limit: Option<u64>,
    pub window: Option<String>,
}

impl RateLimitError {
    /// Build the error from a 429 response's headers and parsed body.
    ///
    /// The `Please wait` clause requires a numeric `Retry-After` header and
    /// the `(Limit: ..)` clause requires the limit header. Body fields only
    /// fill the structured counters.
    pub fn from_response(headers: &RateLimitHeaders, body: &Value) -> Self {
        let base = body
            .get("error")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_RATE_LIMIT_MESSAGE);

        let header_retry = headers
            .retry_after
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok());
        let header_limit = headers.limit.as_deref().and_then(|v| v.parse::<u64>().ok());
        let window = header_limit.map(|_| {
            headers
                .window
                .clone()
                .unwrap_or_else(|| DEFAULT_WINDOW.to_string())
        });

        let mut message = base.to_string();
        if let Some(secs) = header_retry {
            message.push_str(&format!(
                " Please wait {secs} seconds before trying again."
            ));
        }
        if let (Some(limit), Some(window)) = (header_limit, window.as_deref()) {
            message.push_str(&format!(" (Limit: {limit} requests per {window})"));
        }

        Self {
            message,
            retry_after_secs: header_retry.or_else(|| body_u64(body, "retryAfter")),
            remaining: headers
                .remaining
                .as_deref()
                .and_then(|v| v.parse().ok())
                .or_else(|| body_u64(body, "remaining")),
            limit: header_limit.or_else(|| body_u64(body, "limit")),
            window,
        }
    }

    /// Locally synthesised error used while a previous `Retry-After` is
    /// still in effect.
    pub fn still_waiting(retry_after_secs: u64) -> Self {
        Self {
            message: format!(
                "{DEFAULT_RATE_LIMIT_MESSAGE} Please wait {retry_after_secs} seconds before trying again."
            ),
            retry_after_secs: Some(retry_after_secs),
            remaining: Some(0),
            limit: None,
            window: None,
        }
    }

    /// Always `true`; lets UI code treat every variant uniformly.
    pub fn is_rate_limited(&self) -> bool {
        true
    }
}

impl std::fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

fn body_u64(body: &Value, key: &str) -> Option<u64> {
    match body.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
