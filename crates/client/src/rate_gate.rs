//! Per-client memory of the last `Retry-After`.

use std::sync::Mutex;
use std::time::Duration;

use genproxy_core::{ClientError, RateLimitError};
use tokio::time::Instant;

/// Blocks submissions until a previously reported `Retry-After` passes.
#[derive(Debug, Default)]
pub struct RateLimitGate {
    blocked_until: Mutex<Option<Instant>>,
}

impl RateLimitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with a locally built [`ClientError::RateLimited`] while blocked.
    pub fn check(&self) -> Result<(), ClientError> {
        let Ok(mut guard) = self.blocked_until.lock() else {
            return Ok(());
        };
        let Some(until) = *guard else {
            return Ok(());
        };

        let now = Instant::now();
        if now >= until {
            *guard = None;
            return Ok(());
        }

        let remaining = until - now;
        // Round up so the UI never shows "wait 0 seconds".
        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        Err(ClientError::RateLimited(RateLimitError::still_waiting(secs)))
    }

    /// Remember a server-reported rate limit.
    pub fn record(&self, error: &RateLimitError) {
        let Some(secs) = error.retry_after_secs.filter(|s| *s > 0) else {
            return;
        };
        if let Ok(mut guard) = self.blocked_until.lock() {
            *guard = Some(Instant::now() + Duration::from_secs(secs));
            tracing::info!(retry_after_secs = secs, "Rate limited, holding submissions");
        }
    }
}
