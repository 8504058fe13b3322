//! Completion detection for asynchronous generation jobs.
//!
//! Two strategies, both strictly sequential (attempt N+1 starts only after
//! attempt N resolved and its delay elapsed):
//!
//! * [`check_status`] reads a webhook-fed status endpoint on a growing,
//!   jittered delay, and can hand over to active polling when the webhook
//!   does not arrive in time.
//! * [`poll_fetch`] calls a fetch endpoint on a fixed interval.
//!
//! Every wait and every network call races the job's
//! [`CancellationToken`]; cancellation drops the in-flight request and
//! resolves as [`ClientError::Cancelled`].

use std::future::Future;
use std::time::Duration;

use genproxy_core::backoff::{Jitter, PollConfig, StatusCheckConfig};
use genproxy_core::{ClientError, JobResult, Progress, ResultKind};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::submit::check_response;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Everything a completion loop needs from the job that owns it.
pub struct JobContext<'a> {
    pub transport: &'a dyn Transport,
    pub cancel: &'a CancellationToken,
    /// Correlates log lines of one job.
    pub job_id: Uuid,
}

impl JobContext<'_> {
    /// Run `fut` unless the job is cancelled first.
    pub async fn cancellable<T>(
        &self,
        fut: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            result = fut => result,
        }
    }

    async fn call(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        self.cancellable(self.transport.send(request)).await
    }

    async fn wait(&self, delay: Duration) -> Result<(), ClientError> {
        self.cancellable(async {
            tokio::time::sleep(delay).await;
            Ok(())
        })
        .await
    }
}

/// A fetch endpoint plus the body identifying the job to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTarget {
    pub path: String,
    pub body: Value,
}

impl FetchTarget {
    /// `POST <path> {"fetch_url": <url>}`.
    pub fn by_url(path: &str, fetch_url: &str) -> Self {
        Self {
            path: path.to_string(),
            body: serde_json::json!({ "fetch_url": fetch_url }),
        }
    }

    /// `POST <path> {"request_id": <id>}`.
    pub fn by_request_id(path: &str, request_id: &str) -> Self {
        Self {
            path: path.to_string(),
            body: serde_json::json!({ "request_id": request_id }),
        }
    }

    fn request(&self) -> ApiRequest {
        ApiRequest::post(self.path.clone(), self.body.clone())
    }
}

/// Poll a fetch endpoint until the job finishes.
///
/// Unknown in-flight statuses keep the loop going. Transport and HTTP
/// failures are swallowed and retried unless they
/// happen on the final attempt, where they become the result. Exhausting
/// all attempts yields [`ClientError::Timeout`] stating the ceiling.
pub async fn poll_fetch(
    ctx: &JobContext<'_>,
    target: &FetchTarget,
    config: &PollConfig,
    kind: ResultKind,
) -> Result<JobResult, ClientError> {
    tracing::info!(
        job_id = %ctx.job_id,
        path = %target.path,
        interval_ms = config.interval.as_millis() as u64,
        max_attempts = config.max_attempts,
        "Polling for job result",
    );

    for attempt in 1..=config.max_attempts {
        ctx.wait(config.interval).await?;

        let outcome = match ctx.call(target.request()).await {
            Ok(response) => {
                check_response(response).and_then(|body| Progress::from_fetch_body(&body, kind))
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(Progress::Completed(result)) => {
                tracing::info!(job_id = %ctx.job_id, attempt, "Job completed");
                return Ok(result);
            }
            Ok(Progress::Failed { message }) => {
                tracing::warn!(job_id = %ctx.job_id, attempt, %message, "Job failed");
                return Err(ClientError::Application { message });
            }
            Ok(Progress::Pending { .. }) => {
                tracing::debug!(job_id = %ctx.job_id, attempt, "Job still processing");
            }
            Err(e) if e.is_transient() && attempt < config.max_attempts => {
                tracing::warn!(job_id = %ctx.job_id, attempt, error = %e, "Fetch attempt failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::warn!(job_id = %ctx.job_id, attempts = config.max_attempts, "Polling exhausted");
    Err(ClientError::Timeout {
        elapsed_secs: config.ceiling().as_secs(),
        attempts: config.max_attempts,
    })
}

/// How a status-check loop ended without an error.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusOutcome {
    Completed(JobResult),
    /// The webhook did not arrive in time; continue by polling this URL.
    FallBack { fetch_url: String },
}

/// Status endpoint and options for [`check_status`].
pub struct StatusCheck<'a> {
    pub path: &'a str,
    pub track_id: &'a str,
    pub config: &'a StatusCheckConfig,
    pub jitter: &'a dyn Jitter,
    /// Whether the caller can continue by polling a fetch URL.
    pub allow_fallback: bool,
}

/// Check a webhook-fed status endpoint with jittered backoff.
///
/// A 404 means the status is not available yet and costs nothing beyond
/// the normal schedule. No wait extends past `max_elapsed`.
pub async fn check_status(
    ctx: &JobContext<'_>,
    check: &StatusCheck<'_>,
    kind: ResultKind,
) -> Result<StatusOutcome, ClientError> {
    let config = check.config;
    let started = Instant::now();
    let mut delay = config.min_interval;
    let mut attempts = 0u32;

    tracing::info!(
        job_id = %ctx.job_id,
        track_id = check.track_id,
        max_attempts = config.max_attempts,
        "Checking job status",
    );

    while attempts < config.max_attempts {
        let Some(remaining) = config.max_elapsed.checked_sub(started.elapsed()) else {
            break;
        };
        if remaining.is_zero() {
            break;
        }
        ctx.wait(delay.min(remaining)).await?;
        attempts += 1;
        let last = attempts == config.max_attempts;

        let request = ApiRequest::get(check.path).with_query("track_id", check.track_id);
        let outcome = match ctx.call(request).await {
            Ok(response) if response.status == 404 => {
                tracing::debug!(job_id = %ctx.job_id, attempt = attempts, "Status not available yet");
                Ok(None)
            }
            Ok(response) => check_response(response)
                .and_then(|body| Progress::from_body(&body, kind))
                .map(Some),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(Some(Progress::Completed(result))) => {
                tracing::info!(job_id = %ctx.job_id, attempt = attempts, "Job completed");
                return Ok(StatusOutcome::Completed(result));
            }
            Ok(Some(Progress::Failed { message })) => {
                tracing::warn!(job_id = %ctx.job_id, attempt = attempts, %message, "Job failed");
                return Err(ClientError::Application { message });
            }
            Ok(Some(Progress::Pending {
                fetch_url: Some(fetch_url),
                webhook_received: false,
            })) if check.allow_fallback && started.elapsed() >= config.webhook_fallback_after => {
                tracing::info!(
                    job_id = %ctx.job_id,
                    attempt = attempts,
                    elapsed_secs = started.elapsed().as_secs(),
                    "No webhook yet, switching to active polling",
                );
                return Ok(StatusOutcome::FallBack { fetch_url });
            }
            Ok(_) => {
                tracing::debug!(job_id = %ctx.job_id, attempt = attempts, delay_ms = delay.as_millis() as u64, "Job still processing");
            }
            Err(e) if e.is_transient() && !last => {
                tracing::warn!(job_id = %ctx.job_id, attempt = attempts, error = %e, "Status check failed, retrying");
            }
            Err(e) => return Err(e),
        }

        delay = config.next_delay(delay, check.jitter);
    }

    let elapsed_secs = started.elapsed().as_secs();
    tracing::warn!(job_id = %ctx.job_id, attempts, elapsed_secs, "Status checks exhausted");
    Err(ClientError::Timeout {
        elapsed_secs,
        attempts,
    })
}
