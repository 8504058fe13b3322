//! Submit-then-complete driver shared by every generation client.
//!
//! [`AsyncJobClient`] issues one submission, interprets the response, and
//! for `processing` jobs drives the matching completion loop. At most one
//! job per client is active: starting a job cancels the previous one.

use std::sync::{Arc, Mutex};

use genproxy_core::backoff::{Jitter, PollConfig, RandomJitter, StatusCheckConfig};
use genproxy_core::{ClientError, JobResponse, JobResult, Pending, ResultKind};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::poll::{check_status, poll_fetch, FetchTarget, JobContext, StatusCheck, StatusOutcome};
use crate::rate_gate::RateLimitGate;
use crate::submit::submit;
use crate::transport::{ApiRequest, Transport};

/// Endpoints used to follow up on a `processing` submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationRoutes {
    /// Status endpoint queried with `?track_id=`.
    pub status_path: Option<&'static str>,
    /// Fetch endpoint taking `{"fetch_url": ..}`.
    pub fetch_by_url: Option<&'static str>,
    /// Fetch endpoint taking `{"request_id": ..}`.
    pub fetch_by_request_id: Option<&'static str>,
    /// Interval and attempt ceiling for active polling.
    pub poll: PollConfig,
}

/// One generation job: the submission and how to follow up on it.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub submit: ApiRequest,
    pub kind: ResultKind,
    pub routes: ContinuationRoutes,
}

/// The client's currently running job.
struct ActiveJob {
    id: Uuid,
    cancel: CancellationToken,
}

pub struct AsyncJobClient {
    transport: Arc<dyn Transport>,
    status_config: StatusCheckConfig,
    jitter: Arc<dyn Jitter>,
    rate_gate: RateLimitGate,
    active: Mutex<Option<ActiveJob>>,
}

impl AsyncJobClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            status_config: StatusCheckConfig::default(),
            jitter: Arc::new(RandomJitter),
            rate_gate: RateLimitGate::new(),
            active: Mutex::new(None),
        }
    }

    pub fn with_status_config(mut self, config: StatusCheckConfig) -> Self {
        self.status_config = config;
        self
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Cancel the in-flight job, if any. It resolves as
    /// [`ClientError::Cancelled`].
    pub fn cancel(&self) {
        if let Ok(mut guard) = self.active.lock() {
            if let Some(job) = guard.take() {
                tracing::info!(job_id = %job.id, "Cancelling job");
                job.cancel.cancel();
            }
        }
    }

    /// Whether a job is currently in flight on this client.
    pub fn is_busy(&self) -> bool {
        self.active.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Run a job to a terminal state.
    ///
    /// Supersedes (cancels) any job already running on this client.
    pub async fn run(&self, spec: JobSpec) -> Result<JobResult, ClientError> {
        let (job_id, cancel) = self.begin_job();
        let ctx = JobContext {
            transport: self.transport.as_ref(),
            cancel: &cancel,
            job_id,
        };

        let result = self.drive(&ctx, spec).await;
        self.finish_job(job_id);

        match &result {
            Ok(r) => tracing::info!(job_id = %job_id, result_url = %r.result_url, "Job succeeded"),
            Err(e) => tracing::info!(job_id = %job_id, error = %e, "Job ended without result"),
        }
        result
    }

    fn begin_job(&self) -> (Uuid, CancellationToken) {
        let job = ActiveJob {
            id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
        };
        let handle = (job.id, job.cancel.clone());

        if let Ok(mut guard) = self.active.lock() {
            if let Some(previous) = guard.replace(job) {
                tracing::info!(
                    job_id = %previous.id,
                    superseded_by = %handle.0,
                    "Superseding in-flight job",
                );
                previous.cancel.cancel();
            }
        }
        handle
    }

    fn finish_job(&self, job_id: Uuid) {
        if let Ok(mut guard) = self.active.lock() {
            if guard.as_ref().is_some_and(|job| job.id == job_id) {
                *guard = None;
            }
        }
    }

    async fn drive(&self, ctx: &JobContext<'_>, spec: JobSpec) -> Result<JobResult, ClientError> {
        self.rate_gate.check()?;

        tracing::info!(job_id = %ctx.job_id, path = %spec.submit.path, "Submitting job");
        let submitted = ctx
            .cancellable(submit(ctx.transport, spec.submit, spec.kind))
            .await;

        let response = match submitted {
            Ok(response) => response,
            Err(ClientError::RateLimited(limit)) => {
                self.rate_gate.record(&limit);
                return Err(ClientError::RateLimited(limit));
            }
            Err(e) => return Err(e),
        };

        match response {
            JobResponse::Success(result) => Ok(result),
            JobResponse::Failed { message } => Err(ClientError::Application { message }),
            JobResponse::Processing(pending) => {
                tracing::info!(
                    job_id = %ctx.job_id,
                    track_id = ?pending.track_id,
                    request_id = ?pending.request_id,
                    has_fetch_url = pending.fetch_url.is_some(),
                    eta_seconds = ?pending.eta_seconds,
                    "Job is processing",
                );
                self.complete(ctx, &spec.routes, spec.kind, pending).await
            }
        }
    }

    /// Pick the completion strategy from the handles the job returned.
    async fn complete(
        &self,
        ctx: &JobContext<'_>,
        routes: &ContinuationRoutes,
        kind: ResultKind,
        pending: Pending,
    ) -> Result<JobResult, ClientError> {
        if let (Some(track_id), Some(path)) = (pending.track_id.as_deref(), routes.status_path) {
            let check = StatusCheck {
                path,
                track_id,
                config: &self.status_config,
                jitter: self.jitter.as_ref(),
                allow_fallback: routes.fetch_by_url.is_some(),
            };
            return match check_status(ctx, &check, kind).await? {
                StatusOutcome::Completed(result) => Ok(result),
                StatusOutcome::FallBack { fetch_url } => {
                    // `allow_fallback` guarantees the route exists.
                    let path = routes.fetch_by_url.unwrap_or_default();
                    poll_fetch(ctx, &FetchTarget::by_url(path, &fetch_url), &routes.poll, kind).await
                }
            };
        }

        if let (Some(fetch_url), Some(path)) = (pending.fetch_url.as_deref(), routes.fetch_by_url) {
            let target = FetchTarget::by_url(path, fetch_url);
            return poll_fetch(ctx, &target, &routes.poll, kind).await;
        }

        if let (Some(request_id), Some(path)) =
            (pending.request_id.as_deref(), routes.fetch_by_request_id)
        {
            let target = FetchTarget::by_request_id(path, request_id);
            return poll_fetch(ctx, &target, &routes.poll, kind).await;
        }

        Err(ClientError::MalformedResponse(
            "processing response carries no handle this endpoint can follow".into(),
        ))
    }
}
