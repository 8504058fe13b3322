//! Image-to-video generation.
//!
//! Submissions usually come back `processing` with a `track_id`; the
//! result is then read from the webhook-fed status endpoint, falling back
//! to polling the provider's fetch URL when the webhook is late.

use std::sync::Arc;

use genproxy_core::backoff::PollConfig;
use genproxy_core::{ClientError, JobResult, ResultKind};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{paths, to_body};
use crate::job::{AsyncJobClient, ContinuationRoutes, JobSpec};
use crate::submit::require;
use crate::transport::{ApiRequest, Transport};

#[derive(Debug, Clone, Serialize)]
pub struct VideoRequest {
    /// URL or data URI of the first frame.
    pub init_image: String,
    pub prompt: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
    #[serde(rename = "walletAddress", skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl VideoRequest {
    pub fn new(init_image: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            init_image: init_image.into(),
            prompt: prompt.into(),
            options: Map::new(),
            wallet_address: None,
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_wallet(mut self, address: impl Into<String>) -> Self {
        self.wallet_address = Some(address.into());
        self
    }
}

pub struct VideoClient {
    jobs: AsyncJobClient,
    poll: PollConfig,
}

impl VideoClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_jobs(AsyncJobClient::new(transport))
    }

    pub fn with_jobs(jobs: AsyncJobClient) -> Self {
        Self {
            jobs,
            poll: PollConfig::video(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub async fn generate(&self, request: &VideoRequest) -> Result<JobResult, ClientError> {
        require("init_image", &request.init_image)?;
        require("prompt", &request.prompt)?;

        let spec = JobSpec {
            submit: ApiRequest::post(paths::VIDEO, to_body(request)?),
            kind: ResultKind::Video,
            routes: ContinuationRoutes {
                status_path: Some(paths::VIDEO_STATUS),
                fetch_by_url: Some(paths::VIDEO_FETCH),
                fetch_by_request_id: None,
                poll: self.poll.clone(),
            },
        };
        self.jobs.run(spec).await
    }

    pub fn cancel(&self) {
        self.jobs.cancel();
    }
}
