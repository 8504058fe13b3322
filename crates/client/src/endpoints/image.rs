//! Text-to-image generation.

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
pub struct ImageRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    /// Provider-specific options (`negative_prompt`, `seed`, ...).
    #[serde(flatten)]
    pub options: Map<String, Value>,
    #[serde(rename = "walletAddress", skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            prompt: prompt.into(),
            width,
            height,
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

pub struct ImageClient {
    jobs: AsyncJobClient,
    poll: PollConfig,
}

impl ImageClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_jobs(AsyncJobClient::new(transport))
    }

    pub fn with_jobs(jobs: AsyncJobClient) -> Self {
        Self {
            jobs,
            poll: PollConfig::short(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Generate an image. Queued generations are polled by request id.
    pub async fn generate(&self, request: &ImageRequest) -> Result<JobResult, ClientError> {
        require("prompt", &request.prompt)?;

        let spec = JobSpec {
            submit: ApiRequest::post(paths::IMAGE, to_body(request)?),
            kind: ResultKind::Image,
            routes: ContinuationRoutes {
                status_path: None,
                fetch_by_url: None,
                fetch_by_request_id: Some(paths::IMAGE_FETCH),
                poll: self.poll.clone(),
            },
        };
        self.jobs.run(spec).await
    }

    /// Cancel the in-flight generation, if any.
    pub fn cancel(&self) {
        self.jobs.cancel();
    }
}
