//! Face swap between two images.

use std::sync::Arc;

use genproxy_core::backoff::PollConfig;
use genproxy_core::{ClientError, JobResult, ResultKind};
use serde::Serialize;

use super::{paths, to_body};
use crate::job::{AsyncJobClient, ContinuationRoutes, JobSpec};
use crate::submit::require;
use crate::transport::{ApiRequest, Transport};

#[derive(Debug, Clone, Serialize)]
pub struct DeepfakeRequest {
    /// Image whose face is replaced.
    pub base_image: String,
    /// Image providing the new face.
    pub face_image: String,
    pub watermark: bool,
    #[serde(rename = "walletAddress", skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl DeepfakeRequest {
    pub fn new(base_image: impl Into<String>, face_image: impl Into<String>) -> Self {
        Self {
            base_image: base_image.into(),
            face_image: face_image.into(),
            watermark: true,
            wallet_address: None,
        }
    }

    pub fn without_watermark(mut self) -> Self {
        self.watermark = false;
        self
    }

    pub fn with_wallet(mut self, address: impl Into<String>) -> Self {
        self.wallet_address = Some(address.into());
        self
    }
}

pub struct DeepfakeClient {
    jobs: AsyncJobClient,
    poll: PollConfig,
}

impl DeepfakeClient {
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

    pub async fn swap(&self, request: &DeepfakeRequest) -> Result<JobResult, ClientError> {
        require("base_image", &request.base_image)?;
        require("face_image", &request.face_image)?;

        let spec = JobSpec {
            submit: ApiRequest::post(paths::DEEPFAKE_SWAP, to_body(request)?),
            kind: ResultKind::Image,
            routes: ContinuationRoutes {
                status_path: None,
                fetch_by_url: Some(paths::DEEPFAKE_FETCH),
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
