//! ASMR / audio generation.

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
pub struct AudioRequest {
    pub prompt: String,
    /// Requested clip length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
    #[serde(rename = "walletAddress", skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl AudioRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            duration_secs: None,
            options: Map::new(),
            wallet_address: None,
        }
    }

    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

pub struct AudioClient {
    jobs: AsyncJobClient,
    poll: PollConfig,
}

impl AudioClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            jobs: AsyncJobClient::new(transport),
            poll: PollConfig::short(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub async fn generate(&self, request: &AudioRequest) -> Result<JobResult, ClientError> {
        require("prompt", &request.prompt)?;

        let spec = JobSpec {
            submit: ApiRequest::post(paths::AUDIO, to_body(request)?),
            kind: ResultKind::Audio,
            routes: ContinuationRoutes {
                status_path: None,
                fetch_by_url: Some(paths::AUDIO_FETCH),
                fetch_by_request_id: Some(paths::AUDIO_FETCH),
                poll: self.poll.clone(),
            },
        };
        self.jobs.run(spec).await
    }

    pub fn cancel(&self) {
        self.jobs.cancel();
    }
}
