//! Shared helpers for client integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use genproxy_client::transport::{ApiRequest, ApiResponse, Transport};
use genproxy_core::ClientError;
use serde_json::Value;

/// One scripted reaction of the [`ScriptedTransport`].
pub enum Step {
    Respond(ApiResponse),
    Fail(ClientError),
    /// Never resolve; lets tests cancel an in-flight call.
    Hang,
}

pub fn ok(body: Value) -> Step {
    Step::Respond(ApiResponse::json(200, &body))
}

pub fn status(code: u16, body: Value) -> Step {
    Step::Respond(ApiResponse::json(code, &body))
}

pub fn transport_error() -> Step {
    Step::Fail(ClientError::transport("connection reset by peer"))
}

/// Transport that replays a fixed script and records every request.
///
/// Once the script is exhausted, the `repeat` response (if any) is
/// returned forever; otherwise the call fails the test.
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    repeat: Mutex<Option<ApiResponse>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        })
    }

    /// Script followed by an endlessly repeated 200 response.
    pub fn with_repeat(steps: Vec<Step>, body: Value) -> Arc<Self> {
        let transport = Self::new(steps);
        *transport.repeat.lock().unwrap() = Some(ApiResponse::json(200, &body));
        transport
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        self.calls.lock().unwrap().push(request.clone());

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Hang) => std::future::pending().await,
            None => match self.repeat.lock().unwrap().clone() {
                Some(response) => Ok(response),
                None => panic!("unscripted call to {}", request.path),
            },
        }
    }
}
