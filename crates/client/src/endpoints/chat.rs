//! Chat completions.

use std::sync::Arc;

use genproxy_core::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{paths, to_body};
use crate::submit::check_response;
use crate::transport::{ApiRequest, Transport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(rename = "walletAddress", skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: model.into(),
            temperature: 0.7,
            max_tokens: 1024,
            wallet_address: None,
        }
    }
}

pub struct ChatClient {
    transport: Arc<dyn Transport>,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send the conversation and return the first choice's content.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, ClientError> {
        if request.messages.is_empty() {
            return Err(ClientError::InvalidRequest("`messages` is required".into()));
        }

        let response = self
            .transport
            .send(ApiRequest::post(paths::CHAT, to_body(request)?))
            .await?;
        let body = check_response(response)?;

        first_choice_content(&body)
    }
}

fn first_choice_content(body: &Value) -> Result<String, ClientError> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(ClientError::application(error));
    }

    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| {
            ClientError::MalformedResponse("chat response carries no choices[0].message.content".into())
        })
}
