//! Server-side token balance.

use std::sync::Arc;

use genproxy_core::response::failure_message;
use genproxy_core::ClientError;
use serde::Deserialize;
use serde_json::Value;

use super::paths;
use crate::submit::check_response;
use crate::transport::{ApiRequest, Transport};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnResponse {
    pub success: bool,
    pub tokens_earned: u64,
    pub new_balance: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenData {
    pub token_balance: u64,
    #[serde(default)]
    pub credits_balance: u64,
    #[serde(default)]
    pub daily_earned: Option<u64>,
    #[serde(default)]
    pub daily_limit: Option<u64>,
    #[serde(default)]
    pub daily_remaining: Option<u64>,
}

/// Client for the authenticated token endpoints.
///
/// Requests carry the session bearer token when the transport has one.
pub struct TokenClient {
    transport: Arc<dyn Transport>,
}

impl TokenClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Credit `amount` tokens for `action` on the server.
    pub async fn earn(&self, amount: u64, action: &str) -> Result<EarnResponse, ClientError> {
        if amount == 0 {
            return Err(ClientError::InvalidRequest("`amount` must be positive".into()));
        }

        let body = serde_json::json!({ "amount": amount, "action": action });
        let response = self
            .transport
            .send(ApiRequest::post(paths::EARN_TOKENS, body))
            .await?;
        let body = check_response(response)?;

        if body.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(ClientError::application(failure_message(&body)));
        }
        serde_json::from_value(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    pub async fn token_data(&self) -> Result<TokenData, ClientError> {
        let response = self
            .transport
            .send(ApiRequest::get(paths::GET_TOKEN_DATA))
            .await?;
        let body = check_response(response)?;
        serde_json::from_value(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}
