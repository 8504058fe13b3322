//! HTTP transport for the proxy endpoints.
//!
//! Every client talks to the proxy through the [`Transport`] trait so the
//! completion loops can be driven by a scripted transport in tests.
//! [`ReqwestTransport`] is the production implementation built on
//! [`reqwest`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use genproxy_core::session::SessionFile;
use genproxy_core::ClientError;
use serde_json::Value;

/// Default HTTP request timeout for a single call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request to one proxy endpoint, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// A response as seen by the clients: status, lowercase headers, raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    /// A response with a JSON body and no headers.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Sends [`ApiRequest`]s to the proxy.
///
/// Implementations only fail with [`ClientError::Transport`]; every HTTP
/// status, including errors, is returned as an [`ApiResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError>;
}

/// [`Transport`] over a pooled [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    session: Option<SessionFile>,
}

impl ReqwestTransport {
    /// Create a transport for `base_url` with the given per-call timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a transport reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across several clients).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        }
    }

    /// Attach `Authorization: Bearer` from this session file while the
    /// stored session is unexpired.
    pub fn with_session(mut self, session: SessionFile) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bearer_token(&self) -> Option<String> {
        let session = self.session.as_ref()?;
        match session.bearer_token(Utc::now()) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = self.bearer_token() {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_ascii_lowercase(),
                    v.to_str().unwrap_or("").to_string(),
                )
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;

        tracing::debug!(path = %request.path, status, "Proxy call complete");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_does_not_fail() {
        let transport = ReqwestTransport::new("http://localhost:9999/", DEFAULT_REQUEST_TIMEOUT)
            .expect("client should build");
        assert_eq!(transport.base_url(), "http://localhost:9999");
    }

    #[test]
    fn request_builders() {
        let req = ApiRequest::get("/video-status").with_query("track_id", "t1");
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.query, vec![("track_id".to_string(), "t1".to_string())]);
        assert!(req.body.is_none());

        let req = ApiRequest::post("/image", json!({ "prompt": "cat" }));
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body, Some(json!({ "prompt": "cat" })));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let resp = ApiResponse::json(429, &json!({})).with_header("Retry-After", "5");
        assert_eq!(resp.header("retry-after"), Some("5"));
        assert_eq!(resp.header("RETRY-AFTER"), Some("5"));
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let transport =
            ReqwestTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = transport.send(ApiRequest::get("/ping")).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
    }
}
