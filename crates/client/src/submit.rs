//! Submission call and HTTP-level response checking.

use genproxy_core::rate_limit::{RateLimitError, RateLimitHeaders};
use genproxy_core::{ClientError, JobResponse, ResultKind};
use serde_json::Value;

use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Submit a generation request. Exactly one network call.
pub async fn submit(
    transport: &dyn Transport,
    request: ApiRequest,
    kind: ResultKind,
) -> Result<JobResponse, ClientError> {
    let response = transport.send(request).await?;
    let body = check_response(response)?;
    JobResponse::from_submission(&body, kind)
}

/// Turn an HTTP response into its JSON body, or the matching error.
///
/// * 429 → [`ClientError::RateLimited`] from headers and body.
/// * other non-2xx → [`ClientError::Http`] with the body's `error`.
/// * 2xx with a non-JSON body → [`ClientError::MalformedResponse`].
pub fn check_response(response: ApiResponse) -> Result<Value, ClientError> {
    let parsed: Option<Value> = serde_json::from_str(&response.body).ok();

    if response.status == 429 {
        let headers = RateLimitHeaders::from_lookup(|name| response.header(name));
        let body = parsed.unwrap_or(Value::Null);
        return Err(ClientError::RateLimited(RateLimitError::from_response(
            &headers, &body,
        )));
    }

    if !response.is_success() {
        let message = parsed
            .as_ref()
            .and_then(|b| b.get("error"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));
        return Err(ClientError::Http {
            status: response.status,
            message,
        });
    }

    parsed.ok_or_else(|| {
        ClientError::MalformedResponse(format!(
            "expected a JSON body, got {} bytes of something else",
            response.body.len()
        ))
    })
}

/// Fail fast when a required request field is blank.
pub(crate) fn require(field: &str, value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::InvalidRequest(format!("`{field}` is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn rate_limit_uses_headers_and_body() {
        let resp = ApiResponse::json(429, &json!({ "error": "Rate limit exceeded." }))
            .with_header("Retry-After", "30")
            .with_header("X-RateLimit-Limit", "5")
            .with_header("X-RateLimit-Remaining", "0");

        assert_matches!(check_response(resp), Err(ClientError::RateLimited(r)) => {
            assert_eq!(
                r.message,
                "Rate limit exceeded. Please wait 30 seconds before trying again. (Limit: 5 requests per minute)"
            );
            assert_eq!(r.remaining, Some(0));
            assert!(r.is_rate_limited());
        });
    }

    #[test]
    fn rate_limit_with_unreadable_body() {
        let resp = ApiResponse {
            status: 429,
            headers: Default::default(),
            body: "<html>".into(),
        };
        assert_matches!(check_response(resp), Err(ClientError::RateLimited(r)) => {
            assert_eq!(r.message, "Too many requests.");
        });
    }

    #[test]
    fn http_error_prefers_body_error() {
        let resp = ApiResponse::json(400, &json!({ "error": "Prompt rejected" }));
        assert_eq!(
            check_response(resp).unwrap_err(),
            ClientError::Http {
                status: 400,
                message: "Prompt rejected".into()
            }
        );
    }

    #[test]
    fn http_error_default_message() {
        let resp = ApiResponse {
            status: 502,
            headers: Default::default(),
            body: String::new(),
        };
        assert_eq!(
            check_response(resp).unwrap_err().to_string(),
            "HTTP error! status: 502"
        );
    }

    #[test]
    fn success_with_garbage_is_malformed() {
        let resp = ApiResponse {
            status: 200,
            headers: Default::default(),
            body: "not json".into(),
        };
        assert_matches!(check_response(resp), Err(ClientError::MalformedResponse(_)));
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(require("prompt", "cat").is_ok());
        assert_matches!(require("prompt", "  "), Err(ClientError::InvalidRequest(_)));
    }
}
