//! Boundary validation of generation-endpoint payloads.
//!
//! The proxy endpoints answer with loosely-shaped JSON. Everything that
//! comes off the wire is classified here into strict variants, and any
//! payload that matches none of them is rejected as
//! [`ClientError::MalformedResponse`] rather than guessed at.

use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;

/// Message used when a failed payload carries neither `details` nor `error`.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Generation failed";

/// Statuses that mean "not finished yet".
const TRANSIENT_STATUSES: &[&str] = &[
    "processing",
    "pending",
    "queued",
    "starting",
    "in_progress",
    "in_queue",
    "running",
];

/// Statuses that mean the job finished and produced a result.
const COMPLETED_STATUSES: &[&str] = &["success", "completed", "succeeded"];

/// Statuses that mean the job finished without a result.
const FAILED_STATUSES: &[&str] = &["error", "failed", "cancelled"];

/// Which media field carries the result of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Image,
    Video,
    Audio,
}

impl ResultKind {
    /// Single-URL fields, in lookup order.
    fn url_keys(self) -> &'static [&'static str] {
        match self {
            Self::Image => &["imageUrl", "image_url"],
            Self::Video => &["videoUrl", "video_url"],
            Self::Audio => &["audioUrl", "audio_url"],
        }
    }

    /// Array fields holding one or more result URLs.
    fn list_keys(self) -> &'static [&'static str] {
        match self {
            Self::Image => &["images", "output"],
            Self::Video => &["output", "future_links"],
            Self::Audio => &["output"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// A finished job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    /// Primary result URL.
    pub result_url: String,
    /// Every result URL the payload listed, primary first.
    pub result_urls: Vec<String>,
    /// The raw payload, for callers that need provider-specific fields.
    pub metadata: Value,
}

/// Continuation handles returned with a `processing` submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pending {
    /// Webhook-tracked job id; checked via the status endpoint.
    pub track_id: Option<String>,
    /// Provider request id; polled via a fetch-by-id endpoint.
    pub request_id: Option<String>,
    /// Provider fetch URL; polled via a fetch-by-url endpoint.
    pub fetch_url: Option<String>,
    /// Provider's estimate of the remaining time.
    pub eta_seconds: Option<f64>,
}

impl Pending {
    fn from_body(body: &Value) -> Option<Self> {
        let pending = Self {
            track_id: string_field(body, &["track_id", "trackId"]),
            request_id: string_field(body, &["request_id", "requestId"]),
            fetch_url: string_field(body, &["fetchUrl", "fetch_url"]),
            eta_seconds: ["eta", "etaSeconds"]
                .iter()
                .find_map(|k| body.get(*k).and_then(Value::as_f64)),
        };

        let has_handle =
            pending.track_id.is_some() || pending.request_id.is_some() || pending.fetch_url.is_some();
        has_handle.then_some(pending)
    }
}

/// The outcome of a submission call.
#[derive(Debug, Clone, PartialEq)]
pub enum JobResponse {
    Success(JobResult),
    Processing(Pending),
    Failed { message: String },
}

impl JobResponse {
    /// Classify the body of a 2xx submission response.
    pub fn from_submission(body: &Value, kind: ResultKind) -> Result<Self, ClientError> {
        if body.get("success").and_then(Value::as_bool) == Some(true) {
            return extract_result(body, kind).map(Self::Success);
        }

        if status_of(body).as_deref() == Some("processing") {
            return Pending::from_body(body).map(Self::Processing).ok_or_else(|| {
                ClientError::MalformedResponse(
                    "processing response carries no track_id, request_id or fetchUrl".into(),
                )
            });
        }

        Ok(Self::Failed {
            message: failure_message(body),
        })
    }
}

/// The outcome of one status check or fetch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Completed(JobResult),
    Failed {
        message: String,
    },
    Pending {
        /// Alternate fetch URL exposed by the status endpoint.
        fetch_url: Option<String>,
        /// Whether a completion webhook has reached the proxy.
        webhook_received: bool,
    },
}

impl Progress {
    /// Classify the body of a 2xx status-check or fetch response.
    pub fn from_body(body: &Value, kind: ResultKind) -> Result<Self, ClientError> {
        let status = status_of(body);
        let success = body.get("success").and_then(Value::as_bool);

        if let Some(s) = status.as_deref() {
            if TRANSIENT_STATUSES.contains(&s) {
                return Ok(Self::Pending {
                    fetch_url: string_field(body, &["fetchUrl", "fetch_url"]),
                    webhook_received: body
                        .get("webhook_received")
                        .or_else(|| body.get("webhookReceived"))
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                });
            }
            if COMPLETED_STATUSES.contains(&s) {
                return extract_result(body, kind).map(Self::Completed);
            }
            if FAILED_STATUSES.contains(&s) {
                return Ok(Self::Failed {
                    message: failure_message(body),
                });
            }
        }

        match success {
            Some(true) => extract_result(body, kind).map(Self::Completed),
            Some(false) => Ok(Self::Failed {
                message: failure_message(body),
            }),
            None => Err(ClientError::MalformedResponse(match status {
                Some(s) => format!("unrecognised job status `{s}`"),
                None => "payload carries neither `status` nor `success`".into(),
            })),
        }
    }

    /// Like [`Progress::from_body`] for fetch-endpoint payloads, where an
    /// unknown `status` without a `success` flag is still in flight.
    pub fn from_fetch_body(body: &Value, kind: ResultKind) -> Result<Self, ClientError> {
        let unknown_status = status_of(body).is_some_and(|s| !is_known_status(&s));
        let has_success = body.get("success").and_then(Value::as_bool).is_some();
        if unknown_status && !has_success {
            return Ok(Self::Pending {
                fetch_url: None,
                webhook_received: false,
            });
        }
        Self::from_body(body, kind)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }
}

/// Pick the message of a failed payload: `details`, then `error`.
pub fn failure_message(body: &Value) -> String {
    string_field(body, &["details", "error", "message"])
        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string())
}

fn is_known_status(status: &str) -> bool {
    [TRANSIENT_STATUSES, COMPLETED_STATUSES, FAILED_STATUSES]
        .iter()
        .any(|list| list.contains(&status))
}

fn status_of(body: &Value) -> Option<String> {
    body.get("status")
        .and_then(Value::as_str)
        .map(|s| s.to_ascii_lowercase())
}

fn string_field(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        body.get(*k)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}

fn extract_result(body: &Value, kind: ResultKind) -> Result<JobResult, ClientError> {
    let mut urls: Vec<String> = Vec::new();

    if let Some(url) = string_field(body, kind.url_keys()) {
        urls.push(url);
    }
    for key in kind.list_keys() {
        if let Some(Value::Array(items)) = body.get(*key) {
            for item in items {
                let url = match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(_) => string_field(item, &["url", "imageUrl", "videoUrl"]),
                    _ => None,
                };
                if let Some(url) = url.filter(|u| !u.is_empty() && !urls.contains(u)) {
                    urls.push(url);
                }
            }
        }
    }

    match urls.first() {
        Some(first) => Ok(JobResult {
            result_url: first.clone(),
            result_urls: urls.clone(),
            metadata: body.clone(),
        }),
        None => Err(ClientError::MalformedResponse(format!(
            "completed {} payload carries no result URL",
            kind.as_str()
        ))),
    }
}
