use crate::rate_limit::RateLimitError;

/// Every failure a generation client can surface to its caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The endpoint answered with a non-2xx status other than 429.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The endpoint answered with HTTP 429.
    #[error("{0}")]
    RateLimited(RateLimitError),

    /// A 2xx response whose body reports a logical failure.
    #[error("{message}")]
    Application { message: String },

    /// The request is missing a required field; nothing was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A 2xx response that does not match any known shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A completion loop exhausted its attempt or wall-clock bound.
    #[error("Generation timed out after {elapsed_secs} seconds")]
    Timeout { elapsed_secs: u64, attempts: u32 },

    /// The job was cancelled by the caller or superseded by a newer job.
    #[error("Generation cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::Application {
            message: message.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether a completion loop may retry after this error.
    ///
    /// Only failures that say nothing about the job itself qualify.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Http { .. } | Self::RateLimited(_)
        )
    }
}
