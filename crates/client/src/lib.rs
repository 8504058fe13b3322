//! Clients for the generation proxy endpoints.
//!
//! Provides the HTTP [`Transport`](transport::Transport) seam, the
//! submit-then-complete [`AsyncJobClient`](job::AsyncJobClient) with its
//! status-check and polling loops, typed per-endpoint clients, and the
//! keep-warm background task.

pub mod config;
pub mod endpoints;
pub mod job;
pub mod keep_warm;
pub mod poll;
pub mod rate_gate;
pub mod submit;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use job::{AsyncJobClient, ContinuationRoutes, JobSpec};
pub use transport::{ApiRequest, ApiResponse, Method, ReqwestTransport, Transport};
