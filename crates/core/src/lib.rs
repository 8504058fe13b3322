//! Shared domain logic for the generation-proxy clients.
//!
//! Pure code only: wire-payload classification, the error taxonomy,
//! completion-loop schedules, the local token ledger, and the session
//! record. Nothing in this crate performs network I/O.

pub mod backoff;
pub mod error;
pub mod ledger;
pub mod rate_limit;
pub mod response;
pub mod session;

pub use error::ClientError;
pub use rate_limit::RateLimitError;
pub use response::{JobResponse, JobResult, Pending, Progress, ResultKind};
