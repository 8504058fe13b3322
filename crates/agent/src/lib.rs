//! `genproxy-agent` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod daemon;
pub mod ledger_report;
