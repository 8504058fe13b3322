//! Keep-warm daemon lifecycle.

use std::future::Future;
use std::sync::Arc;

use genproxy_client::keep_warm::{KeepWarm, KeepWarmConfig};
use genproxy_client::{ClientConfig, ReqwestTransport, Transport};
use genproxy_core::session::SessionFile;
use genproxy_core::ClientError;

/// Build the HTTP transport described by `config`, attaching the session
/// file when one is configured.
pub fn build_transport(config: &ClientConfig) -> Result<ReqwestTransport, ClientError> {
    let transport = ReqwestTransport::new(&config.base_url, config.request_timeout)?;
    Ok(match &config.session_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using session file for bearer auth");
            transport.with_session(SessionFile::new(path))
        }
        None => transport,
    })
}

/// Ping the configured endpoints until `shutdown` resolves, then stop the
/// pinger and wait for it to exit.
pub async fn run(
    transport: Arc<dyn Transport>,
    config: KeepWarmConfig,
    shutdown: impl Future<Output = ()>,
) {
    tracing::info!(
        interval_secs = config.interval.as_secs(),
        paths = ?config.paths,
        "Starting keep-warm daemon",
    );

    let handle = KeepWarm::spawn(transport, config);
    shutdown.await;

    tracing::info!("Shutdown requested, stopping keep-warm task");
    handle.stop().await;
    tracing::info!("Keep-warm daemon stopped");
}
