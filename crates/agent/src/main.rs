//! `genproxy-agent` -- keep-warm daemon for the generation proxy.
//!
//! Periodically pings the proxy's serverless endpoints so they stay warm,
//! and logs a summary of the local token ledger at startup. Stops on
//! Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default               | Description                       |
//! |---------------------------|----------|-----------------------|-----------------------------------|
//! | `GENPROXY_BASE_URL`       | yes      | --                    | Proxy base URL                    |
//! | `REQUEST_TIMEOUT_SECS`    | no       | `30`                  | Per-request timeout               |
//! | `KEEP_WARM_INTERVAL_SECS` | no       | `300`                 | Seconds between ping rounds       |
//! | `KEEP_WARM_PATHS`         | no       | `/image,/video,/chat` | Comma-separated paths to ping     |
//! | `SESSION_FILE`            | no       | --                    | Session JSON for bearer auth      |
//! | `LEDGER_FILE`             | no       | --                    | Local token ledger to summarize   |

use std::sync::Arc;

use anyhow::Context;
use genproxy_agent::{daemon, ledger_report};
use genproxy_client::ClientConfig;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "genproxy_agent=info,genproxy_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().context("invalid configuration")?;

    tracing::info!(
        base_url = %config.base_url,
        request_timeout_secs = config.request_timeout.as_secs(),
        "Starting genproxy-agent",
    );

    if let Some(path) = &config.ledger_file {
        ledger_report::log_summary(path);
    }

    let transport = daemon::build_transport(&config).context("failed to build HTTP transport")?;

    daemon::run(Arc::new(transport), config.keep_warm, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    })
    .await;

    Ok(())
}
