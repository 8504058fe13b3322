use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use genproxy_agent::{daemon, ledger_report};
use genproxy_client::keep_warm::KeepWarmConfig;
use genproxy_client::transport::{ApiRequest, ApiResponse, Transport};
use genproxy_core::ledger::{FixedDate, JsonFileLedgerStore, Tier, TokenLedger, DAILY_EARN_LIMIT};
use genproxy_core::ClientError;
use serde_json::json;

/// Answers every request with `200 {}` and remembers the paths.
#[derive(Default)]
struct CountingTransport {
    paths: Mutex<Vec<String>>,
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        self.paths.lock().unwrap().push(request.path);
        Ok(ApiResponse::json(200, &json!({})))
    }
}

fn date() -> FixedDate {
    FixedDate(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
}

// ---------------------------------------------------------------------------
// Daemon
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn daemon_pings_until_shutdown() {
    let transport = Arc::new(CountingTransport::default());
    let config = KeepWarmConfig {
        interval: Duration::from_secs(30),
        paths: vec!["/image".into()],
    };

    // Rounds at 0, 30 and 60 s; shutdown at 75 s.
    daemon::run(
        transport.clone(),
        config,
        tokio::time::sleep(Duration::from_secs(75)),
    )
    .await;

    assert_eq!(transport.paths.lock().unwrap().len(), 3);

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(transport.paths.lock().unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Ledger summary
// ---------------------------------------------------------------------------

#[test]
fn missing_ledger_summarizes_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let summary = ledger_report::summarize_on(&dir.path().join("ledger.json"), date()).unwrap();

    assert_eq!(summary.balance, 0);
    assert_eq!(summary.tier, Tier::Base);
    assert_eq!(summary.remaining_daily, DAILY_EARN_LIMIT);
    assert_eq!(summary.next_tier.unwrap().needed, 1_000);
}

#[test]
fn summary_reflects_stored_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let ledger = TokenLedger::with_date_source(JsonFileLedgerStore::new(&path), date());
    ledger.earn(60, "daily_login").unwrap();
    ledger.spend(20, "image").unwrap();

    let summary = ledger_report::summarize_on(&path, date()).unwrap();
    assert_eq!(summary.balance, 40);
    assert_eq!(summary.remaining_daily, 40);
    assert_eq!(summary.transaction_count, 2);

    let serialized = serde_json::to_value(&summary).unwrap();
    assert_eq!(serialized["tier"], "BASE");
    assert_eq!(serialized["remainingDaily"], 40);
}
