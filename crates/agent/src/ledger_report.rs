//! Startup summary of the local token ledger.

use std::path::Path;

use genproxy_core::ledger::{
    progress_to_next_tier, DateSource, JsonFileLedgerStore, LedgerError, LedgerStore, Tier,
    TierProgress, TokenLedger,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub balance: u64,
    pub tier: Tier,
    pub remaining_daily: u64,
    pub transaction_count: usize,
    /// `None` at the top tier.
    pub next_tier: Option<TierProgress>,
}

/// Read the ledger stored at `path`. A missing file reads as empty.
pub fn summarize(path: &Path) -> Result<LedgerSummary, LedgerError> {
    summarize_ledger(&TokenLedger::new(JsonFileLedgerStore::new(path)))
}

/// Like [`summarize`] with an explicit calendar, for deterministic callers.
pub fn summarize_on(
    path: &Path,
    dates: impl DateSource + 'static,
) -> Result<LedgerSummary, LedgerError> {
    summarize_ledger(&TokenLedger::with_date_source(
        JsonFileLedgerStore::new(path),
        dates,
    ))
}

fn summarize_ledger<S: LedgerStore>(ledger: &TokenLedger<S>) -> Result<LedgerSummary, LedgerError> {
    let state = ledger.state()?;
    Ok(LedgerSummary {
        balance: state.balance,
        tier: Tier::for_balance(state.balance),
        remaining_daily: state.remaining_today(),
        transaction_count: state.transactions.len(),
        next_tier: progress_to_next_tier(state.balance),
    })
}

/// Log the summary of the ledger at `path`. Failures are logged, not fatal.
pub fn log_summary(path: &Path) {
    match summarize(path) {
        Ok(summary) => {
            tracing::info!(
                path = %path.display(),
                balance = summary.balance,
                tier = %summary.tier,
                remaining_daily = summary.remaining_daily,
                transactions = summary.transaction_count,
                needed_for_next_tier = summary.next_tier.as_ref().map(|p| p.needed),
                "Local token ledger",
            );
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read local token ledger");
        }
    }
}
