//! Local token ledger.
//!
//! Tracks a token balance, a per-day earned amount capped at
//! [`DAILY_EARN_LIMIT`], and a transaction log holding the most recent
//! [`MAX_TRANSACTIONS`] entries (newest first). The daily counter resets
//! whenever the local calendar date differs from the stored reset date;
//! balance and history are untouched by the reset.

pub mod store;
pub mod tier;

use std::collections::VecDeque;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use store::{JsonFileLedgerStore, LedgerStore, MemoryLedgerStore};
pub use tier::{progress_to_next_tier, Tier, TierProgress, TIER_THRESHOLDS};

/// Maximum tokens that can be earned per calendar day.
pub const DAILY_EARN_LIMIT: u64 = 100;

/// Number of transactions retained in the log.
pub const MAX_TRANSACTIONS: usize = 50;

/// Date format of [`LedgerState::last_reset_date`].
const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Daily earn limit reached: requested {requested}, {remaining} remaining today")]
    DailyLimitExceeded { requested: u64, remaining: u64 },

    #[error("Insufficient balance: requested {requested}, balance is {balance}")]
    InsufficientBalance { requested: u64, balance: u64 },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Ledger storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Earn,
    Spend,
}

/// One entry of the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub kind: TransactionKind,
    pub amount: u64,
    /// What the tokens were earned or spent on.
    pub action: String,
    pub balance_after: u64,
    pub timestamp: DateTime<Utc>,
}

/// The persisted ledger document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    pub balance: u64,
    pub daily_earned: u64,
    pub last_reset_date: String,
    pub total_earned: u64,
    /// Newest first.
    pub transactions: VecDeque<Transaction>,
}

impl LedgerState {
    pub fn new(today: &str) -> Self {
        Self {
            balance: 0,
            daily_earned: 0,
            last_reset_date: today.to_string(),
            total_earned: 0,
            transactions: VecDeque::new(),
        }
    }

    /// Reset the daily counter if `today` is a different date.
    ///
    /// Returns `true` when a reset happened.
    fn roll_over(&mut self, today: &str) -> bool {
        if self.last_reset_date == today {
            return false;
        }
        self.daily_earned = 0;
        self.last_reset_date = today.to_string();
        true
    }

    pub fn remaining_today(&self) -> u64 {
        DAILY_EARN_LIMIT.saturating_sub(self.daily_earned)
    }

    fn record(&mut self, tx: Transaction) {
        self.transactions.push_front(tx);
        self.transactions.truncate(MAX_TRANSACTIONS);
    }
}

// ---------------------------------------------------------------------------
// Date source
// ---------------------------------------------------------------------------

/// Supplies the local calendar date used for the daily reset.
pub trait DateSource: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The machine's local calendar date.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDate;

impl DateSource for LocalDate {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A date that never changes.
#[derive(Debug, Clone, Copy)]
pub struct FixedDate(pub NaiveDate);

impl DateSource for FixedDate {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Token ledger over a [`LedgerStore`].
///
/// Every operation reloads the stored document, so several ledgers over
/// the same store observe each other's writes (within one process).
pub struct TokenLedger<S: LedgerStore> {
    store: S,
    dates: Box<dyn DateSource>,
}

impl<S: LedgerStore> TokenLedger<S> {
    /// Ledger keyed by the local calendar date.
    pub fn new(store: S) -> Self {
        Self::with_date_source(store, LocalDate)
    }

    pub fn with_date_source(store: S, dates: impl DateSource + 'static) -> Self {
        Self {
            store,
            dates: Box::new(dates),
        }
    }

    fn today(&self) -> String {
        self.dates.today().format(DATE_FORMAT).to_string()
    }

    /// Current state with the daily reset applied. Does not write.
    pub fn state(&self) -> Result<LedgerState, LedgerError> {
        let today = self.today();
        let mut state = self
            .store
            .load()?
            .unwrap_or_else(|| LedgerState::new(&today));
        state.roll_over(&today);
        Ok(state)
    }

    pub fn balance(&self) -> Result<u64, LedgerError> {
        Ok(self.state()?.balance)
    }

    /// Tokens that can still be earned today.
    pub fn remaining_daily(&self) -> Result<u64, LedgerError> {
        Ok(self.state()?.remaining_today())
    }

    /// Whether `amount` fits in today's remaining allowance. Read-only.
    pub fn can_earn(&self, amount: u64) -> Result<bool, LedgerError> {
        Ok(amount > 0 && amount <= self.state()?.remaining_today())
    }

    /// Credit `amount` tokens for `action`.
    ///
    /// Rejected without touching the store when it would exceed today's
    /// allowance.
    pub fn earn(&self, amount: u64, action: &str) -> Result<Transaction, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.state()?;
        let remaining = state.remaining_today();
        if amount > remaining {
            tracing::debug!(amount, remaining, action, "Earn rejected by daily limit");
            return Err(LedgerError::DailyLimitExceeded {
                requested: amount,
                remaining,
            });
        }

        state.balance += amount;
        state.daily_earned += amount;
        state.total_earned += amount;

        let tx = Transaction {
            kind: TransactionKind::Earn,
            amount,
            action: action.to_string(),
            balance_after: state.balance,
            timestamp: Utc::now(),
        };
        state.record(tx.clone());
        self.store.save(&state)?;

        tracing::debug!(amount, balance = state.balance, action, "Tokens earned");
        Ok(tx)
    }

    /// Debit `amount` tokens for `action`.
    pub fn spend(&self, amount: u64, action: &str) -> Result<Transaction, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.state()?;
        if amount > state.balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                balance: state.balance,
            });
        }

        state.balance -= amount;
        let tx = Transaction {
            kind: TransactionKind::Spend,
            amount,
            action: action.to_string(),
            balance_after: state.balance,
            timestamp: Utc::now(),
        };
        state.record(tx.clone());
        self.store.save(&state)?;

        tracing::debug!(amount, balance = state.balance, action, "Tokens spent");
        Ok(tx)
    }

    /// Most recent transactions, newest first.
    pub fn transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.state()?.transactions.into_iter().collect())
    }

    pub fn current_tier(&self) -> Result<Tier, LedgerError> {
        Ok(Tier::for_balance(self.balance()?))
    }

    pub fn progress_to_next_tier(&self) -> Result<Option<TierProgress>, LedgerError> {
        Ok(progress_to_next_tier(self.balance()?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    /// Date that the test can move forward.
    struct MovableDate(Arc<Mutex<NaiveDate>>);

    impl DateSource for MovableDate {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    fn ledger_at(day: &str) -> (TokenLedger<MemoryLedgerStore>, Arc<Mutex<NaiveDate>>) {
        let clock = Arc::new(Mutex::new(date(day)));
        let ledger = TokenLedger::with_date_source(
            MemoryLedgerStore::new(),
            MovableDate(Arc::clone(&clock)),
        );
        (ledger, clock)
    }

    #[test]
    fn earn_credits_balance_and_daily_counter() {
        let (ledger, _) = ledger_at("2026-03-01");
        let tx = ledger.earn(30, "daily_login").unwrap();
        assert_eq!(tx.balance_after, 30);

        let state = ledger.state().unwrap();
        assert_eq!(state.balance, 30);
        assert_eq!(state.daily_earned, 30);
        assert_eq!(state.total_earned, 30);
        assert_eq!(ledger.remaining_daily().unwrap(), 70);
    }

    #[test]
    fn earning_beyond_allowance_is_rejected_without_mutation() {
        let (ledger, _) = ledger_at("2026-03-01");
        ledger.earn(90, "generate").unwrap();
        let before = ledger.state().unwrap();

        assert!(!ledger.can_earn(11).unwrap());
        assert!(ledger.can_earn(10).unwrap());
        assert_matches!(
            ledger.earn(11, "generate"),
            Err(LedgerError::DailyLimitExceeded { requested: 11, remaining: 10 })
        );
        assert_eq!(ledger.state().unwrap(), before);
    }

    #[test]
    fn date_change_resets_daily_counter_only() {
        let (ledger, clock) = ledger_at("2026-03-01");
        ledger.earn(100, "generate").unwrap();
        assert!(!ledger.can_earn(1).unwrap());

        *clock.lock().unwrap() = date("2026-03-02");

        let state = ledger.state().unwrap();
        assert_eq!(state.daily_earned, 0);
        assert_eq!(state.balance, 100);
        assert_eq!(state.transactions.len(), 1);
        assert_eq!(state.last_reset_date, "2026-03-02");
        assert!(ledger.can_earn(100).unwrap());
    }

    #[test]
    fn transaction_log_keeps_newest_fifty() {
        let store = MemoryLedgerStore::with_state(LedgerState {
            balance: 1_000,
            ..LedgerState::new("2026-03-01")
        });
        let ledger = TokenLedger::with_date_source(store, FixedDate(date("2026-03-01")));

        for i in 0..60 {
            ledger.spend(1, &format!("spend-{i}")).unwrap();
        }

        let txs = ledger.transactions().unwrap();
        assert_eq!(txs.len(), MAX_TRANSACTIONS);
        assert_eq!(txs[0].action, "spend-59");
        assert_eq!(txs[MAX_TRANSACTIONS - 1].action, "spend-10");
    }

    #[test]
    fn spend_requires_balance() {
        let (ledger, _) = ledger_at("2026-03-01");
        ledger.earn(5, "bonus").unwrap();
        assert_matches!(
            ledger.spend(6, "video"),
            Err(LedgerError::InsufficientBalance { requested: 6, balance: 5 })
        );
        assert_eq!(ledger.spend(5, "video").unwrap().balance_after, 0);
    }

    #[test]
    fn zero_amounts_are_invalid() {
        let (ledger, _) = ledger_at("2026-03-01");
        assert!(!ledger.can_earn(0).unwrap());
        assert_matches!(ledger.earn(0, "x"), Err(LedgerError::InvalidAmount));
        assert_matches!(ledger.spend(0, "x"), Err(LedgerError::InvalidAmount));
    }

    #[test]
    fn tier_queries_use_balance() {
        let store = MemoryLedgerStore::with_state(LedgerState {
            balance: 5_000,
            ..LedgerState::new("2026-03-01")
        });
        let ledger = TokenLedger::with_date_source(store, FixedDate(date("2026-03-01")));

        assert_eq!(ledger.current_tier().unwrap(), Tier::Tier2);
        let progress = ledger.progress_to_next_tier().unwrap().unwrap();
        assert_eq!(progress.percentage, 0);
        assert_eq!(progress.needed, 5_000);
    }
}
