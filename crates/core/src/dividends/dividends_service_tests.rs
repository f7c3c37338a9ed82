use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::dividends_model::{DividendEvent, PaymentDatePolicy};
use super::dividends_service::{DividendService, DividendServiceTrait};
use super::dividends_traits::{DividendProviderTrait, DividendRepositoryTrait};
use super::refresh_worker::{spawn_refresh_worker, RefreshConfig};
use crate::errors::{DatabaseError, DividendError, Error, Result};
use crate::ledger::ledger_model::Transaction;
use crate::ledger::ledger_traits::TransactionRepositoryTrait;
use crate::positions::positions_model::{AssetKind, Position};
use crate::positions::positions_traits::PositionRepositoryTrait;
use crate::utils::time_utils;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// --- Mocks ---

#[derive(Default)]
struct MockPositionRepository {
    positions: Mutex<Vec<Position>>,
}

#[async_trait]
impl PositionRepositoryTrait for MockPositionRepository {
    fn get_position(&self, account_id: &str, symbol: &str) -> Result<Option<Position>> {
        Ok(self
            .positions
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.account_id == account_id && p.symbol == symbol)
            .cloned())
    }

    fn list_positions(&self, account_id: &str) -> Result<Vec<Position>> {
        Ok(self
            .positions
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn save_position(&self, position: &Position) -> Result<()> {
        self.positions.lock().unwrap().push(position.clone());
        Ok(())
    }

    async fn delete_position(&self, _account_id: &str, _symbol: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct MockTransactionRepository {
    first_buy_dates: Mutex<HashMap<String, NaiveDate>>,
}

#[async_trait]
impl TransactionRepositoryTrait for MockTransactionRepository {
    fn get_transactions_for_account(&self, _account_id: &str) -> Result<Vec<Transaction>> {
        Ok(Vec::new())
    }

    fn get_transactions_for_symbol(
        &self,
        _account_id: &str,
        _symbol: &str,
    ) -> Result<Vec<Transaction>> {
        Ok(Vec::new())
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        Err(DatabaseError::NotFound(transaction_id.to_string()).into())
    }

    fn get_first_buy_date(&self, _account_id: &str, symbol: &str) -> Result<Option<NaiveDate>> {
        Ok(self.first_buy_dates.lock().unwrap().get(symbol).copied())
    }

    async fn insert_transaction(&self, _transaction: &Transaction) -> Result<()> {
        Ok(())
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        Err(DatabaseError::NotFound(transaction_id.to_string()).into())
    }
}

#[derive(Default)]
struct MockDividendRepository {
    events: Mutex<HashMap<String, Vec<DividendEvent>>>,
    failing_symbols: Mutex<Vec<String>>,
}

#[async_trait]
impl DividendRepositoryTrait for MockDividendRepository {
    fn get_events(&self, symbol: &str) -> Result<Vec<DividendEvent>> {
        if self
            .failing_symbols
            .lock()
            .unwrap()
            .contains(&symbol.to_string())
        {
            return Err(DatabaseError::QueryFailed(format!("boom: {symbol}")).into());
        }
        Ok(self
            .events
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_events(&self, events: &[DividendEvent]) -> Result<()> {
        for event in events {
            self.events
                .lock()
                .unwrap()
                .entry(event.symbol.clone())
                .or_default()
                .push(event.clone());
        }
        Ok(())
    }
}

struct MockDividendProvider {
    events: HashMap<String, Vec<DividendEvent>>,
    failures_before_success: Mutex<u32>,
    calls: Arc<Mutex<u32>>,
}

#[async_trait]
impl DividendProviderTrait for MockDividendProvider {
    async fn fetch_events(&self, symbol: &str) -> Result<Vec<DividendEvent>> {
        *self.calls.lock().unwrap() += 1;
        let mut failures = self.failures_before_success.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(Error::Dividend(DividendError::ProviderUnavailable {
                symbol: symbol.to_string(),
                reason: "unreachable".to_string(),
            }));
        }
        Ok(self.events.get(symbol).cloned().unwrap_or_default())
    }
}

// --- Fixtures ---

fn held_position(symbol: &str, kind: AssetKind, quantity: &str) -> Position {
    let mut position = Position::new("acct", symbol, kind);
    position.quantity = quantity.parse().unwrap();
    position
}

fn event(symbol: &str, ex: NaiveDate, per_share: &str, payment: Option<NaiveDate>) -> DividendEvent {
    DividendEvent {
        symbol: symbol.to_string(),
        ex_date: ex,
        amount_per_share: per_share.parse().unwrap(),
        payment_date: payment,
    }
}

struct Fixture {
    positions: Arc<MockPositionRepository>,
    transactions: Arc<MockTransactionRepository>,
    dividends: Arc<MockDividendRepository>,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            positions: Arc::new(MockPositionRepository::default()),
            transactions: Arc::new(MockTransactionRepository::default()),
            dividends: Arc::new(MockDividendRepository::default()),
        }
    }

    fn service(&self) -> DividendService {
        DividendService::new(
            self.positions.clone(),
            self.transactions.clone(),
            self.dividends.clone(),
            None,
            PaymentDatePolicy::default(),
        )
    }
}

// --- Tests ---

#[tokio::test]
async fn event_before_acquisition_contributes_nothing() {
    let f = Fixture::new();
    f.positions
        .positions
        .lock()
        .unwrap()
        .push(held_position("AAPL", AssetKind::Equity, "10"));
    f.transactions
        .first_buy_dates
        .lock()
        .unwrap()
        .insert("AAPL".to_string(), date(2024, 6, 1));
    f.dividends.events.lock().unwrap().insert(
        "AAPL".to_string(),
        vec![
            event("AAPL", date(2024, 3, 10), "1", Some(date(2024, 3, 25))),
            event("AAPL", date(2024, 9, 10), "1", Some(date(2024, 9, 25))),
        ],
    );

    let summary = f.service().reconcile("acct").await.unwrap();

    // Only the post-acquisition event counts: 10 shares x 1.
    assert_eq!(summary.total_all_time, dec!(10));
    assert_eq!(summary.by_month.len(), 1);
    assert!(summary.by_month.contains_key("2024-09"));
}

#[tokio::test]
async fn future_payment_goes_to_provisioned_only() {
    let f = Fixture::new();
    f.positions
        .positions
        .lock()
        .unwrap()
        .push(held_position("AAPL", AssetKind::Equity, "4"));
    f.transactions
        .first_buy_dates
        .lock()
        .unwrap()
        .insert("AAPL".to_string(), date(2020, 1, 1));

    let today = time_utils::today();
    f.dividends.events.lock().unwrap().insert(
        "AAPL".to_string(),
        vec![
            event("AAPL", today - ChronoDuration::days(60), "2", Some(today - ChronoDuration::days(45))),
            event("AAPL", today - ChronoDuration::days(5), "3", Some(today + ChronoDuration::days(10))),
        ],
    );

    let summary = f.service().reconcile("acct").await.unwrap();

    assert_eq!(summary.provisioned.len(), 1);
    assert_eq!(summary.provisioned[0].amount, dec!(12));
    // Provisioned amounts never leak into the received totals.
    assert_eq!(summary.total_all_time, dec!(8));
    let monthly_total: rust_decimal::Decimal =
        summary.by_month.values().map(|m| m.total).sum();
    assert_eq!(monthly_total, dec!(8));
}

#[tokio::test]
async fn missing_payment_date_uses_configured_lag() {
    let f = Fixture::new();
    f.positions
        .positions
        .lock()
        .unwrap()
        .push(held_position("AAPL", AssetKind::Equity, "1"));
    f.transactions
        .first_buy_dates
        .lock()
        .unwrap()
        .insert("AAPL".to_string(), date(2020, 1, 1));

    let today = time_utils::today();
    // Ex-date 10 days ago, no payment date: with a 15-day lag the payment
    // lands 5 days in the future, so the event is provisioned.
    f.dividends.events.lock().unwrap().insert(
        "AAPL".to_string(),
        vec![event("AAPL", today - ChronoDuration::days(10), "1", None)],
    );

    let summary = f.service().reconcile("acct").await.unwrap();
    assert_eq!(summary.provisioned.len(), 1);
    assert_eq!(
        summary.provisioned[0].payment_date,
        today + ChronoDuration::days(5)
    );
    assert_eq!(summary.total_all_time, dec!(0));
}

#[tokio::test]
async fn ineligible_asset_kinds_are_skipped() {
    let f = Fixture::new();
    for (symbol, kind) in [
        ("BTC", AssetKind::Crypto),
        ("CASH", AssetKind::Cash),
        ("BOND", AssetKind::FixedIncome),
    ] {
        f.positions
            .positions
            .lock()
            .unwrap()
            .push(held_position(symbol, kind, "100"));
        f.dividends.events.lock().unwrap().insert(
            symbol.to_string(),
            vec![event(symbol, date(2024, 1, 1), "5", Some(date(2024, 1, 2)))],
        );
    }

    let summary = f.service().reconcile("acct").await.unwrap();
    assert_eq!(summary.total_all_time, dec!(0));
    assert!(summary.by_month.is_empty());
}

#[tokio::test]
async fn one_failing_symbol_does_not_abort_the_others() {
    let f = Fixture::new();
    f.positions
        .positions
        .lock()
        .unwrap()
        .push(held_position("BAD", AssetKind::Equity, "10"));
    f.positions
        .positions
        .lock()
        .unwrap()
        .push(held_position("GOOD", AssetKind::Equity, "10"));
    f.transactions
        .first_buy_dates
        .lock()
        .unwrap()
        .insert("GOOD".to_string(), date(2020, 1, 1));
    f.dividends
        .failing_symbols
        .lock()
        .unwrap()
        .push("BAD".to_string());
    f.dividends.events.lock().unwrap().insert(
        "GOOD".to_string(),
        vec![event("GOOD", date(2024, 1, 10), "1", Some(date(2024, 1, 25)))],
    );

    let summary = f.service().reconcile("acct").await.unwrap();
    assert_eq!(summary.total_all_time, dec!(10));
}

#[tokio::test]
async fn month_bucket_accumulates_breakdown_per_symbol() {
    let f = Fixture::new();
    for symbol in ["AAPL", "MSFT"] {
        f.positions
            .positions
            .lock()
            .unwrap()
            .push(held_position(symbol, AssetKind::Equity, "10"));
        f.transactions
            .first_buy_dates
            .lock()
            .unwrap()
            .insert(symbol.to_string(), date(2020, 1, 1));
    }
    f.dividends.events.lock().unwrap().insert(
        "AAPL".to_string(),
        vec![
            event("AAPL", date(2024, 1, 5), "1", Some(date(2024, 1, 20))),
            event("AAPL", date(2024, 1, 6), "0.5", Some(date(2024, 1, 28))),
        ],
    );
    f.dividends.events.lock().unwrap().insert(
        "MSFT".to_string(),
        vec![event("MSFT", date(2024, 1, 7), "2", Some(date(2024, 1, 21)))],
    );

    let summary = f.service().reconcile("acct").await.unwrap();

    let january = summary.by_month.get("2024-01").unwrap();
    assert_eq!(january.total, dec!(35));
    assert_eq!(january.breakdown.len(), 2);
    let apple = january
        .breakdown
        .iter()
        .find(|entry| entry.symbol == "AAPL")
        .unwrap();
    assert_eq!(apple.amount, dec!(15));
    assert_eq!(summary.total_all_time, dec!(35));
}

#[tokio::test]
async fn empty_cache_enqueues_refresh_and_worker_fills_it() {
    let f = Fixture::new();
    f.positions
        .positions
        .lock()
        .unwrap()
        .push(held_position("AAPL", AssetKind::Equity, "10"));
    f.transactions
        .first_buy_dates
        .lock()
        .unwrap()
        .insert("AAPL".to_string(), date(2020, 1, 1));

    let calls = Arc::new(Mutex::new(0));
    let mut provider_events = HashMap::new();
    provider_events.insert(
        "AAPL".to_string(),
        vec![event("AAPL", date(2024, 1, 5), "1", Some(date(2024, 1, 20)))],
    );
    let provider = Arc::new(MockDividendProvider {
        events: provider_events,
        failures_before_success: Mutex::new(1),
        calls: calls.clone(),
    });

    let handle = spawn_refresh_worker(
        f.dividends.clone(),
        provider,
        RefreshConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(5),
        },
    );
    let service = DividendService::new(
        f.positions.clone(),
        f.transactions.clone(),
        f.dividends.clone(),
        Some(handle),
        PaymentDatePolicy::default(),
    );

    // First call finds an empty cache; the response itself is unaffected.
    let summary = service.reconcile("acct").await.unwrap();
    assert_eq!(summary.total_all_time, dec!(0));

    // The worker retries past the injected failure and fills the cache.
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if !f.dividends.get_events("AAPL").unwrap().is_empty() {
            break;
        }
    }
    assert_eq!(*calls.lock().unwrap(), 2);

    let summary = service.reconcile("acct").await.unwrap();
    assert_eq!(summary.total_all_time, dec!(10));
}
