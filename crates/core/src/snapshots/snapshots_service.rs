use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::replay::ReplayState;
use super::snapshots_model::DailySnapshot;
use super::snapshots_traits::SnapshotRepositoryTrait;
use crate::errors::{Error, Result};
use crate::ledger::ledger_model::sort_for_replay;
use crate::ledger::ledger_traits::TransactionRepositoryTrait;
use crate::market_data::market_data_traits::{PriceHistoryProviderTrait, QuoteRepositoryTrait};
use crate::market_data::price_book::PriceBook;
use crate::utils::time_utils;

#[async_trait]
pub trait SnapshotServiceTrait: Send + Sync {
    /// Rebuilds the account's daily snapshot series from scratch and
    /// atomically replaces the stored series. Returns the new series.
    ///
    /// The rebuild spans every calendar day from the first transaction to
    /// today, so it can iterate tens of thousands of days; treat it as a
    /// batch job, not an inline request handler.
    async fn rebuild(&self, account_id: &str) -> Result<Vec<DailySnapshot>>;

    /// `rebuild` with a deadline. A timeout surfaces as the retryable
    /// `Error::RebuildTimedOut` and leaves the stored series untouched.
    async fn rebuild_with_deadline(
        &self,
        account_id: &str,
        deadline: Duration,
    ) -> Result<Vec<DailySnapshot>>;

    /// The stored series, ordered ascending by date.
    fn get_snapshots(
        &self,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailySnapshot>>;
}

/// The time-machine reconstructor.
#[derive(Clone)]
pub struct SnapshotService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    quote_repository: Arc<dyn QuoteRepositoryTrait>,
    price_provider: Arc<dyn PriceHistoryProviderTrait>,
}

impl SnapshotService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        quote_repository: Arc<dyn QuoteRepositoryTrait>,
        price_provider: Arc<dyn PriceHistoryProviderTrait>,
    ) -> Self {
        Self {
            transaction_repository,
            snapshot_repository,
            quote_repository,
            price_provider,
        }
    }
}

#[async_trait]
impl SnapshotServiceTrait for SnapshotService {
    async fn rebuild(&self, account_id: &str) -> Result<Vec<DailySnapshot>> {
        let start_time = Instant::now();

        let mut transactions = self
            .transaction_repository
            .get_transactions_for_account(account_id)?;
        sort_for_replay(&mut transactions);

        if transactions.is_empty() {
            debug!(
                "Account {} has no transactions; clearing snapshot series",
                account_id
            );
            self.snapshot_repository
                .replace_all_for_account(account_id, &[])
                .await?;
            return Ok(Vec::new());
        }

        // Preload every symbol's series concurrently before the sequential
        // day walk begins; the walk needs random access to all of them.
        let symbols: HashSet<String> = transactions
            .iter()
            .map(|transaction| transaction.symbol.clone())
            .collect();
        let price_book = PriceBook::preload(
            &symbols,
            self.quote_repository.clone(),
            self.price_provider.clone(),
        )
        .await;
        for symbol in &symbols {
            if !price_book.has_series(symbol) {
                warn!(
                    "No price history for {} during rebuild of {}; will value at average cost",
                    symbol, account_id
                );
            }
        }

        let first_date = transactions[0].transaction_date;
        let today = time_utils::today();

        // Day N's portfolio depends on day N-1's; this walk is strictly
        // sequential.
        let mut state = ReplayState::new(account_id);
        let mut series: Vec<DailySnapshot> = Vec::new();
        for day in time_utils::get_days_between(first_date, today) {
            if let Some(snapshot) = state.step_day(day, &transactions, &price_book)? {
                let duplicate = series
                    .last()
                    .is_some_and(|previous| previous.snapshot_date == snapshot.snapshot_date);
                if !duplicate {
                    series.push(snapshot);
                }
            }
        }

        self.snapshot_repository
            .replace_all_for_account(account_id, &series)
            .await?;

        debug!(
            "Rebuilt {} snapshots for account {} over {} symbols in {:?}",
            series.len(),
            account_id,
            symbols.len(),
            start_time.elapsed()
        );
        Ok(series)
    }

    async fn rebuild_with_deadline(
        &self,
        account_id: &str,
        deadline: Duration,
    ) -> Result<Vec<DailySnapshot>> {
        match tokio::time::timeout(deadline, self.rebuild(account_id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Snapshot rebuild for {} timed out after {:?}; stored series left untouched",
                    account_id, deadline
                );
                Err(Error::RebuildTimedOut {
                    account_id: account_id.to_string(),
                    timeout_secs: deadline.as_secs(),
                })
            }
        }
    }

    fn get_snapshots(
        &self,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailySnapshot>> {
        self.snapshot_repository
            .get_snapshots(account_id, start_date, end_date)
    }
}
