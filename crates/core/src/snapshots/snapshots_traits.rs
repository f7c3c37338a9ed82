//! Repository trait for the daily snapshot series.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::snapshots_model::DailySnapshot;
use crate::errors::Result;

#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Stored snapshots for an account within an optional date range,
    /// ordered ascending by date.
    fn get_snapshots(
        &self,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailySnapshot>>;

    /// The most recent stored snapshot, if any.
    fn get_latest_snapshot(&self, account_id: &str) -> Result<Option<DailySnapshot>>;

    /// Atomically replaces the account's entire series with `snapshots`.
    ///
    /// Delete and insert run inside one transaction: on failure the prior
    /// series must remain intact and fully visible to readers
    /// (`DatabaseError::TransactionFailed`, retryable). Passing an empty
    /// slice clears the series.
    async fn replace_all_for_account(
        &self,
        account_id: &str,
        snapshots: &[DailySnapshot],
    ) -> Result<()>;
}
