//! Repository trait for the append-only transaction ledger.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::ledger_model::Transaction;
use crate::errors::Result;

#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// All transactions for an account, ordered by (date, insertion order).
    fn get_transactions_for_account(&self, account_id: &str) -> Result<Vec<Transaction>>;

    /// All transactions for one symbol within an account, ordered by
    /// (date, insertion order).
    fn get_transactions_for_symbol(
        &self,
        account_id: &str,
        symbol: &str,
    ) -> Result<Vec<Transaction>>;

    /// A single transaction by id.
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;

    /// Date of the first buy for a symbol, if any transaction history exists.
    fn get_first_buy_date(&self, account_id: &str, symbol: &str) -> Result<Option<NaiveDate>>;

    /// Appends a transaction to the ledger.
    async fn insert_transaction(&self, transaction: &Transaction) -> Result<()>;

    /// Removes a transaction from the ledger, returning the removed row.
    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction>;
}
