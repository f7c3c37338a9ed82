use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::min;
use diesel::prelude::*;
use std::sync::Arc;

use folioledger_core::errors::{DatabaseError, Error, Result};
use folioledger_core::ledger::{Transaction, TransactionKind, TransactionRepositoryTrait};

use super::model::TransactionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::transactions;
use crate::utils::parse_date;

/// Repository for the append-only transaction ledger.
pub struct TransactionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    fn get_transactions_for_account(&self, account_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions::table
            .filter(transactions::account_id.eq(account_id))
            .order((
                transactions::transaction_date.asc(),
                transactions::recorded_at.asc(),
            ))
            .select(TransactionDB::as_select())
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    fn get_transactions_for_symbol(
        &self,
        account_id: &str,
        symbol: &str,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = transactions::table
            .filter(transactions::account_id.eq(account_id))
            .filter(transactions::symbol.eq(symbol))
            .order((
                transactions::transaction_date.asc(),
                transactions::recorded_at.asc(),
            ))
            .select(TransactionDB::as_select())
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;

        let row = transactions::table
            .find(transaction_id)
            .select(TransactionDB::as_select())
            .first::<TransactionDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => Error::Database(DatabaseError::NotFound(
                    format!("Transaction {} not found", transaction_id),
                )),
                e => StorageError::from(e).into(),
            })?;

        Transaction::try_from(row)
    }

    fn get_first_buy_date(&self, account_id: &str, symbol: &str) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;

        // Dates are stored as %Y-%m-%d, so the lexicographic minimum is the
        // chronological minimum.
        let earliest: Option<String> = transactions::table
            .filter(transactions::account_id.eq(account_id))
            .filter(transactions::symbol.eq(symbol))
            .filter(transactions::kind.eq(TransactionKind::Buy.to_string()))
            .select(min(transactions::transaction_date))
            .first::<Option<String>>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(earliest.map(|s| parse_date(&s, "transaction_date")))
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<()> {
        let row = TransactionDB::from(transaction);

        self.writer
            .exec(move |conn| {
                diesel::insert_into(transactions::table)
                    .values(&row)
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let id_owned = transaction_id.to_string();

        let removed = self
            .writer
            .exec(move |conn| {
                let row = transactions::table
                    .find(&id_owned)
                    .select(TransactionDB::as_select())
                    .first::<TransactionDB>(conn)?;

                diesel::delete(transactions::table.find(&id_owned)).execute(conn)?;

                Ok(row)
            })
            .await?;

        Transaction::try_from(removed)
    }
}
