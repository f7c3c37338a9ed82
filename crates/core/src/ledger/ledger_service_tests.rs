use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::ledger_model::{sort_for_replay, NewTransaction, Transaction, TransactionKind};
use super::ledger_service::LedgerService;
use super::ledger_traits::TransactionRepositoryTrait;
use crate::errors::{DatabaseError, Error, LedgerError, Result};
use crate::positions::positions_model::{AssetKind, Position};
use crate::positions::positions_traits::PositionRepositoryTrait;

#[derive(Default)]
struct InMemoryTransactionRepository {
    rows: Mutex<Vec<Transaction>>,
}

#[async_trait]
impl TransactionRepositoryTrait for InMemoryTransactionRepository {
    fn get_transactions_for_account(&self, account_id: &str) -> Result<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        sort_for_replay(&mut rows);
        Ok(rows)
    }

    fn get_transactions_for_symbol(
        &self,
        account_id: &str,
        symbol: &str,
    ) -> Result<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.account_id == account_id && t.symbol == symbol)
            .cloned()
            .collect();
        sort_for_replay(&mut rows);
        Ok(rows)
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(transaction_id.to_string()).into())
    }

    fn get_first_buy_date(&self, account_id: &str, symbol: &str) -> Result<Option<NaiveDate>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| {
                t.account_id == account_id
                    && t.symbol == symbol
                    && t.kind == TransactionKind::Buy
            })
            .map(|t| t.transaction_date)
            .min())
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<()> {
        self.rows.lock().unwrap().push(transaction.clone());
        Ok(())
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let mut rows = self.rows.lock().unwrap();
        let index = rows
            .iter()
            .position(|t| t.id == transaction_id)
            .ok_or_else(|| Error::from(DatabaseError::NotFound(transaction_id.to_string())))?;
        Ok(rows.remove(index))
    }
}

#[derive(Default)]
struct InMemoryPositionRepository {
    rows: Mutex<HashMap<(String, String), Position>>,
}

#[async_trait]
impl PositionRepositoryTrait for InMemoryPositionRepository {
    fn get_position(&self, account_id: &str, symbol: &str) -> Result<Option<Position>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(account_id.to_string(), symbol.to_string()))
            .cloned())
    }

    fn list_positions(&self, account_id: &str) -> Result<Vec<Position>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn save_position(&self, position: &Position) -> Result<()> {
        self.rows.lock().unwrap().insert(
            (position.account_id.clone(), position.symbol.clone()),
            position.clone(),
        );
        Ok(())
    }

    async fn delete_position(&self, account_id: &str, symbol: &str) -> Result<()> {
        self.rows
            .lock()
            .unwrap()
            .remove(&(account_id.to_string(), symbol.to_string()));
        Ok(())
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_tx(kind: TransactionKind, quantity: &str, price: &str, on: NaiveDate) -> NewTransaction {
    NewTransaction {
        account_id: "acct".to_string(),
        symbol: "AAPL".to_string(),
        kind,
        quantity: quantity.parse().unwrap(),
        unit_price: price.parse().unwrap(),
        total_value: None,
        transaction_date: on,
    }
}

fn service() -> (
    LedgerService,
    Arc<InMemoryTransactionRepository>,
    Arc<InMemoryPositionRepository>,
) {
    let transactions = Arc::new(InMemoryTransactionRepository::default());
    let positions = Arc::new(InMemoryPositionRepository::default());
    let service = LedgerService::new(transactions.clone(), positions.clone());
    (service, transactions, positions)
}

#[tokio::test]
async fn record_buy_persists_ledger_and_position() {
    let (service, transactions, positions) = service();

    let position = service
        .record_transaction(
            new_tx(TransactionKind::Buy, "10", "10", date(2024, 1, 2)),
            AssetKind::Equity,
        )
        .await
        .unwrap();

    assert_eq!(position.quantity, dec!(10));
    assert_eq!(transactions.rows.lock().unwrap().len(), 1);
    assert!(positions
        .get_position("acct", "AAPL")
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn oversell_is_rejected_and_persists_nothing() {
    let (service, transactions, positions) = service();

    service
        .record_transaction(
            new_tx(TransactionKind::Buy, "5", "10", date(2024, 1, 2)),
            AssetKind::Equity,
        )
        .await
        .unwrap();
    let before = positions.get_position("acct", "AAPL").unwrap().unwrap();

    let err = service
        .record_transaction(
            new_tx(TransactionKind::Sell, "10", "12", date(2024, 1, 3)),
            AssetKind::Equity,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Ledger(LedgerError::InsufficientBalance { .. })
    ));
    // Ledger unchanged, stored position identical to before the attempt.
    assert_eq!(transactions.rows.lock().unwrap().len(), 1);
    let after = positions.get_position("acct", "AAPL").unwrap().unwrap();
    assert_eq!(after.quantity, before.quantity);
    assert_eq!(after.total_cost, before.total_cost);
    assert_eq!(after.lots, before.lots);
}

#[tokio::test]
async fn deleting_a_buy_that_sells_depend_on_is_rejected() {
    let (service, transactions, _positions) = service();

    service
        .record_transaction(
            new_tx(TransactionKind::Buy, "10", "10", date(2024, 1, 2)),
            AssetKind::Equity,
        )
        .await
        .unwrap();
    service
        .record_transaction(
            new_tx(TransactionKind::Sell, "8", "12", date(2024, 2, 2)),
            AssetKind::Equity,
        )
        .await
        .unwrap();

    let buy_id = transactions.rows.lock().unwrap()[0].id.clone();
    let err = service.delete_transaction(&buy_id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Ledger(LedgerError::InsufficientBalance { .. })
    ));
    // The buy is still in the ledger.
    assert_eq!(transactions.rows.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn deleting_last_transaction_removes_the_position() {
    let (service, transactions, positions) = service();

    service
        .record_transaction(
            new_tx(TransactionKind::Buy, "10", "10", date(2024, 1, 2)),
            AssetKind::Equity,
        )
        .await
        .unwrap();
    let buy_id = transactions.rows.lock().unwrap()[0].id.clone();

    let result = service.delete_transaction(&buy_id).await.unwrap();
    assert!(result.is_none());
    assert!(transactions.rows.lock().unwrap().is_empty());
    assert!(positions.get_position("acct", "AAPL").unwrap().is_none());
}

#[tokio::test]
async fn deleting_a_sell_restores_the_position() {
    let (service, transactions, _positions) = service();

    service
        .record_transaction(
            new_tx(TransactionKind::Buy, "10", "10", date(2024, 1, 2)),
            AssetKind::Equity,
        )
        .await
        .unwrap();
    service
        .record_transaction(
            new_tx(TransactionKind::Sell, "4", "12", date(2024, 2, 2)),
            AssetKind::Equity,
        )
        .await
        .unwrap();

    let sell_id = transactions.rows.lock().unwrap()[1].id.clone();
    let position = service.delete_transaction(&sell_id).await.unwrap().unwrap();
    assert_eq!(position.quantity, dec!(10));
    assert_eq!(position.realized_profit, dec!(0));
}
