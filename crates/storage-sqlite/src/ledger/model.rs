//! Database models for ledger transactions.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use folioledger_core::errors::{Error, LedgerError};
use folioledger_core::ledger::{Transaction, TransactionKind};

use crate::utils::{format_date, format_datetime, parse_date, parse_datetime, parse_decimal};

/// Database model for ledger transactions. Decimals and dates are stored
/// as text to keep full precision in SQLite.
#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub kind: String,
    pub quantity: String,
    pub unit_price: String,
    pub total_value: String,
    pub transaction_date: String,
    pub recorded_at: String,
}

impl From<&Transaction> for TransactionDB {
    fn from(tx: &Transaction) -> Self {
        TransactionDB {
            id: tx.id.clone(),
            account_id: tx.account_id.clone(),
            symbol: tx.symbol.clone(),
            kind: tx.kind.to_string(),
            quantity: tx.quantity.to_string(),
            unit_price: tx.unit_price.to_string(),
            total_value: tx.total_value.to_string(),
            transaction_date: format_date(&tx.transaction_date),
            recorded_at: format_datetime(&tx.recorded_at),
        }
    }
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = Error;

    fn try_from(db: TransactionDB) -> Result<Self, Self::Error> {
        let kind = TransactionKind::from_str(&db.kind).map_err(|_| {
            Error::Ledger(LedgerError::InvalidTransaction(format!(
                "Transaction {} has unknown kind '{}'",
                db.id, db.kind
            )))
        })?;

        Ok(Transaction {
            id: db.id,
            account_id: db.account_id,
            symbol: db.symbol,
            kind,
            quantity: parse_decimal(&db.quantity, "quantity"),
            unit_price: parse_decimal(&db.unit_price, "unit_price"),
            total_value: parse_decimal(&db.total_value, "total_value"),
            transaction_date: parse_date(&db.transaction_date, "transaction_date"),
            recorded_at: parse_datetime(&db.recorded_at, "recorded_at"),
        })
    }
}
