use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{LedgerError, Result};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "BUY"),
            TransactionKind::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(TransactionKind::Buy),
            "SELL" => Ok(TransactionKind::Sell),
            other => Err(LedgerError::InvalidTransaction(format!(
                "Unknown transaction kind: {}",
                other
            ))),
        }
    }
}

/// A single buy or sell event in the append-only ledger.
///
/// Transactions are immutable once recorded. Positions and snapshots are
/// always derived by replaying the log, never edited directly; the ledger
/// is the single source of truth.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub kind: TransactionKind,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_value: Decimal,
    pub transaction_date: NaiveDate,
    /// Insertion timestamp; breaks ties between same-day transactions.
    pub recorded_at: NaiveDateTime,
}

impl Transaction {
    pub fn validate(&self) -> Result<()> {
        if !self.quantity.is_sign_positive() || self.quantity.is_zero() {
            return Err(LedgerError::InvalidTransaction(format!(
                "Quantity must be positive, got {}",
                self.quantity
            ))
            .into());
        }
        if self.unit_price.is_sign_negative() {
            return Err(LedgerError::InvalidTransaction(format!(
                "Unit price must not be negative, got {}",
                self.unit_price
            ))
            .into());
        }
        if self.symbol.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction("Symbol is empty".to_string()).into());
        }
        Ok(())
    }
}

/// Payload for recording a new ledger entry.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub account_id: String,
    pub symbol: String,
    pub kind: TransactionKind,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub total_value: Option<Decimal>,
    pub transaction_date: NaiveDate,
}

impl NewTransaction {
    /// Assigns an id and insertion timestamp, producing the immutable
    /// ledger row. A missing total value defaults to the trade notional.
    pub fn into_transaction(self) -> Transaction {
        let notional = self.quantity * self.unit_price;
        Transaction {
            id: Uuid::new_v4().to_string(),
            account_id: self.account_id,
            symbol: self.symbol,
            kind: self.kind,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_value: self.total_value.unwrap_or(notional),
            transaction_date: self.transaction_date,
            recorded_at: Utc::now().naive_utc(),
        }
    }
}

/// Sorts a ledger slice into replay order: date, then insertion order.
pub fn sort_for_replay(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        a.transaction_date
            .cmp(&b.transaction_date)
            .then(a.recorded_at.cmp(&b.recorded_at))
    });
}
