use chrono::{NaiveDate, NaiveDateTime, Utc};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::constants::QUANTITY_THRESHOLD;
use crate::errors::LedgerError;

/// True when a quantity is above the dust threshold.
pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    let threshold =
        Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 6));
    quantity.abs() >= threshold
}

/// Asset classification, used to gate dividend eligibility.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    Equity,
    Etf,
    Fund,
    Crypto,
    Cash,
    FixedIncome,
}

impl AssetKind {
    /// Cash, crypto and fixed income do not pay discrete dividend events.
    pub fn pays_dividends(&self) -> bool {
        !matches!(
            self,
            AssetKind::Cash | AssetKind::Crypto | AssetKind::FixedIncome
        )
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetKind::Equity => "EQUITY",
            AssetKind::Etf => "ETF",
            AssetKind::Fund => "FUND",
            AssetKind::Crypto => "CRYPTO",
            AssetKind::Cash => "CASH",
            AssetKind::FixedIncome => "FIXED_INCOME",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AssetKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EQUITY" => Ok(AssetKind::Equity),
            "ETF" => Ok(AssetKind::Etf),
            "FUND" => Ok(AssetKind::Fund),
            "CRYPTO" => Ok(AssetKind::Crypto),
            "CASH" => Ok(AssetKind::Cash),
            "FIXED_INCOME" => Ok(AssetKind::FixedIncome),
            other => Err(LedgerError::InvalidTransaction(format!(
                "Unknown asset kind: {}",
                other
            ))),
        }
    }
}

/// A specific purchase not yet fully sold. Lots are kept oldest-first
/// and relieved FIFO.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxLot {
    /// Id of the buy transaction that opened the lot.
    pub id: String,
    pub acquisition_date: NaiveDate,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Remaining cost of the lot; reduced proportionally on partial relief.
    pub cost_basis: Decimal,
}

/// Derived holding state for one symbol within an account.
///
/// A position is a pure function of the transaction log: it is created by
/// full replay and replaced wholesale by the next replay. No partial
/// mutation path exists.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub kind: AssetKind,
    pub quantity: Decimal,
    /// Average cost per unit, derived from open lots.
    pub average_cost: Decimal,
    /// Total cost basis of all open lots.
    pub total_cost: Decimal,
    /// Profit realized by sells, at the weighted-average cost in effect
    /// at the moment of each sale.
    pub realized_profit: Decimal,
    #[serde(default)]
    pub lots: VecDeque<TaxLot>,
    /// Date of the oldest open lot. Gates dividend eligibility.
    pub first_acquisition_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Position {
    pub fn new(account_id: &str, symbol: &str, kind: AssetKind) -> Self {
        let now = Utc::now().naive_utc();
        Position {
            id: format!("POS-{}-{}", symbol, account_id),
            account_id: account_id.to_string(),
            symbol: symbol.to_string(),
            kind,
            quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            realized_profit: Decimal::ZERO,
            lots: VecDeque::new(),
            first_acquisition_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recomputes quantity, total cost and average cost from the open lots.
    pub fn recalculate_aggregates(&mut self) {
        let total_quantity: Decimal = self.lots.iter().map(|lot| lot.quantity).sum();
        let total_cost: Decimal = self.lots.iter().map(|lot| lot.cost_basis).sum();

        self.quantity = total_quantity;
        self.total_cost = total_cost;

        if self.quantity.is_sign_positive() && is_quantity_significant(&self.quantity) {
            self.average_cost = self.total_cost / self.quantity;
        } else {
            if !self.lots.is_empty() {
                warn!(
                    "Position {} quantity collapsed to {} with lots remaining. Aggregates zeroed.",
                    self.id, self.quantity
                );
            }
            self.quantity = Decimal::ZERO;
            self.total_cost = Decimal::ZERO;
            self.average_cost = Decimal::ZERO;
        }

        self.first_acquisition_date = self
            .lots
            .iter()
            .map(|lot| lot.acquisition_date)
            .min()
            .or(self.first_acquisition_date);
        self.updated_at = Utc::now().naive_utc();
    }

    /// Opens a new tax lot from a buy and refreshes the aggregates.
    pub fn add_lot(
        &mut self,
        lot_id: String,
        quantity: Decimal,
        unit_price: Decimal,
        acquisition_date: NaiveDate,
    ) {
        if !quantity.is_sign_positive() {
            warn!(
                "Skipping add_lot {} with non-positive quantity: {}",
                lot_id, quantity
            );
            return;
        }

        self.lots.push_back(TaxLot {
            id: lot_id,
            acquisition_date,
            quantity,
            unit_price,
            cost_basis: quantity * unit_price,
        });

        // Keep oldest-first order even when transactions arrive out of order.
        let mut vec_lots: Vec<_> = self.lots.drain(..).collect();
        vec_lots.sort_by_key(|lot| lot.acquisition_date);
        self.lots = vec_lots.into();

        self.recalculate_aggregates();
    }

    /// Relieves lots oldest-first by the sold quantity.
    ///
    /// A lot larger than the remaining sale quantity is split, an exactly
    /// consumed lot is removed, and a smaller lot is consumed fully with
    /// the remainder carried into the next lot. Returns the quantity
    /// actually relieved and the cost basis removed.
    pub fn reduce_lots_fifo(&mut self, quantity_to_reduce: Decimal) -> (Decimal, Decimal) {
        let mut remaining = quantity_to_reduce;
        let mut reduced = Decimal::ZERO;
        let mut cost_removed = Decimal::ZERO;

        while remaining > Decimal::ZERO {
            let Some(mut lot) = self.lots.pop_front() else {
                break;
            };

            let qty_from_lot = std::cmp::min(lot.quantity, remaining);
            let basis_from_lot = if lot.quantity.is_zero() {
                Decimal::ZERO
            } else {
                lot.cost_basis * qty_from_lot / lot.quantity
            };

            reduced += qty_from_lot;
            cost_removed += basis_from_lot;
            remaining -= qty_from_lot;

            let leftover = lot.quantity - qty_from_lot;
            if is_quantity_significant(&leftover) {
                lot.quantity = leftover;
                lot.cost_basis -= basis_from_lot;
                self.lots.push_front(lot);
                break;
            }
            // Fully consumed (or dust): drop the lot.
        }

        self.recalculate_aggregates();
        (reduced, cost_removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_lot_keeps_oldest_first() {
        let mut position = Position::new("acct", "AAPL", AssetKind::Equity);
        position.add_lot("b".into(), dec!(5), dec!(20), date(2024, 2, 1));
        position.add_lot("a".into(), dec!(5), dec!(10), date(2024, 1, 1));
        assert_eq!(position.lots[0].id, "a");
        assert_eq!(position.first_acquisition_date, Some(date(2024, 1, 1)));
    }

    #[test]
    fn reduce_splits_a_larger_lot() {
        let mut position = Position::new("acct", "AAPL", AssetKind::Equity);
        position.add_lot("a".into(), dec!(10), dec!(10), date(2024, 1, 1));
        let (reduced, cost) = position.reduce_lots_fifo(dec!(4));
        assert_eq!(reduced, dec!(4));
        assert_eq!(cost, dec!(40));
        assert_eq!(position.lots.len(), 1);
        assert_eq!(position.quantity, dec!(6));
        assert_eq!(position.total_cost, dec!(60));
    }

    #[test]
    fn reduce_carries_remainder_across_lots() {
        let mut position = Position::new("acct", "AAPL", AssetKind::Equity);
        position.add_lot("a".into(), dec!(10), dec!(10), date(2024, 1, 1));
        position.add_lot("b".into(), dec!(10), dec!(20), date(2024, 2, 1));
        let (reduced, cost) = position.reduce_lots_fifo(dec!(15));
        assert_eq!(reduced, dec!(15));
        assert_eq!(cost, dec!(100) + dec!(100));
        assert_eq!(position.lots.len(), 1);
        assert_eq!(position.lots[0].id, "b");
        assert_eq!(position.quantity, dec!(5));
        assert_eq!(position.total_cost, dec!(100));
    }

    #[test]
    fn dust_leftover_is_dropped() {
        let mut position = Position::new("acct", "AAPL", AssetKind::Equity);
        position.add_lot("a".into(), dec!(10), dec!(10), date(2024, 1, 1));
        position.reduce_lots_fifo(dec!(9.9999999));
        assert!(position.lots.is_empty());
        assert_eq!(position.quantity, Decimal::ZERO);
        assert_eq!(position.total_cost, Decimal::ZERO);
    }

    #[test]
    fn asset_kind_dividend_eligibility() {
        assert!(AssetKind::Equity.pays_dividends());
        assert!(AssetKind::Etf.pays_dividends());
        assert!(!AssetKind::Cash.pays_dividends());
        assert!(!AssetKind::Crypto.pays_dividends());
        assert!(!AssetKind::FixedIncome.pays_dividends());
    }
}
