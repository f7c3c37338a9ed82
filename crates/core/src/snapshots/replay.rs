//! The day-by-day replay fold.
//!
//! A rebuild walks calendar days from the first transaction to today,
//! carrying an in-memory portfolio between days. Each day is exactly one
//! transition: apply the transactions that have become effective, then
//! mark the open holdings to market. Keeping the transition pure (no I/O)
//! makes the one-day-one-step invariant testable in isolation.

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::snapshots_model::DailySnapshot;
use crate::errors::{LedgerError, Result};
use crate::ledger::ledger_model::{Transaction, TransactionKind};
use crate::market_data::price_book::PriceBook;
use crate::positions::positions_model::is_quantity_significant;

/// Per-symbol running totals carried across days.
#[derive(Debug, Clone, Default)]
pub struct HoldingState {
    pub quantity: Decimal,
    pub total_cost: Decimal,
}

impl HoldingState {
    pub fn average_cost(&self) -> Decimal {
        if self.quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.total_cost / self.quantity
        }
    }

    fn is_open(&self) -> bool {
        is_quantity_significant(&self.quantity)
    }
}

/// The fold state of one rebuild: the in-memory portfolio plus a cursor
/// into the ordered transaction list marking what has been applied.
pub struct ReplayState {
    account_id: String,
    holdings: HashMap<String, HoldingState>,
    applied: usize,
}

impl ReplayState {
    pub fn new(account_id: &str) -> Self {
        ReplayState {
            account_id: account_id.to_string(),
            holdings: HashMap::new(),
            applied: 0,
        }
    }

    pub fn holding(&self, symbol: &str) -> Option<&HoldingState> {
        self.holdings.get(symbol)
    }

    /// One calendar-day transition.
    ///
    /// Applies every not-yet-applied transaction dated at or before `day`
    /// (dates compared calendar-to-calendar, never as timestamps), then
    /// marks the portfolio to market. Returns a snapshot when the account
    /// holds at least one open position with positive invested capital,
    /// `None` otherwise. `transactions` must be the same replay-ordered
    /// slice on every call.
    ///
    /// Sells decrement invested capital at the holding's weighted-average
    /// cost. The lot accountant instead recomputes cost basis from the
    /// surviving FIFO lots, so after a partial sell the two report
    /// different invested capital for the same ledger: the series tracks
    /// capital at risk, the accountant the cost basis of what remains.
    pub fn step_day(
        &mut self,
        day: NaiveDate,
        transactions: &[Transaction],
        prices: &PriceBook,
    ) -> Result<Option<DailySnapshot>> {
        while let Some(transaction) = transactions.get(self.applied) {
            if transaction.transaction_date > day {
                break;
            }
            self.apply_transaction(transaction)?;
            self.applied += 1;
        }

        Ok(self.mark_to_market(day, prices))
    }

    fn apply_transaction(&mut self, transaction: &Transaction) -> Result<()> {
        let holding = self
            .holdings
            .entry(transaction.symbol.clone())
            .or_default();

        match transaction.kind {
            TransactionKind::Buy => {
                holding.quantity += transaction.quantity;
                holding.total_cost += transaction.total_value;
            }
            TransactionKind::Sell => {
                let shortfall = transaction.quantity - holding.quantity;
                if shortfall.is_sign_positive() && is_quantity_significant(&shortfall) {
                    return Err(LedgerError::InsufficientBalance {
                        symbol: transaction.symbol.clone(),
                        date: transaction.transaction_date,
                        requested: transaction.quantity,
                        available: holding.quantity,
                    }
                    .into());
                }
                let average_cost = holding.average_cost();
                let sale_quantity = std::cmp::min(transaction.quantity, holding.quantity);
                holding.quantity -= sale_quantity;
                holding.total_cost -= sale_quantity * average_cost;

                // Clamp dust to exactly zero so a liquidated holding never
                // lingers with a residual cost basis.
                if !is_quantity_significant(&holding.quantity) {
                    holding.quantity = Decimal::ZERO;
                    holding.total_cost = Decimal::ZERO;
                }
                if holding.total_cost.is_sign_negative() {
                    holding.total_cost = Decimal::ZERO;
                }
            }
        }
        Ok(())
    }

    fn mark_to_market(&self, day: NaiveDate, prices: &PriceBook) -> Option<DailySnapshot> {
        let mut total_equity = Decimal::ZERO;
        let mut total_invested = Decimal::ZERO;
        let mut open_positions = 0usize;

        for (symbol, holding) in &self.holdings {
            if !holding.is_open() {
                continue;
            }
            open_positions += 1;
            total_invested += holding.total_cost;

            let price = match prices.price_on_or_before(symbol, day) {
                Ok(close) => close,
                Err(e) => {
                    // Degraded: value the holding at its own average cost so
                    // equity never reads zero purely from missing price data.
                    debug!("{}; using average cost", e);
                    holding.average_cost()
                }
            };
            total_equity += holding.quantity * price;
        }

        if open_positions == 0 || !total_invested.is_sign_positive() {
            return None;
        }
        Some(DailySnapshot::new(
            &self.account_id,
            day,
            total_equity,
            total_invested,
        ))
    }
}
