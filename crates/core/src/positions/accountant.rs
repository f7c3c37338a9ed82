//! Replays a symbol's transaction log into a derived `Position`.
//!
//! The replay is a pure fold over the ordered ledger: buys open tax lots,
//! sells realize profit at the weighted-average cost in effect at the
//! moment of sale and then relieve lots oldest-first. The resulting
//! aggregates are always recomputed from the surviving lots, so
//! `sum(lot.quantity) == position.quantity` holds by construction.

use log::debug;
use rust_decimal::Decimal;

use super::positions_model::{is_quantity_significant, AssetKind, Position};
use crate::errors::{LedgerError, Result};
use crate::ledger::ledger_model::{sort_for_replay, Transaction, TransactionKind};

/// Recomputes the position for one symbol from its full transaction log.
///
/// Transactions are replayed in (date, insertion order). A sell that would
/// drive the held quantity negative beyond tolerance aborts the whole
/// recompute with `LedgerError::InsufficientBalance`; quantity drifting
/// within tolerance is clamped to zero.
pub fn replay(
    account_id: &str,
    symbol: &str,
    kind: AssetKind,
    transactions: &[Transaction],
) -> Result<Position> {
    let mut ordered: Vec<Transaction> = transactions.to_vec();
    sort_for_replay(&mut ordered);

    let mut position = Position::new(account_id, symbol, kind);
    if let Some(first) = ordered.first() {
        position.created_at = first.recorded_at;
    }

    for transaction in &ordered {
        transaction.validate()?;
        match transaction.kind {
            TransactionKind::Buy => apply_buy(&mut position, transaction),
            TransactionKind::Sell => apply_sell(&mut position, transaction)?,
        }
    }

    debug!(
        "Replayed {} transactions for {}/{}: quantity {}, cost {}, realized {}",
        ordered.len(),
        account_id,
        symbol,
        position.quantity,
        position.total_cost,
        position.realized_profit
    );
    Ok(position)
}

fn apply_buy(position: &mut Position, transaction: &Transaction) {
    position.add_lot(
        transaction.id.clone(),
        transaction.quantity,
        transaction.unit_price,
        transaction.transaction_date,
    );
}

fn apply_sell(position: &mut Position, transaction: &Transaction) -> Result<()> {
    let available = position.quantity;
    let requested = transaction.quantity;
    let shortfall = requested - available;

    // A genuine oversell signals ledger corruption or a missing prior buy.
    if shortfall.is_sign_positive() && is_quantity_significant(&shortfall) {
        return Err(LedgerError::InsufficientBalance {
            symbol: transaction.symbol.clone(),
            date: transaction.transaction_date,
            requested,
            available,
        }
        .into());
    }

    // Realize profit against the weighted-average cost at the moment of sale.
    let average_cost = if available.is_zero() {
        Decimal::ZERO
    } else {
        position.total_cost / available
    };
    let sale_quantity = std::cmp::min(requested, available);
    position.realized_profit += transaction.total_value - (sale_quantity * average_cost);

    position.reduce_lots_fifo(sale_quantity);
    Ok(())
}
