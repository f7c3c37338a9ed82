use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One point-in-time portfolio valuation, emitted for every calendar day
/// on which the account held at least one position with positive invested
/// capital. The stored series is a materialized view: it is replaced
/// wholesale by each rebuild, never mutated in place.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySnapshot {
    pub id: String,
    pub account_id: String,
    pub snapshot_date: NaiveDate,
    /// Market value of all open positions on this day.
    pub total_equity: Decimal,
    /// Cost basis of all open positions on this day.
    pub total_invested: Decimal,
    pub profit: Decimal,
    pub profit_percent: Decimal,
    pub calculated_at: NaiveDateTime,
}

impl DailySnapshot {
    pub fn new(
        account_id: &str,
        snapshot_date: NaiveDate,
        total_equity: Decimal,
        total_invested: Decimal,
    ) -> Self {
        let profit = total_equity - total_invested;
        let profit_percent = if total_invested.is_zero() {
            Decimal::ZERO
        } else {
            profit / total_invested
        };
        DailySnapshot {
            id: format!("{}_{}", account_id, snapshot_date.format("%Y-%m-%d")),
            account_id: account_id.to_string(),
            snapshot_date,
            total_equity,
            total_invested,
            profit,
            profit_percent,
            calculated_at: Utc::now().naive_utc(),
        }
    }
}
