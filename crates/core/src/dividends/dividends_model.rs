use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::DEFAULT_PAYMENT_LAG_DAYS;

/// A per-share income event for one symbol, sourced externally and
/// read-only to the engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DividendEvent {
    pub symbol: String,
    pub ex_date: NaiveDate,
    pub amount_per_share: Decimal,
    /// Explicit payment date when the source provides one.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

/// Policy for resolving the payment date of events that carry none.
///
/// The lag default is a settlement heuristic, not a verified market
/// convention; it is a parameter precisely so deployments can tune it.
#[derive(Debug, Clone, Copy)]
pub struct PaymentDatePolicy {
    pub payment_lag_days: u64,
}

impl Default for PaymentDatePolicy {
    fn default() -> Self {
        PaymentDatePolicy {
            payment_lag_days: DEFAULT_PAYMENT_LAG_DAYS as u64,
        }
    }
}

impl PaymentDatePolicy {
    /// The explicit payment date, or ex-date plus the configured lag.
    pub fn effective_payment_date(&self, event: &DividendEvent) -> NaiveDate {
        event.payment_date.unwrap_or_else(|| {
            event
                .ex_date
                .checked_add_days(Days::new(self.payment_lag_days))
                .unwrap_or(event.ex_date)
        })
    }
}

/// One symbol's contribution to a month bucket.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SymbolIncome {
    pub symbol: String,
    pub amount: Decimal,
}

/// Income received within one "YYYY-MM" month.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyIncome {
    pub total: Decimal,
    pub breakdown: Vec<SymbolIncome>,
}

impl MonthlyIncome {
    fn add(&mut self, symbol: &str, amount: Decimal) {
        self.total += amount;
        match self
            .breakdown
            .iter_mut()
            .find(|entry| entry.symbol == symbol)
        {
            Some(entry) => entry.amount += amount,
            None => self.breakdown.push(SymbolIncome {
                symbol: symbol.to_string(),
                amount,
            }),
        }
    }
}

/// A dividend scheduled for future payment, not yet received.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedDividend {
    pub symbol: String,
    pub ex_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
}

/// The reconciliation result: month buckets for received income, a list
/// of future-dated provisions, and the all-time received total.
/// Recomputed per request, never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DividendSummary {
    pub by_month: BTreeMap<String, MonthlyIncome>,
    pub provisioned: Vec<ProvisionedDividend>,
    pub total_all_time: Decimal,
}

impl DividendSummary {
    pub fn add_received(&mut self, month: String, symbol: &str, amount: Decimal) {
        self.by_month.entry(month).or_default().add(symbol, amount);
        self.total_all_time += amount;
    }
}
