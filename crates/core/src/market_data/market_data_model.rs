use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A historical closing price for one symbol on one calendar day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: Decimal,
}

impl Quote {
    pub fn new(symbol: &str, date: NaiveDate, close: Decimal) -> Self {
        Quote {
            symbol: symbol.to_string(),
            date,
            close,
        }
    }
}
