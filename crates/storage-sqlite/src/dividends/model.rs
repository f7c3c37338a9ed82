//! Database model for cached dividend events.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use folioledger_core::dividends::DividendEvent;

use crate::utils::{format_date, parse_date, parse_decimal};

#[derive(Queryable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::dividend_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DividendEventDB {
    pub symbol: String,
    pub ex_date: String,
    pub amount_per_share: String,
    pub payment_date: Option<String>,
}

impl From<&DividendEvent> for DividendEventDB {
    fn from(event: &DividendEvent) -> Self {
        DividendEventDB {
            symbol: event.symbol.clone(),
            ex_date: format_date(&event.ex_date),
            amount_per_share: event.amount_per_share.to_string(),
            payment_date: event.payment_date.as_ref().map(format_date),
        }
    }
}

impl From<DividendEventDB> for DividendEvent {
    fn from(db: DividendEventDB) -> Self {
        DividendEvent {
            symbol: db.symbol,
            ex_date: parse_date(&db.ex_date, "ex_date"),
            amount_per_share: parse_decimal(&db.amount_per_share, "amount_per_share"),
            payment_date: db.payment_date.map(|s| parse_date(&s, "payment_date")),
        }
    }
}
