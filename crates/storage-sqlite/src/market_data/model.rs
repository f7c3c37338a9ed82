//! Database model for cached quotes.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use folioledger_core::market_data::Quote;

use crate::utils::{format_date, parse_date, parse_decimal};

#[derive(Queryable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::quotes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuoteDB {
    pub symbol: String,
    pub date: String,
    pub close: String,
}

impl From<&Quote> for QuoteDB {
    fn from(quote: &Quote) -> Self {
        QuoteDB {
            symbol: quote.symbol.clone(),
            date: format_date(&quote.date),
            close: quote.close.to_string(),
        }
    }
}

impl From<QuoteDB> for Quote {
    fn from(db: QuoteDB) -> Self {
        Quote {
            symbol: db.symbol,
            date: parse_date(&db.date, "date"),
            close: parse_decimal(&db.close, "close"),
        }
    }
}
