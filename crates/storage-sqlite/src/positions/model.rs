//! Database models for derived positions.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;

use folioledger_core::errors::Error;
use folioledger_core::positions::{AssetKind, Position, TaxLot};

use crate::errors::StorageError;
use crate::utils::{format_date, format_datetime, parse_date, parse_datetime, parse_decimal};

/// Database model for positions. The open lots are stored as a JSON
/// document; they are only ever read and written as a whole alongside the
/// rest of the row.
#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionDB {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub kind: String,
    pub quantity: String,
    pub average_cost: String,
    pub total_cost: String,
    pub realized_profit: String,
    pub lots: String,
    pub first_acquisition_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<&Position> for PositionDB {
    type Error = StorageError;

    fn try_from(position: &Position) -> Result<Self, Self::Error> {
        let lots = serde_json::to_string(&position.lots)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        Ok(PositionDB {
            id: position.id.clone(),
            account_id: position.account_id.clone(),
            symbol: position.symbol.clone(),
            kind: position.kind.to_string(),
            quantity: position.quantity.to_string(),
            average_cost: position.average_cost.to_string(),
            total_cost: position.total_cost.to_string(),
            realized_profit: position.realized_profit.to_string(),
            lots,
            first_acquisition_date: position.first_acquisition_date.as_ref().map(format_date),
            created_at: format_datetime(&position.created_at),
            updated_at: format_datetime(&position.updated_at),
        })
    }
}

impl TryFrom<PositionDB> for Position {
    type Error = Error;

    fn try_from(db: PositionDB) -> Result<Self, Self::Error> {
        let kind = AssetKind::from_str(&db.kind).map_err(Error::Ledger)?;
        let lots: VecDeque<TaxLot> = serde_json::from_str(&db.lots)?;

        Ok(Position {
            id: db.id,
            account_id: db.account_id,
            symbol: db.symbol,
            kind,
            quantity: parse_decimal(&db.quantity, "quantity"),
            average_cost: parse_decimal(&db.average_cost, "average_cost"),
            total_cost: parse_decimal(&db.total_cost, "total_cost"),
            realized_profit: parse_decimal(&db.realized_profit, "realized_profit"),
            lots,
            first_acquisition_date: db
                .first_acquisition_date
                .map(|s| parse_date(&s, "first_acquisition_date")),
            created_at: parse_datetime(&db.created_at, "created_at"),
            updated_at: parse_datetime(&db.updated_at, "updated_at"),
        })
    }
}
