//! Database model for the daily snapshot series.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use folioledger_core::snapshots::DailySnapshot;

use crate::utils::{format_date, format_datetime, parse_date, parse_datetime, parse_decimal};

#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::daily_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DailySnapshotDB {
    pub id: String,
    pub account_id: String,
    pub snapshot_date: String,
    pub total_equity: String,
    pub total_invested: String,
    pub profit: String,
    pub profit_percent: String,
    pub calculated_at: String,
}

impl From<&DailySnapshot> for DailySnapshotDB {
    fn from(snapshot: &DailySnapshot) -> Self {
        DailySnapshotDB {
            id: snapshot.id.clone(),
            account_id: snapshot.account_id.clone(),
            snapshot_date: format_date(&snapshot.snapshot_date),
            total_equity: snapshot.total_equity.to_string(),
            total_invested: snapshot.total_invested.to_string(),
            profit: snapshot.profit.to_string(),
            profit_percent: snapshot.profit_percent.to_string(),
            calculated_at: format_datetime(&snapshot.calculated_at),
        }
    }
}

impl From<DailySnapshotDB> for DailySnapshot {
    fn from(db: DailySnapshotDB) -> Self {
        DailySnapshot {
            id: db.id,
            account_id: db.account_id,
            snapshot_date: parse_date(&db.snapshot_date, "snapshot_date"),
            total_equity: parse_decimal(&db.total_equity, "total_equity"),
            total_invested: parse_decimal(&db.total_invested, "total_invested"),
            profit: parse_decimal(&db.profit, "profit"),
            profit_percent: parse_decimal(&db.profit_percent, "profit_percent"),
            calculated_at: parse_datetime(&db.calculated_at, "calculated_at"),
        }
    }
}
