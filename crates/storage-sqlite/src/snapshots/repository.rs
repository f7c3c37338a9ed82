use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use folioledger_core::errors::{DatabaseError, Error, Result};
use folioledger_core::snapshots::{DailySnapshot, SnapshotRepositoryTrait};

use super::model::DailySnapshotDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::daily_snapshots;
use crate::utils::{chunk_for_sqlite, format_date};

/// Repository for the daily snapshot series.
pub struct SnapshotRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    fn get_snapshots(
        &self,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailySnapshot>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = daily_snapshots::table
            .select(DailySnapshotDB::as_select())
            .into_boxed()
            .filter(daily_snapshots::account_id.eq(account_id));
        if let Some(start) = start_date {
            query = query.filter(daily_snapshots::snapshot_date.ge(format_date(&start)));
        }
        if let Some(end) = end_date {
            query = query.filter(daily_snapshots::snapshot_date.le(format_date(&end)));
        }

        let rows = query
            .order(daily_snapshots::snapshot_date.asc())
            .load::<DailySnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(DailySnapshot::from).collect())
    }

    fn get_latest_snapshot(&self, account_id: &str) -> Result<Option<DailySnapshot>> {
        let mut conn = get_connection(&self.pool)?;

        let row = daily_snapshots::table
            .filter(daily_snapshots::account_id.eq(account_id))
            .order(daily_snapshots::snapshot_date.desc())
            .select(DailySnapshotDB::as_select())
            .first::<DailySnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(row.map(DailySnapshot::from))
    }

    async fn replace_all_for_account(
        &self,
        account_id: &str,
        snapshots: &[DailySnapshot],
    ) -> Result<()> {
        let account_owned = account_id.to_string();
        let db_models: Vec<DailySnapshotDB> =
            snapshots.iter().map(DailySnapshotDB::from).collect();

        debug!(
            "Replacing snapshot series for account {} with {} rows",
            account_owned,
            db_models.len()
        );

        self.writer
            .exec(move |conn| {
                diesel::delete(
                    daily_snapshots::table.filter(daily_snapshots::account_id.eq(&account_owned)),
                )
                .execute(conn)?;

                for chunk in chunk_for_sqlite(&db_models) {
                    diesel::insert_into(daily_snapshots::table)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(())
            })
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::TransactionFailed(format!(
                    "Snapshot series replace rolled back: {}",
                    e
                )))
            })
    }
}
