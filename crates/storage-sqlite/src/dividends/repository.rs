use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use folioledger_core::dividends::{DividendEvent, DividendRepositoryTrait};
use folioledger_core::errors::Result;

use super::model::DividendEventDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::dividend_events;
use crate::utils::chunk_for_sqlite;

/// Local dividend event cache backed by the dividend_events table.
pub struct DividendRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl DividendRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl DividendRepositoryTrait for DividendRepository {
    fn get_events(&self, symbol: &str) -> Result<Vec<DividendEvent>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = dividend_events::table
            .filter(dividend_events::symbol.eq(symbol))
            .order(dividend_events::ex_date.asc())
            .select(DividendEventDB::as_select())
            .load::<DividendEventDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(DividendEvent::from).collect())
    }

    async fn upsert_events(&self, events: &[DividendEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let db_models: Vec<DividendEventDB> = events.iter().map(DividendEventDB::from).collect();

        self.writer
            .exec(move |conn| {
                // replace_into upserts on the (symbol, ex_date) primary key.
                for chunk in chunk_for_sqlite(&db_models) {
                    diesel::replace_into(dividend_events::table)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(())
            })
            .await
    }
}
