use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use folioledger_core::errors::Result;
use folioledger_core::market_data::{Quote, QuoteRepositoryTrait};

use super::model::QuoteDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::quotes;
use crate::utils::chunk_for_sqlite;

/// Local quote cache backed by the quotes table.
pub struct QuoteRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl QuoteRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl QuoteRepositoryTrait for QuoteRepository {
    fn get_history(&self, symbol: &str) -> Result<Vec<Quote>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = quotes::table
            .filter(quotes::symbol.eq(symbol))
            .order(quotes::date.desc())
            .select(QuoteDB::as_select())
            .load::<QuoteDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(Quote::from).collect())
    }

    async fn save_quotes(&self, quotes_to_save: &[Quote]) -> Result<()> {
        if quotes_to_save.is_empty() {
            return Ok(());
        }

        let db_models: Vec<QuoteDB> = quotes_to_save.iter().map(QuoteDB::from).collect();

        self.writer
            .exec(move |conn| {
                // replace_into upserts on the (symbol, date) primary key.
                for chunk in chunk_for_sqlite(&db_models) {
                    diesel::replace_into(quotes::table)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(())
            })
            .await
    }
}
