use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use folioledger_core::errors::Result;
use folioledger_core::positions::{Position, PositionRepositoryTrait};

use super::model::PositionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::positions;

/// Repository for derived positions. Rows are replaced wholesale; replay
/// is the only writer.
pub struct PositionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PositionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PositionRepositoryTrait for PositionRepository {
    fn get_position(&self, account_id: &str, symbol: &str) -> Result<Option<Position>> {
        let mut conn = get_connection(&self.pool)?;

        let row = positions::table
            .filter(positions::account_id.eq(account_id))
            .filter(positions::symbol.eq(symbol))
            .select(PositionDB::as_select())
            .first::<PositionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        row.map(Position::try_from).transpose()
    }

    fn list_positions(&self, account_id: &str) -> Result<Vec<Position>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = positions::table
            .filter(positions::account_id.eq(account_id))
            .order(positions::symbol.asc())
            .select(PositionDB::as_select())
            .load::<PositionDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter().map(Position::try_from).collect()
    }

    async fn save_position(&self, position: &Position) -> Result<()> {
        let row = PositionDB::try_from(position)?;

        self.writer
            .exec(move |conn| {
                diesel::replace_into(positions::table)
                    .values(&row)
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn delete_position(&self, account_id: &str, symbol: &str) -> Result<()> {
        let account_owned = account_id.to_string();
        let symbol_owned = symbol.to_string();

        self.writer
            .exec(move |conn| {
                diesel::delete(
                    positions::table
                        .filter(positions::account_id.eq(&account_owned))
                        .filter(positions::symbol.eq(&symbol_owned)),
                )
                .execute(conn)?;
                Ok(())
            })
            .await
    }
}
