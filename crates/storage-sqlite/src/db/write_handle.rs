//! Serialized write path for the SQLite database.
//!
//! SQLite allows a single writer at a time. Every mutation goes through a
//! `WriteHandle`, which runs the closure on the blocking pool inside an
//! `IMMEDIATE` transaction. The lock is taken up front, so concurrent
//! writers queue on the busy timeout instead of failing mid-transaction,
//! and readers on other pool connections keep seeing the pre-transaction
//! state until commit.

use std::sync::Arc;

use diesel::sqlite::SqliteConnection;

use folioledger_core::errors::{Error, Result};

use super::DbPool;
use crate::errors::StorageError;

#[derive(Clone)]
pub struct WriteHandle {
    pool: Arc<DbPool>,
}

impl WriteHandle {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Executes `job` inside an immediate transaction on a blocking thread.
    ///
    /// Any error returned by the closure rolls the transaction back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> std::result::Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || -> Result<T> {
            let mut conn = pool
                .get()
                .map_err(StorageError::from)
                .map_err(Error::from)?;
            conn.immediate_transaction::<_, StorageError, _>(job)
                .map_err(Error::from)
        })
        .await
        .map_err(|e| Error::Unexpected(format!("Database write task failed: {}", e)))?
    }
}
