//! SQLite storage implementation for FolioLedger.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in
//! `folioledger-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for the ledger, positions, snapshots,
//!   quotes and dividend events
//! - Database-specific model types (with Diesel derives)
//!
//! This crate is the only place where Diesel dependencies exist; the core
//! crate is database-agnostic and works with traits.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod dividends;
pub mod ledger;
pub mod market_data;
pub mod positions;
pub mod snapshots;

// Re-export database utilities
pub use db::{create_pool, get_connection, run_migrations, DbConnection, DbPool, WriteHandle};

// Re-export storage errors
pub use errors::StorageError;

// Re-export from folioledger-core for convenience
pub use folioledger_core::errors::{DatabaseError, Error, Result};
