//! FolioLedger Core - Domain entities, services, and traits.
//!
//! This crate contains the portfolio reconstruction engine: FIFO lot
//! accounting, day-by-day snapshot replay, and dividend reconciliation.
//! It is database-agnostic and defines repository traits that are
//! implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod dividends;
pub mod errors;
pub mod ledger;
pub mod market_data;
pub mod positions;
pub mod snapshots;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
