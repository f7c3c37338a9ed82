//! Core error types for the FolioLedger engine.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use chrono::{NaiveDate, ParseError as ChronoParseError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Dividend operation failed: {0}")]
    Dividend(#[from] DividendError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Snapshot rebuild for account {account_id} exceeded its deadline of {timeout_secs}s")]
    RebuildTimedOut { account_id: String, timeout_secs: u64 },

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Whether the caller may retry the failed operation as-is.
    /// Rebuild timeouts and transaction failures leave the previously
    /// stored state intact, so a retry is always safe.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::RebuildTimedOut { .. }
                | Error::Database(DatabaseError::TransactionFailed(_))
                | Error::Database(DatabaseError::ConnectionFailed(_))
        )
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint was violated.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A database transaction failed and was rolled back.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Errors raised while replaying the transaction ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A sell would drive the held quantity negative beyond tolerance.
    /// Signals ledger corruption or a missing prior buy; aborts the
    /// whole recompute and must never be silently absorbed.
    #[error(
        "Insufficient balance for {symbol} on {date}: tried to sell {requested} with only {available} held"
    )]
    InsufficientBalance {
        symbol: String,
        date: NaiveDate,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Invalid transaction data: {0}")]
    InvalidTransaction(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
}

/// Errors raised by price history lookups and fetches.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// No price at or before the requested date. Recovered locally by
    /// falling back to the position's average cost; never fatal.
    #[error("No price found for {symbol} at or before {date}")]
    PriceUnavailable { symbol: String, date: NaiveDate },

    /// The cached series exists but is too sparse to be trusted.
    /// Distinct from a zero price.
    #[error("Insufficient price history for symbol: {0}")]
    InsufficientData(String),

    /// The external source could not be reached. Recovered by per-symbol
    /// isolation and cache fallback.
    #[error("Market data provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// Errors raised by dividend event fetches.
#[derive(Error, Debug)]
pub enum DividendError {
    #[error("Dividend provider unavailable for {symbol}: {reason}")]
    ProviderUnavailable { symbol: String, reason: String },

    #[error("Invalid dividend event: {0}")]
    InvalidEvent(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
