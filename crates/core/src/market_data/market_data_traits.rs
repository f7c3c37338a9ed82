//! Boundary traits for price history.
//!
//! The engine never reaches out to a market data source directly; it
//! consumes a local quote cache and an external provider through these
//! traits so the reconstructor can be tested deterministically.

use async_trait::async_trait;

use super::market_data_model::Quote;
use crate::errors::Result;

/// Local cache of historical quotes.
#[async_trait]
pub trait QuoteRepositoryTrait: Send + Sync {
    /// Cached history for a symbol, sorted descending by date.
    /// An unknown symbol yields an empty series, not an error.
    fn get_history(&self, symbol: &str) -> Result<Vec<Quote>>;

    /// Upserts quotes into the cache.
    async fn save_quotes(&self, quotes: &[Quote]) -> Result<()>;
}

/// External full-history price source.
#[async_trait]
pub trait PriceHistoryProviderTrait: Send + Sync {
    /// Full price history for a symbol, sorted descending by date.
    /// Failure is `MarketDataError::ProviderUnavailable`.
    async fn fetch_full_history(&self, symbol: &str) -> Result<Vec<Quote>>;
}
