//! Boundary traits for dividend events.

use async_trait::async_trait;

use super::dividends_model::DividendEvent;
use crate::errors::Result;

/// Local cache of dividend events.
#[async_trait]
pub trait DividendRepositoryTrait: Send + Sync {
    /// Cached events for a symbol. An unknown symbol yields an empty list.
    fn get_events(&self, symbol: &str) -> Result<Vec<DividendEvent>>;

    /// Upserts events into the cache, keyed by (symbol, ex-date).
    async fn upsert_events(&self, events: &[DividendEvent]) -> Result<()>;
}

/// External dividend event source.
#[async_trait]
pub trait DividendProviderTrait: Send + Sync {
    /// Full dividend history for a symbol.
    /// Failure is `DividendError::ProviderUnavailable`.
    async fn fetch_events(&self, symbol: &str) -> Result<Vec<DividendEvent>>;
}
