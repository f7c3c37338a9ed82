//! In-memory price lookup for a rebuild.
//!
//! The reconstructor needs random access to each symbol's full series
//! while it walks calendar days, so all series are loaded up front.
//! The book is passed in explicitly rather than held as module state.

use futures::future::join_all;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::market_data_model::Quote;
use super::market_data_traits::{PriceHistoryProviderTrait, QuoteRepositoryTrait};
use crate::constants::MIN_CACHED_QUOTES;
use crate::errors::{MarketDataError, Result};

/// Per-symbol price series, each sorted descending by date.
#[derive(Debug, Default, Clone)]
pub struct PriceBook {
    series: HashMap<String, Vec<Quote>>,
}

impl PriceBook {
    /// Builds a book from raw series, normalizing each to descending order.
    pub fn from_series(series: HashMap<String, Vec<Quote>>) -> Self {
        let mut normalized = series;
        for quotes in normalized.values_mut() {
            quotes.sort_by(|a, b| b.date.cmp(&a.date));
        }
        PriceBook { series: normalized }
    }

    /// The latest close at or before `date`, or `None` when the symbol has
    /// no usable price that far back. A zero close is a valid price; the
    /// absence of data is not.
    pub fn closest_price_on_or_before(
        &self,
        symbol: &str,
        date: chrono::NaiveDate,
    ) -> Option<Decimal> {
        self.series
            .get(symbol)?
            .iter()
            .find(|quote| quote.date <= date)
            .map(|quote| quote.close)
    }

    /// Same lookup, with the miss surfaced as a typed error for callers
    /// that want to log the degradation.
    pub fn price_on_or_before(
        &self,
        symbol: &str,
        date: chrono::NaiveDate,
    ) -> Result<Decimal> {
        self.closest_price_on_or_before(symbol, date)
            .ok_or_else(|| {
                MarketDataError::PriceUnavailable {
                    symbol: symbol.to_string(),
                    date,
                }
                .into()
            })
    }

    pub fn has_series(&self, symbol: &str) -> bool {
        self.series
            .get(symbol)
            .is_some_and(|quotes| !quotes.is_empty())
    }

    /// Preloads one series per distinct symbol, fanned out concurrently.
    ///
    /// Each symbol resolves through a two-tier fallback: the cached series
    /// is used when it holds at least `MIN_CACHED_QUOTES` points; otherwise
    /// a full external fetch runs (and refreshes the cache). A provider
    /// failure degrades to whatever the cache held. Preload itself never
    /// fails; a symbol may simply end up with an empty series.
    pub async fn preload(
        symbols: &HashSet<String>,
        quote_repository: Arc<dyn QuoteRepositoryTrait>,
        provider: Arc<dyn PriceHistoryProviderTrait>,
    ) -> Self {
        let fetches = symbols.iter().map(|symbol| {
            let repository = quote_repository.clone();
            let provider = provider.clone();
            let symbol = symbol.clone();
            async move {
                let series = load_symbol_series(&symbol, repository, provider).await;
                (symbol, series)
            }
        });

        let series: HashMap<String, Vec<Quote>> = join_all(fetches).await.into_iter().collect();
        PriceBook::from_series(series)
    }
}

async fn load_symbol_series(
    symbol: &str,
    quote_repository: Arc<dyn QuoteRepositoryTrait>,
    provider: Arc<dyn PriceHistoryProviderTrait>,
) -> Vec<Quote> {
    let cached = match quote_repository.get_history(symbol) {
        Ok(quotes) => quotes,
        Err(e) => {
            warn!("Quote cache read failed for {}: {}", symbol, e);
            Vec::new()
        }
    };

    if cached.len() >= MIN_CACHED_QUOTES {
        return cached;
    }
    debug!(
        "{}: {} cached points; fetching full history",
        MarketDataError::InsufficientData(symbol.to_string()),
        cached.len()
    );

    match provider.fetch_full_history(symbol).await {
        Ok(full) if !full.is_empty() => {
            if let Err(e) = quote_repository.save_quotes(&full).await {
                warn!("Failed to cache fetched history for {}: {}", symbol, e);
            }
            full
        }
        Ok(_) => {
            warn!(
                "Provider returned no history for {}; using {} cached quotes",
                symbol,
                cached.len()
            );
            cached
        }
        Err(e) => {
            warn!(
                "Price fetch failed for {}: {}. Falling back to {} cached quotes",
                symbol,
                e,
                cached.len()
            );
            cached
        }
    }
}
