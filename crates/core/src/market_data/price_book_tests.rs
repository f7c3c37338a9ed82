use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::market_data_model::Quote;
use super::market_data_traits::{PriceHistoryProviderTrait, QuoteRepositoryTrait};
use super::price_book::PriceBook;
use crate::errors::{MarketDataError, Result};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Default)]
struct FakeQuoteRepository {
    cache: Mutex<HashMap<String, Vec<Quote>>>,
    saved: Mutex<Vec<Quote>>,
}

#[async_trait]
impl QuoteRepositoryTrait for FakeQuoteRepository {
    fn get_history(&self, symbol: &str) -> Result<Vec<Quote>> {
        Ok(self
            .cache
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_quotes(&self, quotes: &[Quote]) -> Result<()> {
        self.saved.lock().unwrap().extend_from_slice(quotes);
        Ok(())
    }
}

struct FakeProvider {
    histories: HashMap<String, Vec<Quote>>,
    unavailable: bool,
}

#[async_trait]
impl PriceHistoryProviderTrait for FakeProvider {
    async fn fetch_full_history(&self, symbol: &str) -> Result<Vec<Quote>> {
        if self.unavailable {
            return Err(MarketDataError::ProviderUnavailable(symbol.to_string()).into());
        }
        Ok(self.histories.get(symbol).cloned().unwrap_or_default())
    }
}

fn series(symbol: &str, days: &[(i32, u32, u32, &str)]) -> Vec<Quote> {
    days.iter()
        .map(|(y, m, d, close)| Quote::new(symbol, date(*y, *m, *d), close.parse().unwrap()))
        .collect()
}

#[test]
fn lookup_walks_back_to_latest_price_on_or_before() {
    let mut map = HashMap::new();
    map.insert(
        "AAPL".to_string(),
        series(
            "AAPL",
            &[(2024, 1, 5, "105"), (2024, 1, 3, "103"), (2024, 1, 1, "101")],
        ),
    );
    let book = PriceBook::from_series(map);

    assert_eq!(
        book.closest_price_on_or_before("AAPL", date(2024, 1, 4)),
        Some(dec!(103))
    );
    assert_eq!(
        book.closest_price_on_or_before("AAPL", date(2024, 1, 5)),
        Some(dec!(105))
    );
    assert_eq!(book.closest_price_on_or_before("AAPL", date(2023, 12, 31)), None);
    assert_eq!(book.closest_price_on_or_before("MSFT", date(2024, 1, 4)), None);
}

#[test]
fn from_series_normalizes_ascending_input() {
    let mut map = HashMap::new();
    map.insert(
        "AAPL".to_string(),
        series("AAPL", &[(2024, 1, 1, "101"), (2024, 1, 5, "105")]),
    );
    let book = PriceBook::from_series(map);
    assert_eq!(
        book.closest_price_on_or_before("AAPL", date(2024, 1, 6)),
        Some(dec!(105))
    );
}

#[tokio::test]
async fn preload_uses_cache_when_dense_enough() {
    let repository = Arc::new(FakeQuoteRepository::default());
    repository.cache.lock().unwrap().insert(
        "AAPL".to_string(),
        series(
            "AAPL",
            &[
                (2024, 1, 5, "105"),
                (2024, 1, 4, "104"),
                (2024, 1, 3, "103"),
                (2024, 1, 2, "102"),
                (2024, 1, 1, "101"),
            ],
        ),
    );
    let provider = Arc::new(FakeProvider {
        histories: HashMap::new(),
        unavailable: true,
    });

    let symbols: HashSet<String> = ["AAPL".to_string()].into();
    let book = PriceBook::preload(&symbols, repository.clone(), provider).await;

    // Five cached points is enough; the (unavailable) provider is never needed.
    assert_eq!(
        book.closest_price_on_or_before("AAPL", date(2024, 1, 5)),
        Some(dec!(105))
    );
    assert!(repository.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn preload_fetches_full_history_for_sparse_cache() {
    let repository = Arc::new(FakeQuoteRepository::default());
    repository.cache.lock().unwrap().insert(
        "AAPL".to_string(),
        series("AAPL", &[(2024, 1, 5, "105")]),
    );
    let mut histories = HashMap::new();
    histories.insert(
        "AAPL".to_string(),
        series(
            "AAPL",
            &[
                (2024, 1, 5, "105"),
                (2024, 1, 4, "104"),
                (2024, 1, 3, "103"),
                (2024, 1, 2, "102"),
                (2024, 1, 1, "101"),
            ],
        ),
    );
    let provider = Arc::new(FakeProvider {
        histories,
        unavailable: false,
    });

    let symbols: HashSet<String> = ["AAPL".to_string()].into();
    let book = PriceBook::preload(&symbols, repository.clone(), provider).await;

    assert_eq!(
        book.closest_price_on_or_before("AAPL", date(2024, 1, 1)),
        Some(dec!(101))
    );
    // The fetched series was written back to the cache.
    assert_eq!(repository.saved.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn preload_degrades_to_sparse_cache_when_provider_fails() {
    let repository = Arc::new(FakeQuoteRepository::default());
    repository.cache.lock().unwrap().insert(
        "AAPL".to_string(),
        series("AAPL", &[(2024, 1, 5, "105")]),
    );
    let provider = Arc::new(FakeProvider {
        histories: HashMap::new(),
        unavailable: true,
    });

    let symbols: HashSet<String> = ["AAPL".to_string(), "MSFT".to_string()].into();
    let book = PriceBook::preload(&symbols, repository, provider).await;

    // One symbol degrades to its single cached point; the other is empty.
    // Neither failure aborts the preload.
    assert_eq!(
        book.closest_price_on_or_before("AAPL", date(2024, 1, 5)),
        Some(dec!(105))
    );
    assert!(!book.has_series("MSFT"));
}
