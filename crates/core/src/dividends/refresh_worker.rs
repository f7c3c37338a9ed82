//! Background cache warming for dividend events.
//!
//! Symbols with no cached events are handed to a dedicated worker task
//! over a bounded channel. The worker fetches from the external source
//! and upserts into the cache, retrying with capped exponential backoff;
//! reconciliation itself never waits on it. Failures land in the log
//! instead of vanishing inside an unawaited future.

use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::dividends_traits::{DividendProviderTrait, DividendRepositoryTrait};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct RefreshConfig {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Handle for enqueueing refresh requests.
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<String>,
}

impl RefreshHandle {
    /// Enqueues a symbol for refresh. Never blocks; when the queue is
    /// full the request is dropped and will recur on the next
    /// reconciliation that still finds the cache empty.
    pub fn request_refresh(&self, symbol: &str) {
        if let Err(e) = self.tx.try_send(symbol.to_string()) {
            debug!("Dropping dividend refresh request for {}: {}", symbol, e);
        }
    }
}

/// Spawns the worker task and returns its handle.
pub fn spawn_refresh_worker(
    repository: Arc<dyn DividendRepositoryTrait>,
    provider: Arc<dyn DividendProviderTrait>,
    config: RefreshConfig,
) -> RefreshHandle {
    let (tx, mut rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        while let Some(symbol) = rx.recv().await {
            refresh_symbol(&symbol, &repository, &provider, config).await;
        }
        // Channel closed: all handles dropped, worker exits.
    });

    RefreshHandle { tx }
}

async fn refresh_symbol(
    symbol: &str,
    repository: &Arc<dyn DividendRepositoryTrait>,
    provider: &Arc<dyn DividendProviderTrait>,
    config: RefreshConfig,
) {
    let mut backoff = config.initial_backoff;

    for attempt in 1..=config.max_attempts {
        match provider.fetch_events(symbol).await {
            Ok(events) => {
                if events.is_empty() {
                    debug!("Dividend source has no events for {}", symbol);
                } else if let Err(e) = repository.upsert_events(&events).await {
                    error!("Failed to cache {} dividend events for {}: {}", events.len(), symbol, e);
                } else {
                    debug!("Cached {} dividend events for {}", events.len(), symbol);
                }
                return;
            }
            Err(e) if attempt < config.max_attempts => {
                warn!(
                    "Dividend fetch for {} failed (attempt {}/{}): {}. Retrying in {:?}",
                    symbol, attempt, config.max_attempts, e, backoff
                );
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
            }
            Err(e) => {
                error!(
                    "Giving up on dividend refresh for {} after {} attempts: {}",
                    symbol, config.max_attempts, e
                );
            }
        }
    }
}
