use std::{collections::HashMap, time::Duration};

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::price::{adapter::PriceAdapter, CoinId, PriceError, PriceQuote};

/// Per-coin memo of the last quote, valid for `ttl`.
///
/// The lock is never held across the adapter call: two callers missing at the
/// same time both fetch and the later write wins.
pub struct PriceCache {
    adapter: PriceAdapter,
    ttl: Duration,
    entries: RwLock<HashMap<CoinId, PriceQuote>>,
}

impl PriceCache {
    pub fn new(adapter: PriceAdapter, ttl: Duration) -> Self {
        Self {
            adapter,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, coin: &CoinId) -> Result<PriceQuote, PriceError> {
        if let Some(q) = self.live_entry(coin, Instant::now()).await {
            return Ok(q);
        }

        let quote = self.adapter.fetch(coin).await?;
        self.entries
            .write()
            .await
            .insert(coin.clone(), quote.clone());
        tracing::debug!(%coin, price = quote.price_usd, source = quote.source, "price cache refreshed");
        Ok(quote)
    }

    async fn live_entry(&self, coin: &CoinId, now: Instant) -> Option<PriceQuote> {
        let entries = self.entries.read().await;
        let q = entries.get(coin)?;
        if now.saturating_duration_since(q.fetched_at) < self.ttl {
            Some(q.clone())
        } else {
            None
        }
    }
}
