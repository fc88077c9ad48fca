//! Hexagonal ports for the upstream price providers.
//!
//! HTTP implementations live in `ptb-feeds`; tests use in-memory fakes.

use async_trait::async_trait;

use crate::price::{CoinId, CollectionStats, CollectionSymbol, PriceError};

/// A spot-price provider (USD).
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short provider name, recorded on every quote.
    fn name(&self) -> &'static str;

    /// Whether this provider has a mapping for `coin`. Providers that accept
    /// arbitrary ids keep the default.
    fn supports(&self, _coin: &CoinId) -> bool {
        true
    }

    async fn spot_usd(&self, coin: &CoinId) -> Result<f64, PriceError>;
}

/// NFT collection statistics provider.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn collection_stats(
        &self,
        symbol: &CollectionSymbol,
    ) -> Result<CollectionStats, PriceError>;
}
