use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;

use crate::{
    ports::PriceSource,
    price::{CoinId, PriceError, PriceQuote},
};

/// Spot-price lookup with a single fallback step.
///
/// Coins the primary source has a mapping for go to the primary first; any
/// primary failure (including rate limiting) falls through to the secondary
/// source exactly once. Everything else goes straight to the secondary.
#[derive(Clone)]
pub struct PriceAdapter {
    primary: Arc<dyn PriceSource>,
    secondary: Arc<dyn PriceSource>,
}

impl PriceAdapter {
    pub fn new(primary: Arc<dyn PriceSource>, secondary: Arc<dyn PriceSource>) -> Self {
        Self { primary, secondary }
    }

    pub async fn fetch(&self, coin: &CoinId) -> Result<PriceQuote, PriceError> {
        if self.primary.supports(coin) {
            let source = self.primary.name();
            match self.primary.spot_usd(coin).await.and_then(check_price) {
                Ok(price) => return Ok(quote(coin, price, source)),
                Err(e) => {
                    tracing::warn!(%coin, source, error = %e, "primary price source failed, falling back");
                }
            }
        }

        let source = self.secondary.name();
        let price = self.secondary.spot_usd(coin).await.and_then(check_price)?;
        Ok(quote(coin, price, source))
    }
}

fn check_price(price: f64) -> Result<f64, PriceError> {
    if !price.is_finite() || price < 0.0 {
        return Err(PriceError::Malformed(format!("invalid price {price}")));
    }
    Ok(price)
}

fn quote(coin: &CoinId, price_usd: f64, source: &'static str) -> PriceQuote {
    PriceQuote {
        symbol: coin.clone(),
        price_usd,
        source,
        fetched_at: Instant::now(),
        as_of: Utc::now(),
    }
}
