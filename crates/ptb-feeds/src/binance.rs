use async_trait::async_trait;
use serde::Deserialize;

use ptb_core::{
    ports::PriceSource,
    price::{CoinId, PriceError},
};

use crate::{request_error, status_error};

const SOURCE: &str = "binance";

/// Coin ids with a USDT trading pair on the ticker endpoint.
const PAIRS: &[(&str, &str)] = &[
    ("bitcoin", "BTCUSDT"),
    ("zcash", "ZECUSDT"),
    ("ethereum", "ETHUSDT"),
    ("solana", "SOLUSDT"),
];

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

/// Low-latency ticker source; only knows the pairs in `PAIRS`.
#[derive(Clone, Debug)]
pub struct BinanceTicker {
    http: reqwest::Client,
    base: String,
}

impl BinanceTicker {
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into(),
        }
    }

    fn pair_for(coin: &CoinId) -> Option<&'static str> {
        PAIRS
            .iter()
            .find(|(id, _)| *id == coin.as_str())
            .map(|(_, pair)| *pair)
    }
}

#[async_trait]
impl PriceSource for BinanceTicker {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn supports(&self, coin: &CoinId) -> bool {
        Self::pair_for(coin).is_some()
    }

    async fn spot_usd(&self, coin: &CoinId) -> Result<f64, PriceError> {
        let pair = Self::pair_for(coin).ok_or_else(|| PriceError::NotFound(coin.to_string()))?;

        let resp = self
            .http
            .get(format!("{}/api/v3/ticker/price", self.base))
            .query(&[("symbol", pair)])
            .send()
            .await
            .map_err(|e| request_error(SOURCE, e))?;

        if !resp.status().is_success() {
            return Err(status_error(SOURCE, pair, resp.status()));
        }

        let ticker: TickerPrice = resp
            .json()
            .await
            .map_err(|e| PriceError::Malformed(format!("{SOURCE}: {e}")))?;

        ticker
            .price
            .trim()
            .parse::<f64>()
            .map_err(|_| PriceError::Malformed(format!("{SOURCE}: bad price {:?}", ticker.price)))
    }
}
