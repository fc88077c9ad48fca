use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use ptb_core::{
    ports::PriceSource,
    price::{CoinId, PriceError},
};

use crate::{request_error, status_error};

const SOURCE: &str = "coingecko";

#[derive(Debug, Deserialize)]
struct UsdPrice {
    usd: Option<f64>,
}

/// `/api/v3/simple/price` source. Accepts any CoinGecko id.
#[derive(Clone, Debug)]
pub struct CoinGeckoSimplePrice {
    http: reqwest::Client,
    base: String,
}

impl CoinGeckoSimplePrice {
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into(),
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSimplePrice {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn spot_usd(&self, coin: &CoinId) -> Result<f64, PriceError> {
        let resp = self
            .http
            .get(format!("{}/api/v3/simple/price", self.base))
            .query(&[("ids", coin.as_str()), ("vs_currencies", "usd")])
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| request_error(SOURCE, e))?;

        if !resp.status().is_success() {
            let err = status_error(SOURCE, coin.as_str(), resp.status());
            if err.is_rate_limited() {
                tracing::debug!(%coin, "coingecko rate limit hit");
            }
            return Err(err);
        }

        // { "bitcoin": { "usd": 12345.6 } }; unknown ids are simply absent.
        let body: HashMap<String, UsdPrice> = resp
            .json()
            .await
            .map_err(|e| PriceError::Malformed(format!("{SOURCE}: {e}")))?;

        let rec = body
            .get(coin.as_str())
            .ok_or_else(|| PriceError::NotFound(coin.to_string()))?;
        rec.usd
            .ok_or_else(|| PriceError::Malformed(format!("{SOURCE}: usd missing for {coin}")))
    }
}
