use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use ptb_core::{
    ports::CollectionSource,
    price::{CollectionStats, CollectionSymbol, PriceError},
};

use crate::request_error;

const SOURCE: &str = "magiceden";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsBody {
    #[serde(default)]
    floor_price: Option<i64>,
    #[serde(default)]
    listed_count: Option<u64>,
    #[serde(default)]
    volume_all: Option<f64>,
}

/// Collection stats from `/v2/collections/{symbol}/stats`.
#[derive(Clone, Debug)]
pub struct MagicEdenCollections {
    http: reqwest::Client,
    base: String,
}

impl MagicEdenCollections {
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into(),
        }
    }

    fn stats_url(&self, symbol: &CollectionSymbol) -> Result<Url, PriceError> {
        let mut url = Url::parse(&self.base)
            .map_err(|e| PriceError::Unavailable(format!("{SOURCE}: bad base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| PriceError::Unavailable(format!("{SOURCE}: base url cannot have a path")))?
            .pop_if_empty()
            .extend(["v2", "collections", symbol.as_str(), "stats"]);
        Ok(url)
    }
}

#[async_trait]
impl CollectionSource for MagicEdenCollections {
    async fn collection_stats(
        &self,
        symbol: &CollectionSymbol,
    ) -> Result<CollectionStats, PriceError> {
        let resp = self
            .http
            .get(self.stats_url(symbol)?)
            .send()
            .await
            .map_err(|e| request_error(SOURCE, e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceError::RateLimited(SOURCE.to_string()));
        }
        if !status.is_success() {
            return Err(PriceError::NotFound(symbol.to_string()));
        }

        let body: StatsBody = resp
            .json()
            .await
            .map_err(|e| PriceError::Malformed(format!("{SOURCE}: {e}")))?;

        Ok(CollectionStats {
            symbol: symbol.clone(),
            floor_price_lamports: body.floor_price.unwrap_or(0),
            listed_count: body.listed_count.unwrap_or(0),
            volume_all: body.volume_all,
        })
    }
}
