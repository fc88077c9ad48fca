//! HTTP price providers (reqwest).
//!
//! Implements the `ptb-core` price ports over the Binance ticker, CoinGecko
//! simple-price and Magic Eden collection-stats endpoints.

use std::time::Duration;

use reqwest::StatusCode;

use ptb_core::{errors::Error, price::PriceError, Result};

pub mod binance;
pub mod coingecko;
pub mod magiceden;

#[cfg(test)]
mod stub;

pub use binance::BinanceTicker;
pub use coingecko::CoinGeckoSimplePrice;
pub use magiceden::MagicEdenCollections;

/// Shared client for all providers; every request carries `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("ptb/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::External(format!("http client build failed: {e}")))
}

/// Map a non-success status to the price error taxonomy.
pub(crate) fn status_error(source: &str, what: &str, status: StatusCode) -> PriceError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => PriceError::RateLimited(source.to_string()),
        StatusCode::NOT_FOUND => PriceError::NotFound(what.to_string()),
        other => PriceError::Unavailable(format!("{source} returned {other}")),
    }
}

pub(crate) fn request_error(source: &str, e: reqwest::Error) -> PriceError {
    if e.is_timeout() {
        return PriceError::Unavailable(format!("{source} timed out"));
    }
    PriceError::Unavailable(format!("{source} request error: {e}"))
}
